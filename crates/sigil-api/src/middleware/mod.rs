//! # Middleware
//!
//! - `tracing_layer`: per-request spans via `tower_http::trace`.

pub mod tracing_layer;
