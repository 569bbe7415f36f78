//! # Request/Response Tracing
//!
//! Every request gets a span carrying method, URI, and (on completion)
//! status and latency. Spans are emitted at `INFO` so they appear under the
//! default `RUST_LOG=info` filter.

use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub type SigilTraceLayer = TraceLayer<SharedClassifier<ServerErrorsAsFailures>>;

/// Build the trace layer for the sigil API.
pub fn layer() -> SigilTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
}
