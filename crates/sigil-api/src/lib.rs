//! # sigil-api: HTTP Surface for the Sigil Proof Stack
//!
//! ## API Surface
//!
//! | Route                     | Module                | Purpose                          |
//! |---------------------------|-----------------------|----------------------------------|
//! | `POST /api/proof/sigil`   | [`routes::proof`]     | Groth16 proof for a hash input   |
//! | `POST /api/share/decode`  | [`routes::share`]     | Decode `c1:` / legacy payloads   |
//! | `POST /api/receipt/verify`| [`routes::receipt`]   | Verify a proof, issue a receipt  |
//! | `GET /openapi.json`       | [`openapi`]           | OpenAPI document                 |
//! | `GET /health/*`           | this module           | Liveness and readiness probes    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → CorsLayer → DefaultBodyLimit → Handler
//! ```

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Largest accepted request body. Share payloads are capped well below this
/// by the codec; proof and receipt bodies are a few kilobytes.
pub const MAX_BODY_BYTES: usize = 512 * 1024;

/// Assemble the application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::proof::router())
        .merge(routes::share::router())
        .merge(routes::receipt::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new()
        .merge(health)
        .merge(api)
        .layer(CorsLayer::permissive())
        .layer(middleware::tracing_layer::layer())
        .with_state(state)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 "ready" once proof artifacts are loaded, 503 otherwise.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if state.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "proof artifacts not loaded")
    }
}
