//! # OpenAPI Document Assembly
//!
//! Collects the utoipa-documented handlers into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sigil API",
        version = "0.1.0",
        description = "Groth16 proof generation, share link decoding, and cached verification receipts for sigil bundles."
    ),
    paths(
        crate::routes::proof::prove_sigil,
        crate::routes::share::decode_share,
        crate::routes::receipt::verify_receipt,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::routes::proof::ProofRequest,
        crate::routes::proof::ProofResponse,
        crate::routes::proof::ProofHintsBody,
        crate::routes::share::ShareDecodeRequest,
        crate::routes::share::ShareDecodeResponse,
        crate::routes::receipt::ReceiptVerifyRequest,
        crate::routes::receipt::ReceiptVerifyResponse,
    )),
    tags(
        (name = "proof", description = "Zero-knowledge proof generation"),
        (name = "share", description = "Share link decoding"),
        (name = "receipt", description = "Proof verification receipts"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
