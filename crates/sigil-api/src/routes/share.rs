//! # Share Decoding
//!
//! - `POST /api/share/decode`: decode a share URL or a bare share payload.
//!
//! Both the compressed (`c1:`) and legacy base64url forms are accepted.
//! When the decoded value is a proof bundle, its hash chain is recomputed
//! and a mismatch is refused. Other payloads (receipts, legacy records) are
//! returned as decoded.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sigil_bundle::{is_proof_bundle, verify_proof_bundle};
use sigil_share::ShareFormat;
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Exactly one of `url` or `payload`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ShareDecodeRequest {
    /// A share link carrying `?p=` (or a legacy `?r=` / `?receipt=`).
    pub url: Option<String>,
    /// A bare share payload.
    pub payload: Option<String>,
}

impl Validate for ShareDecodeRequest {
    fn validate(&self) -> Result<(), String> {
        match (&self.url, &self.payload) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err("provide exactly one of url or payload".into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareDecodeResponse {
    /// `compressed` or `legacy`.
    pub format: String,
    #[schema(value_type = Object)]
    pub bundle: serde_json::Value,
    /// Recomputed bundle hash, present when the payload is a proof bundle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_hash: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new().route("/api/share/decode", post(decode_share))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/share/decode: Decode a share link or payload.
#[utoipa::path(
    post,
    path = "/api/share/decode",
    request_body = ShareDecodeRequest,
    responses(
        (status = 200, description = "Payload decoded", body = ShareDecodeResponse),
        (status = 400, description = "Malformed payload or unknown version", body = ErrorBody),
        (status = 413, description = "Payload exceeds a size ceiling", body = ErrorBody),
        (status = 422, description = "Proof bundle hash chain does not match", body = ErrorBody),
    ),
    tag = "share"
)]
pub async fn decode_share(
    State(state): State<AppState>,
    body: Result<Json<ShareDecodeRequest>, JsonRejection>,
) -> Result<Json<ShareDecodeResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let decoded = match (req.url.as_deref(), req.payload.as_deref()) {
        (Some(url), _) => state.share.decode_url(url)?,
        (None, Some(payload)) => state.share.decode(payload)?,
        (None, None) => return Err(AppError::BadRequest("nothing to decode".into())),
    };

    let bundle_hash = if is_proof_bundle(&decoded.bundle) {
        Some(verify_proof_bundle(&decoded.bundle, None)?.to_hex())
    } else {
        None
    };

    let format = match decoded.format {
        ShareFormat::Compressed => "compressed",
        ShareFormat::Legacy => "legacy",
    };
    Ok(Json(ShareDecodeResponse {
        format: format.to_string(),
        bundle: decoded.bundle,
        bundle_hash,
    }))
}
