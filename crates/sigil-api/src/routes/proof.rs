//! # Proof Generation
//!
//! - `POST /api/proof/sigil`: prove knowledge of the commitment for a
//!   payload hash (or a caller-supplied field element).
//!
//! The request names its commitment source in one of three fields, taken in
//! precedence order `payloadHashHex`, `poseidonHash`, `zkPoseidonHash`.
//! Identical concurrent requests share one proving run.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sigil_zkp::{CommitmentInput, ProofHints, ProofResult};
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};
use crate::extractors::extract_json;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest {
    /// 64 hex characters. Mapped into the field by split128 + BLAKE3.
    pub payload_hash_hex: Option<String>,
    /// Decimal field element.
    pub poseidon_hash: Option<String>,
    /// Decimal field element, alias of `poseidonHash`.
    pub zk_poseidon_hash: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProofHintsBody {
    pub scheme: String,
    pub curve: String,
    pub circuit_id: String,
    pub verification_version: String,
    pub public_input_count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProofResponse {
    /// Canonical decimal commitment; equals `zkPublicInputs[0]`.
    pub zk_poseidon_hash: String,
    /// snarkjs-shaped Groth16 proof.
    #[schema(value_type = Object)]
    pub zk_proof: serde_json::Value,
    pub zk_public_inputs: Vec<String>,
    pub proof_hints: ProofHintsBody,
}

impl From<ProofHints> for ProofHintsBody {
    fn from(h: ProofHints) -> Self {
        Self {
            scheme: h.scheme,
            curve: h.curve,
            circuit_id: h.circuit_id,
            verification_version: h.verification_version,
            public_input_count: h.public_input_count,
        }
    }
}

impl From<ProofResult> for ProofResponse {
    fn from(r: ProofResult) -> Self {
        Self {
            zk_poseidon_hash: r.zk_poseidon_hash,
            zk_proof: r.zk_proof,
            zk_public_inputs: r.zk_public_inputs,
            proof_hints: r.proof_hints.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new().route("/api/proof/sigil", post(prove_sigil))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/proof/sigil: Generate a Groth16 proof.
///
/// The proof is checked against the verifying key before it is returned.
#[utoipa::path(
    post,
    path = "/api/proof/sigil",
    request_body = ProofRequest,
    responses(
        (status = 200, description = "Proof generated and self-verified", body = ProofResponse),
        (status = 400, description = "Missing or malformed hash input", body = ErrorBody),
        (status = 500, description = "Proof artifacts unavailable", body = ErrorBody),
        (status = 503, description = "Proof generation timed out", body = ErrorBody),
    ),
    tag = "proof"
)]
pub async fn prove_sigil(
    State(state): State<AppState>,
    body: Result<Json<ProofRequest>, JsonRejection>,
) -> Result<Json<ProofResponse>, AppError> {
    let req = extract_json(body)?;
    let input = CommitmentInput::from_fields(
        req.payload_hash_hex.as_deref(),
        req.poseidon_hash.as_deref(),
        req.zk_poseidon_hash.as_deref(),
    )?;
    let result = state.zk()?.generate(&input).await?;
    tracing::info!(zk_poseidon_hash = %result.zk_poseidon_hash, "proof generated");
    Ok(Json(result.into()))
}
