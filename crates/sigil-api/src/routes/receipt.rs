//! # Verification Receipts
//!
//! - `POST /api/receipt/verify`: verify a bundle's Groth16 proof and return
//!   a hash-bound receipt.
//!
//! Outcomes are cached under `(bundleHash, zkPoseidonHash,
//! verificationVersion)`. A cache hit returns the receipt issued by the
//! first successful verification; it is not re-stamped with the new
//! request's pulse. Failed verifications are never cached, and concurrent
//! misses only share a verification when they submitted the same proof.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sigil_core::{sha256_digest, CanonicalBytes, ContentDigest, Pulse, SigilError};
use sigil_receipt::{assert_receipt_hash_match, CacheKeyParts, CacheStatus, VerificationReceipt};
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptVerifyRequest {
    /// Hex SHA-256 of the canonical proof bundle.
    pub bundle_hash: String,
    pub zk_poseidon_hash: String,
    #[schema(value_type = Object)]
    pub zk_proof: serde_json::Value,
    pub zk_public_inputs: Vec<String>,
    /// Pulse recorded in a freshly issued receipt.
    pub verified_at_pulse: u64,
    pub valuation_hash: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub valuation: Option<serde_json::Value>,
    /// When present, the returned receipt must hash to this value.
    pub expected_receipt_hash: Option<String>,
}

impl Validate for ReceiptVerifyRequest {
    fn validate(&self) -> Result<(), String> {
        if self.zk_poseidon_hash.trim().is_empty() {
            return Err("zkPoseidonHash is required".into());
        }
        if self.zk_public_inputs.is_empty() {
            return Err("zkPublicInputs must not be empty".into());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptVerifyResponse {
    #[schema(value_type = Object)]
    pub receipt: serde_json::Value,
    pub receipt_hash: String,
    pub cache_key: String,
    /// `hit` or `miss`.
    pub cache: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new().route("/api/receipt/verify", post(verify_receipt))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/receipt/verify: Verify a proof and issue a receipt.
#[utoipa::path(
    post,
    path = "/api/receipt/verify",
    request_body = ReceiptVerifyRequest,
    responses(
        (status = 200, description = "Proof verified; receipt issued or served from cache", body = ReceiptVerifyResponse),
        (status = 400, description = "Malformed request", body = ErrorBody),
        (status = 422, description = "Proof rejected or receipt hash mismatch", body = ErrorBody),
        (status = 500, description = "Proof artifacts unavailable", body = ErrorBody),
    ),
    tag = "receipt"
)]
pub async fn verify_receipt(
    State(state): State<AppState>,
    body: Result<Json<ReceiptVerifyRequest>, JsonRejection>,
) -> Result<Json<ReceiptVerifyResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let bundle_hash = ContentDigest::from_hex(&req.bundle_hash)?;
    let zk = state.zk()?.clone();
    let parts = CacheKeyParts::new(
        bundle_hash,
        req.zk_poseidon_hash.trim(),
        zk.verification_version(),
    );

    let submission = CanonicalBytes::new(&serde_json::json!({
        "zkProof": &req.zk_proof,
        "zkPublicInputs": &req.zk_public_inputs,
    }))
    .map(|bytes| sha256_digest(&bytes))
    .map_err(SigilError::from)?;

    let verifier = state.config.verifier.clone();
    let ReceiptVerifyRequest {
        zk_poseidon_hash,
        zk_proof,
        zk_public_inputs,
        verified_at_pulse,
        valuation_hash,
        valuation,
        expected_receipt_hash,
        ..
    } = req;
    let commitment = parts.zk_poseidon_hash.clone();
    let version = parts.verification_version.clone();

    let (entry, status) = state
        .cache
        .get_or_verify(&parts, &submission, || async move {
            let check = {
                let zk = zk.clone();
                let commitment = commitment.clone();
                tokio::task::spawn_blocking(move || {
                    zk.verify_commitment(&commitment, &zk_proof, &zk_public_inputs)
                })
            };
            let verified = check
                .await
                .map_err(|e| SigilError::Artifact(format!("verifier task failed: {e}")))?;
            if !verified {
                tracing::info!(bundle_hash = %bundle_hash.to_hex(), %zk_poseidon_hash, "proof rejected");
                return Err(SigilError::CryptoMismatch("ZK proof did not verify".into()));
            }
            Ok(VerificationReceipt::new(
                bundle_hash,
                commitment,
                Pulse::new(verified_at_pulse),
                verifier,
                version,
            )
            .with_valuation(valuation_hash, valuation))
        })
        .await?;

    if let Some(expected) = expected_receipt_hash.as_deref() {
        assert_receipt_hash_match(&entry.receipt, expected)?;
    }

    let cache = match status {
        CacheStatus::Hit => "hit",
        CacheStatus::Miss => "miss",
    };
    tracing::info!(cache_key = %entry.cache_key.to_hex(), cache, "receipt issued");
    let receipt = serde_json::to_value(&entry.receipt)
        .map_err(|e| AppError::Internal(format!("receipt serialization: {e}")))?;
    Ok(Json(ReceiptVerifyResponse {
        receipt,
        receipt_hash: entry.receipt_hash.to_hex(),
        cache_key: entry.cache_key.to_hex(),
        cache: cache.to_string(),
    }))
}
