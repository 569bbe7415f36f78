//! # Verification Receipts
//!
//! A receipt records that a bundle's ZK commitment was verified, when, and
//! by which verifier build. Its hash is `SHA256(JCS(receipt))`, so any
//! change to any field, optional ones included, yields a different hash.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sigil_core::{sha256_digest, CanonicalBytes, ContentDigest, Pulse, SigilError};
use subtle::ConstantTimeEq;

/// Error message for a receipt whose hash does not match.
pub const RECEIPT_MISMATCH: &str = "verification receipt mismatch";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReceipt {
    pub bundle_hash: ContentDigest,
    pub zk_poseidon_hash: String,
    pub verified_at_pulse: Pulse,
    pub verifier: String,
    pub verification_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation: Option<Value>,
}

impl VerificationReceipt {
    pub fn new(
        bundle_hash: ContentDigest,
        zk_poseidon_hash: impl Into<String>,
        verified_at_pulse: Pulse,
        verifier: impl Into<String>,
        verification_version: impl Into<String>,
    ) -> Self {
        Self {
            bundle_hash,
            zk_poseidon_hash: zk_poseidon_hash.into(),
            verified_at_pulse,
            verifier: verifier.into(),
            verification_version: verification_version.into(),
            valuation_hash: None,
            valuation: None,
        }
    }

    pub fn with_valuation(mut self, valuation_hash: Option<String>, valuation: Option<Value>) -> Self {
        self.valuation_hash = valuation_hash;
        self.valuation = valuation;
        self
    }

    pub fn hash(&self) -> Result<ContentDigest, SigilError> {
        hash_receipt(self)
    }
}

/// `SHA256(JCS(receipt))`.
pub fn hash_receipt(receipt: &VerificationReceipt) -> Result<ContentDigest, SigilError> {
    Ok(sha256_digest(&CanonicalBytes::new(receipt)?))
}

/// Check a receipt against an expected hash in constant time.
///
/// A malformed expected hash counts as a mismatch.
pub fn assert_receipt_hash_match(
    receipt: &VerificationReceipt,
    expected_hex: &str,
) -> Result<(), SigilError> {
    let actual = hash_receipt(receipt)?;
    let matches = ContentDigest::from_hex(expected_hex)
        .map(|expected| bool::from(actual.as_bytes().ct_eq(expected.as_bytes())))
        .unwrap_or(false);
    if !matches {
        tracing::debug!(actual = %actual.to_hex(), "receipt hash mismatch");
        return Err(SigilError::CryptoMismatch(RECEIPT_MISMATCH.into()));
    }
    Ok(())
}
