//! # Owner Key Derivation
//!
//! After a transfer the receiver is identified by an owner key derived from
//! their public key, the pulse of the receive ceremony, and the bundle hash
//! they received:
//!
//! ```text
//! ownerKey = base58(SHA256(JCS({ bundleHash, jwk: {crv, kty, x, y}, pulse })))
//! ```
//!
//! Only the identifying JWK members are hashed, so the same key exported
//! with different optional members derives the same owner key.

use serde_json::json;
use sigil_core::{sha256_digest, CanonicalBytes, ContentDigest, Pulse};

use crate::error::KasError;
use crate::jwk::PublicKeyJwk;

pub fn derive_owner_key(
    jwk: &PublicKeyJwk,
    pulse: Pulse,
    bundle_hash: &ContentDigest,
) -> Result<String, KasError> {
    let body = json!({
        "bundleHash": bundle_hash.to_hex(),
        "jwk": jwk.normalized(),
        "pulse": pulse,
    });
    let canonical = CanonicalBytes::new(&body)
        .map_err(|e| KasError::Input(format!("owner key canonicalization: {e}")))?;
    Ok(bs58::encode(sha256_digest(&canonical).as_bytes()).into_string())
}
