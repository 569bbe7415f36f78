//! # KAS Challenges
//!
//! The challenge is the only thing that ties a WebAuthn signature to a
//! bundle, so signer and verifier must build it from the same inputs the
//! same way:
//!
//! ```text
//! author   challenge = bytes(bundleHash)                       (32 bytes)
//! receive  challenge = SHA256(JCS({ bundleHash, nonce,
//!                                   scope: "receive", v: "KAS-1" }))
//! ```
//!
//! The receive form folds in a nonce issued for the transfer, so a receive
//! signature for one transfer cannot be replayed for another transfer of
//! the same bundle.

use serde::{Deserialize, Serialize};
use serde_json::json;
use sigil_core::{sha256_digest, CanonicalBytes, ContentDigest};

use crate::error::KasError;

/// Version tag of the attestation scheme.
pub const KAS_VERSION: &str = "KAS-1";

/// What a signature attests to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The minter signs the bundle it created.
    Author,
    /// A receiver acknowledges a transfer.
    Receive,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Receive => "receive",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the challenge bytes for `(scope, bundleHash[, nonce])`.
pub fn build_challenge(
    scope: Scope,
    bundle_hash: &ContentDigest,
    nonce: Option<&str>,
) -> Result<Vec<u8>, KasError> {
    match scope {
        Scope::Author => Ok(bundle_hash.as_bytes().to_vec()),
        Scope::Receive => {
            let nonce = nonce
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| KasError::Input("receive challenge requires a nonce".into()))?;
            let body = json!({
                "bundleHash": bundle_hash.to_hex(),
                "nonce": nonce,
                "scope": Scope::Receive.as_str(),
                "v": KAS_VERSION,
            });
            let canonical = CanonicalBytes::new(&body)
                .map_err(|e| KasError::Input(format!("challenge canonicalization: {e}")))?;
            Ok(sha256_digest(&canonical).as_bytes().to_vec())
        }
    }
}
