//! # Content Digest: SHA-256 Hash Binding
//!
//! Defines `ContentDigest`, the 32-byte SHA-256 value that binds the
//! independently produced byte blobs of a sigil (SVG, capsule, proof bundle,
//! receipt) together.
//!
//! ## Security Invariant
//!
//! Structured values are hashed only through [`sha256_digest()`], which
//! accepts `&CanonicalBytes`. Opaque artifact bytes (SVG text, PNG data,
//! WebAuthn client data) go through [`sha256_bytes()`].
//!
//! Digests travel on the wire as 64-character lowercase hex.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::SigilError;

/// A SHA-256 content digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw 32-byte digest value.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex digest (case-insensitive, surrounding
    /// whitespace ignored).
    pub fn from_hex(s: &str) -> Result<Self, SigilError> {
        let s = s.trim();
        if s.len() != 64 {
            return Err(SigilError::Input(format!(
                "digest hex must be 64 chars, got {}",
                s.len()
            )));
        }
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out)
            .map_err(|e| SigilError::Input(format!("invalid digest hex: {e}")))?;
        Ok(Self(out))
    }
}

impl std::fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentDigest({}...)", &self.to_hex()[..12])
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Compute a SHA-256 digest over canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    sha256_bytes(data.as_bytes())
}

/// Compute a SHA-256 hex string over canonical bytes.
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    sha256_digest(data).to_hex()
}

/// Compute a SHA-256 digest over opaque artifact bytes.
///
/// Use this only for inputs that are not JSON values: SVG text, PNG bytes,
/// WebAuthn `clientDataJSON` (which must be hashed exactly as the
/// authenticator received it).
pub fn sha256_bytes(data: &[u8]) -> ContentDigest {
    let hash = Sha256::digest(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest(bytes)
}
