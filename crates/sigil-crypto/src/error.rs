//! # KAS Error Types
//!
//! Construction-side failures only. Verification never errors: it returns
//! `false` and logs the reason at `debug`.

use sigil_core::SigilError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KasError {
    /// A required field is missing or malformed.
    #[error("input error: {0}")]
    Input(String),

    /// The public key JWK is not a usable P-256 key.
    #[error("invalid public key: {0}")]
    Key(String),

    /// A base64url or JSON field could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<SigilError> for KasError {
    fn from(err: SigilError) -> Self {
        match err {
            SigilError::Decode(msg) => Self::Decode(msg),
            other => Self::Input(other.to_string()),
        }
    }
}

impl From<KasError> for SigilError {
    fn from(err: KasError) -> Self {
        match err {
            KasError::Input(msg) | KasError::Key(msg) => Self::Input(msg),
            KasError::Decode(msg) => Self::Decode(msg),
        }
    }
}
