//! # Share Codec Errors

use sigil_core::SigilError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    /// The payload carries a version prefix this codec does not know.
    #[error("unknown share payload version {0:?}")]
    UnknownVersion(String),

    /// A ceiling was crossed. For inflation `actual` is a lower bound: the
    /// stream is abandoned as soon as it passes the limit.
    #[error("{what} exceeds {limit} bytes (at least {actual})")]
    SizeLimit {
        what: &'static str,
        actual: usize,
        limit: usize,
    },

    /// base64url, DEFLATE, UTF-8 or JSON decoding failed.
    #[error("malformed share payload: {0}")]
    Decode(String),

    /// The value could not be canonicalized for encoding.
    #[error("cannot encode share payload: {0}")]
    Encode(String),
}

impl From<ShareError> for SigilError {
    fn from(err: ShareError) -> Self {
        match err {
            ShareError::SizeLimit {
                what,
                actual,
                limit,
            } => Self::SizeLimit {
                what,
                actual,
                limit,
            },
            ShareError::Encode(msg) => Self::Canonicalization(msg),
            other => Self::Decode(other.to_string()),
        }
    }
}
