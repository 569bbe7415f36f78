//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error taxonomy shared by the Sigil stack. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - `Input` errors are local and user-correctable (400-level).
//! - `CryptoMismatch` errors are always fail-closed; nothing that produced
//!   one is ever partially trusted.
//! - `Artifact` errors mean circuit files are missing or corrupt. They are
//!   fatal for the operation and surfaced to an operator, never retried.
//! - `SizeLimit` errors are raised before any expensive decompression or
//!   parsing happens.
//! - A cache miss is `None`, not an error.

use thiserror::Error;

/// Top-level error type for the Sigil stack.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SigilError {
    /// Missing or malformed input field.
    #[error("input error: {0}")]
    Input(String),

    /// Hash, signature, or public-input mismatch.
    #[error("crypto mismatch: {0}")]
    CryptoMismatch(String),

    /// Missing or corrupt circuit artifact.
    #[error("artifact error: {0}")]
    Artifact(String),

    /// Payload exceeds a configured byte ceiling.
    #[error("size limit exceeded: {what} is {actual} bytes, limit {limit}")]
    SizeLimit {
        /// Which quantity overflowed (e.g. "compressed payload").
        what: &'static str,
        /// Observed size (a lower bound when aborted mid-stream).
        actual: usize,
        /// Configured ceiling.
        limit: usize,
    },

    /// Wire payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    /// An operation exceeded its deadline or was cancelled.
    #[error("timed out: {0}")]
    Timeout(String),
}

impl From<CanonicalizationError> for SigilError {
    fn from(err: CanonicalizationError) -> Self {
        Self::Canonicalization(err.to_string())
    }
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
