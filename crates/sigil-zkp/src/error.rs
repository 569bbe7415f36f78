//! # ZK Error Types

use std::time::Duration;

use sigil_core::SigilError;
use thiserror::Error;

/// Error from the proof service.
///
/// `Clone` so that a single in-flight proof computation can hand the same
/// outcome to every coalesced caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ZkError {
    /// No usable hash input, or the input is malformed.
    #[error("input error: {0}")]
    Input(String),

    /// Public signal or self-verification mismatch. The proof was discarded.
    #[error("crypto mismatch: {0}")]
    CryptoMismatch(String),

    /// Circuit artifacts are missing or corrupt.
    #[error("artifact error: {0}")]
    Artifact(String),

    /// The prover failed on a well-formed input.
    #[error("prover error: {0}")]
    Prover(String),

    /// Proof generation exceeded its deadline. Any partial result was dropped.
    #[error("proof generation timed out after {0:?}")]
    Timeout(Duration),
}

impl From<SigilError> for ZkError {
    fn from(err: SigilError) -> Self {
        match err {
            SigilError::Artifact(msg) => Self::Artifact(msg),
            SigilError::CryptoMismatch(msg) => Self::CryptoMismatch(msg),
            other => Self::Input(other.to_string()),
        }
    }
}

impl From<ZkError> for SigilError {
    fn from(err: ZkError) -> Self {
        match err {
            ZkError::Input(msg) => Self::Input(msg),
            ZkError::CryptoMismatch(msg) => Self::CryptoMismatch(msg),
            ZkError::Artifact(msg) => Self::Artifact(msg),
            ZkError::Prover(msg) => Self::Artifact(format!("prover failed: {msg}")),
            ZkError::Timeout(d) => Self::Timeout(format!("proof generation after {d:?}")),
        }
    }
}
