//! # API Error Types
//!
//! Every failure leaves the service as `{ "error": "<message>" }` with a
//! status chosen by error kind. Internal details (artifact paths, prover
//! failures) are logged and replaced by a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use sigil_core::SigilError;
use sigil_share::ShareError;
use sigil_zkp::ZkError;
use thiserror::Error;
use utoipa::ToSchema;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing input (400).
    #[error("{0}")]
    BadRequest(String),

    /// A size ceiling was crossed (413).
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Well-formed input that failed a cryptographic check (422).
    #[error("{0}")]
    Unprocessable(String),

    /// A deadline passed before the work finished (503).
    #[error("{0}")]
    Unavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match &self {
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<ZkError> for AppError {
    fn from(err: ZkError) -> Self {
        match err {
            ZkError::Input(msg) => Self::BadRequest(msg),
            ZkError::Timeout(_) => Self::Unavailable(err.to_string()),
            // A mismatch here means our own prover misbehaved, not the caller.
            ZkError::CryptoMismatch(_) | ZkError::Artifact(_) | ZkError::Prover(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<ShareError> for AppError {
    fn from(err: ShareError) -> Self {
        match err {
            ShareError::SizeLimit { .. } => Self::PayloadTooLarge(err.to_string()),
            ShareError::Encode(_) => Self::Internal(err.to_string()),
            ShareError::UnknownVersion(_) | ShareError::Decode(_) => {
                Self::BadRequest(err.to_string())
            }
        }
    }
}

impl From<SigilError> for AppError {
    fn from(err: SigilError) -> Self {
        match err {
            SigilError::Input(_) | SigilError::Decode(_) | SigilError::Canonicalization(_) => {
                Self::BadRequest(err.to_string())
            }
            SigilError::SizeLimit { .. } => Self::PayloadTooLarge(err.to_string()),
            SigilError::CryptoMismatch(_) => Self::Unprocessable(err.to_string()),
            SigilError::Timeout(_) => Self::Unavailable(err.to_string()),
            SigilError::Artifact(_) => Self::Internal(err.to_string()),
        }
    }
}
