//! # Request Extraction
//!
//! Handlers take `Result<Json<T>, JsonRejection>` so a malformed body becomes
//! our `{ "error": ... }` shape instead of axum's plain-text rejection.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Request rules serde alone cannot express, such as "exactly one of".
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// [`extract_json`] followed by [`Validate::validate`].
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::BadRequest)?;
    Ok(value)
}
