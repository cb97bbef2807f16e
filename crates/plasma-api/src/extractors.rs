//! # Request Extraction Helpers
//!
//! Map body and path parsing failures onto [`AppError`] so every rejection
//! carries an application code.

use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Parse a body that may be absent. An empty body yields `T::default()`.
pub fn extract_optional_json<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Parse a raw path segment, reporting `key` on failure.
pub fn parse_path<T: FromStr>(raw: &str, key: &'static str) -> Result<T, AppError> {
    raw.trim().parse().map_err(|_| AppError::PathParam(key))
}

/// Require a body field.
pub fn required<T>(value: Option<T>, key: &'static str) -> Result<T, AppError> {
    value.ok_or(AppError::MissingBodyParam(key))
}
