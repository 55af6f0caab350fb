//! Error types for Courier
//!
//! Request-path failures map to the JSON envelope the browser client
//! consumes: a flat `error` string, plus `details` for upstream transport
//! failures. Startup failures use `anyhow` and never reach this module.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing 'prompt' in request body")]
    MissingPrompt,

    #[error("Invalid JSON in request body")]
    InvalidJson,

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Transport-level upstream failure (DNS, refused, reset, timeout).
    /// Upstream non-2xx statuses are relayed verbatim and never become
    /// this variant.
    #[error("Upstream call failed: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            AppError::MissingPrompt => (
                StatusCode::BAD_REQUEST,
                "Missing 'prompt' in request body".to_string(),
                None,
            ),
            AppError::InvalidJson => (
                StatusCode::BAD_REQUEST,
                "Invalid JSON in request body".to_string(),
                None,
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Upstream(reason) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Proxy failed".to_string(),
                Some(reason),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                None,
            ),
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
