//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the unified error type for all API endpoints. It implements
//! `axum::response::IntoResponse` to produce structured JSON error responses
//! with appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use chatgraph_engine::EngineError;
use chatgraph_storage::StorageError;

/// Structured error detail in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_FAILED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API errors with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Session or node not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed request (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A graph edit was rejected (422). The message is shown as-is.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Broken graph or storage failure (500).
    #[error("internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_FAILED"),
            ApiError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Validation(msg)
            | ApiError::InternalError(msg) => msg,
        };
        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        }

        let body = serde_json::json!({
            "success": false,
            "error": ApiErrorDetail {
                code: code.to_string(),
                message,
            },
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::UnknownNode(_) => ApiError::NotFound(err.to_string()),
            EngineError::Validation(msg) => ApiError::Validation(msg),
            EngineError::Integrity(_) => ApiError::InternalError(err.to_string()),
            EngineError::Storage(e) => e.into(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::NodeNotFound(_) => ApiError::NotFound(err.to_string()),
            _ => ApiError::InternalError(err.to_string()),
        }
    }
}
