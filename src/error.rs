/// Unified error types for the floralog backend
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum AppError {
    /// Database errors (retryable infrastructure failure)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No token record exists for the presented value
    #[error("Token not found")]
    TokenNotFound,

    /// A token record existed but its lifetime had elapsed
    #[error("Token expired")]
    TokenExpired,

    /// A token record exists for the value but under a different purpose
    #[error("Token purpose mismatch")]
    TokenPurposeMismatch,

    /// Token value collided with a live record on insert (internal, retried)
    #[error("Duplicate token value")]
    DuplicateToken,

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., duplicate account)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            // The three consumption failures share one public response.
            // Distinguishing them would let a caller probe which token
            // values exist in the store.
            AppError::TokenNotFound
            | AppError::TokenExpired
            | AppError::TokenPurposeMismatch => (
                StatusCode::BAD_REQUEST,
                "InvalidToken",
                "Invalid or expired link".to_string(),
            ),
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            AppError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NotFound",
                self.to_string(),
            ),
            AppError::Conflict(_) => (
                StatusCode::CONFLICT,
                "Conflict",
                self.to_string(),
            ),
            AppError::Database(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "ServiceUnavailable",
                "Storage temporarily unavailable, retry later".to_string(),
            ),
            AppError::DuplicateToken | AppError::Internal(_) | AppError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type AppResult<T> = Result<T, AppError>;
