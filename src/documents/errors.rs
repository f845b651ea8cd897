//! # Document Errors
//!
//! Error type for the document store and the HTTP layer on top of it.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use super::validation::ValidationErrors;
use crate::file_storage::StorageError;

/// Result type for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Document errors
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Input failed field validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Syntactically malformed argument (e.g. a token that is not a UUID)
    #[error("{0}")]
    InvalidArgument(String),

    /// Malformed request payload
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request payload exceeds the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Unknown token
    #[error("Document not found")]
    NotFound,

    /// Decision on a document that is already terminal
    #[error("Document already has a final decision")]
    Conflict,

    // ==================
    // Server Errors (5xx)
    // ==================
    /// File storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Record persistence or lock failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocumentError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            DocumentError::Validation(_) => StatusCode::BAD_REQUEST,
            DocumentError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            DocumentError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DocumentError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            DocumentError::NotFound => StatusCode::NOT_FOUND,
            DocumentError::Conflict => StatusCode::CONFLICT,
            DocumentError::Storage(StorageError::ObjectNotFound(_)) => StatusCode::NOT_FOUND,
            DocumentError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DocumentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for a single-field validation error
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        DocumentError::Validation(ValidationErrors::single(field, message))
    }
}

impl From<ValidationErrors> for DocumentError {
    fn from(errors: ValidationErrors) -> Self {
        DocumentError::Validation(errors)
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for DocumentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            // Field errors are returned as `{field: message}`
            DocumentError::Validation(errors) => (status, Json(errors)).into_response(),
            other => {
                let body = ErrorResponse {
                    error: other.to_string(),
                    code: status.as_u16(),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
