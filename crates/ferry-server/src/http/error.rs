//! HTTP error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::storage::StorageError;

/// JSON error body: `{"error": "...", "code": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable code.
    pub code: String,
}

/// Errors surfaced by the HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Requested entity does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The request was malformed.
    #[error("{0}")]
    BadRequest(String),
    /// Upload had a disallowed extension.
    #[error("file type not allowed: {0}")]
    FileTypeNotAllowed(String),
    /// Submitted file name was unusable.
    #[error("invalid file name")]
    InvalidFilename,
    /// Anything unexpected; detail is logged, not leaked.
    #[error("internal error")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::FileTypeNotAllowed(_) => (StatusCode::BAD_REQUEST, "FILE_TYPE_NOT_ALLOWED"),
            Self::InvalidFilename => (StatusCode::BAD_REQUEST, "INVALID_FILENAME"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if let Self::Internal(source) = &self {
            tracing::error!(error = %source, "internal error");
        }
        let body = ErrorBody {
            error: self.to_string(),
            code: code.to_owned(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => Self::NotFound(format!("file not found: {name}")),
            StorageError::InvalidName(_) => Self::InvalidFilename,
            StorageError::ExtensionNotAllowed(name) => Self::FileTypeNotAllowed(name),
            StorageError::Io(e) => Self::Internal(Box::new(e)),
        }
    }
}
