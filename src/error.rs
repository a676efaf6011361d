/// Unified error types for filevault
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum VaultError {
    /// Missing file, too many files, rejected extension, malformed field
    #[error("{0}")]
    InvalidInput(String),

    /// Name (or email) collision, from the pre-check or the unique constraint
    #[error("{0}")]
    DuplicateName(String),

    /// Record absent or inactive, or archive missing on disk
    #[error("{0}")]
    NotFound(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization errors
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Disk I/O failure while archiving or cleaning up
    #[error("Storage error: {0}")]
    StorageFault(String),

    /// Store-level failure not classified as a duplicate
    #[error("Database error: {0}")]
    PersistenceFault(#[from] sqlx::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultError {
    /// Stable error code carried in the response body
    pub fn code(&self) -> &'static str {
        match self {
            VaultError::InvalidInput(_) => "BadRequest",
            VaultError::DuplicateName(_) => "DuplicateName",
            VaultError::NotFound(_) => "NotFound",
            VaultError::Authentication(_) => "Unauthorized",
            VaultError::Authorization(_) => "Forbidden",
            VaultError::StorageFault(_)
            | VaultError::PersistenceFault(_)
            | VaultError::Internal(_)
            | VaultError::Io(_) => "InternalServerError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            VaultError::InvalidInput(_) | VaultError::DuplicateName(_) => StatusCode::BAD_REQUEST,
            VaultError::NotFound(_) => StatusCode::NOT_FOUND,
            VaultError::Authentication(_) => StatusCode::UNAUTHORIZED,
            VaultError::Authorization(_) => StatusCode::FORBIDDEN,
            VaultError::StorageFault(_)
            | VaultError::PersistenceFault(_)
            | VaultError::Internal(_)
            | VaultError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert VaultError to HTTP response
impl IntoResponse for VaultError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
            "Internal server error".to_string() // Don't leak details
        } else {
            self.to_string()
        };

        let body = Json(ErrorResponse {
            error: self.code().to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for filevault operations
pub type VaultResult<T> = Result<T, VaultError>;
