//! Error types for eventdesk-daemon

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use eventdesk_gate::GateError;
use eventdesk_types::{EventId, ValidationError};
use serde::Serialize;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Outbound client setup error
    #[error("Gate setup error: {0}")]
    Gate(#[from] GateError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage-specific errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query error
    #[error("Query error: {0}")]
    Query(String),

    /// Stored row could not be decoded
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Query(err.to_string())
    }
}

/// Event lifecycle errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Event {0} not found")]
    NotFound(EventId),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Malformed request
    #[error("{0}")]
    BadRequest(String),

    /// Payload failed shape validation
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Ads gate refused or could not decide
    #[error("{0}")]
    Gate(#[from] GateError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) => ApiError::NotFound(err.to_string()),
            ServiceError::Gate(gate) => ApiError::Gate(gate),
            ServiceError::Storage(storage) => ApiError::Storage(storage),
        }
    }
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Gate(gate) => (
                StatusCode::from_u16(gate.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                gate.code(),
            ),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(code, error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for lifecycle operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
