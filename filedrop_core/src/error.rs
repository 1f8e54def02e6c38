//! Application error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::storage::StorageError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// `size` is the number of bytes received before the upload was cut off.
    #[error("Payload too large: received {size} bytes (max: {max_size} bytes)")]
    PayloadTooLarge { size: u64, max_size: u64 },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::PayloadTooLarge { max_size, .. } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("File exceeds the maximum upload size of {} bytes", max_size),
            ),
            AppError::StorageUnavailable(msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage unavailable".to_string())
            }
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::WebSocket(msg) => {
                tracing::error!("WebSocket error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "WebSocket error".to_string())
            }
            AppError::IoError(err) => {
                tracing::error!("IO error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Other(err) => {
                tracing::error!("Unexpected error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => AppError::NotFound(format!("File not found: {}", name)),
            StorageError::InvalidName(reason) => AppError::BadRequest(reason),
            StorageError::Unavailable(msg) => AppError::StorageUnavailable(msg),
        }
    }
}
