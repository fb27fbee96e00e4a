/// Error types for Board Service
///
/// Errors are converted to HTTP responses with a `{"error", "status"}` body.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::db::StoreError;
use crate::pagination::{CursorError, PaginationError};

/// Result type for board-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid cursor: {0}")]
    InvalidCursor(#[from] CursorError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    Query(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PaginationError> for AppError {
    fn from(err: PaginationError) -> Self {
        match err {
            PaginationError::InvalidCursor(e) => AppError::InvalidCursor(e),
            e @ PaginationError::PageSize { .. } => AppError::Validation(e.to_string()),
            PaginationError::StoreContract(msg) => AppError::Query(StoreError::Contract(msg)),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCursor(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Query(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Store details stay in the logs.
        let error_msg = match self {
            AppError::Query(_) => "Failed to load activity".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(status).json(serde_json::json!({
            "error": error_msg,
            "status": status.as_u16(),
        }))
    }
}
