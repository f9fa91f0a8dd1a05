use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use ledger::LedgerError;
use thiserror::Error;

use crate::schemas::ErrorResponse;

/// An error as returned to HTTP clients.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
            }
            LedgerError::ConstraintViolation { .. } => {
                Self::new(StatusCode::CONFLICT, "DUPLICATE_PAYMENT", err.to_string())
            }
            LedgerError::Validation(message) => Self::validation(message.clone()),
            LedgerError::Storage(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                "Failed to access stored file",
            ),
            LedgerError::Render(_) => Self::new(
                StatusCode::BAD_GATEWAY,
                "RENDER_ERROR",
                "Failed to render document",
            ),
            LedgerError::Database(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Database error",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
                code: self.code.to_string(),
                success: false,
            }),
        )
            .into_response()
    }
}
