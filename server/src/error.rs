//! Central error type + axum integration.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application error taxonomy, mapped to HTTP responses at the transport
/// boundary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("room not found")]
    RoomNotFound,

    #[error("room is full")]
    RoomFull,

    /// A transactional room write kept conflicting after its retry budget.
    /// Transient: the client may retry (e.g. on the next heartbeat tick).
    #[error("room write conflict after {0} attempts")]
    Conflict(u32),

    #[error("storage error: {0}")]
    Store(#[from] sqlx::Error),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::RoomNotFound => StatusCode::NOT_FOUND,
            AppError::RoomFull => StatusCode::CONFLICT,
            AppError::Conflict(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the machine-readable error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION",
            AppError::RoomNotFound => "ROOM_NOT_FOUND",
            AppError::RoomFull => "ROOM_FULL",
            AppError::Conflict(_) => "WRITE_CONFLICT",
            AppError::Store(_) => "STORE_ERROR",
        }
    }

    /// Whether the client may safely retry the same request.
    pub fn retryable(&self) -> bool {
        matches!(self, AppError::Conflict(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Storage failures are logged server-side and surfaced generically.
        let message = match &self {
            AppError::Store(e) => {
                tracing::error!(error = %e, "storage error");
                "internal storage error".to_string()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": message,
                "retryable": self.retryable(),
            }
        });

        (status, Json(body)).into_response()
    }
}
