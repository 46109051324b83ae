use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found")]
    NotFound,

    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("Preferences already submitted")]
    AlreadySubmitted,

    #[error("Approval blocked: {}", .0.join("; "))]
    ApprovalBlocked(Vec<String>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string(), Vec::new()),
            AppError::ValidationFailed(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation failed".to_string(),
                errors,
            ),
            AppError::AlreadySubmitted => (
                StatusCode::CONFLICT,
                "Preferences already submitted. Editing not allowed.".to_string(),
                Vec::new(),
            ),
            AppError::ApprovalBlocked(errors) => (
                StatusCode::CONFLICT,
                "Approval blocked".to_string(),
                errors,
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, Vec::new()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, Vec::new()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Missing or invalid identity".to_string(),
                Vec::new(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Not allowed for this role".to_string(),
                Vec::new(),
            ),
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    Vec::new(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}
