use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to fetch classes: {0}")]
    Fetch(String),

    #[error("Failed to update class: {0}")]
    Update(String),

    #[error("Failed to show notification: {0}")]
    Notify(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid class: {0}")]
    Validation(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Fetch(msg) | AppError::Update(msg) => {
                error!("class api error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Class API unavailable".to_string())
            }
            AppError::Notify(msg) | AppError::Config(msg) => {
                error!("internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}
