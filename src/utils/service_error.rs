// Service error type shared by every handler
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Fixed body for every failed token check
pub const FORBIDDEN_BODY: &str = "Forbidden: Invalid Admin Token.";

/// Fixed body for unknown routes
pub const NOT_FOUND_BODY: &str = "Not Found";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid admin token")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Render error: {0}")]
    RenderError(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ServiceError::Forbidden => (StatusCode::FORBIDDEN, FORBIDDEN_BODY),
            ServiceError::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND_BODY),
            ServiceError::StoreError(msg) | ServiceError::RenderError(msg) => {
                error!("Request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            },
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

// Conversion from various error types
impl From<redis::RedisError> for ServiceError {
    fn from(error: redis::RedisError) -> Self {
        ServiceError::StoreError(error.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(error: serde_json::Error) -> Self {
        ServiceError::StoreError(format!("serialization failed: {}", error))
    }
}

impl From<handlebars::RenderError> for ServiceError {
    fn from(error: handlebars::RenderError) -> Self {
        ServiceError::RenderError(error.to_string())
    }
}
