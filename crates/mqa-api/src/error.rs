//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new("NOT_FOUND", format!("{resource} not found"))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    Database(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::not_found(&msg)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::bad_request(msg)),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::internal_error().with_details(msg),
            ),
            AppError::Database(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("DATABASE_ERROR", "Database operation failed").with_details(msg),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<mqa_core::MqaError> for AppError {
    fn from(err: mqa_core::MqaError) -> Self {
        use mqa_core::MqaError;

        match err {
            MqaError::NotFound(msg) => AppError::NotFound(msg),
            MqaError::Validation(msg) => AppError::BadRequest(msg),
            MqaError::Database(msg) => AppError::Database(msg),
            MqaError::VectorStore(msg) => AppError::Internal(format!("Vector store error: {msg}")),
            MqaError::Embedding(msg) => AppError::Internal(format!("Embedding error: {msg}")),
            MqaError::Llm(msg) => AppError::Internal(format!("LLM error: {msg}")),
            MqaError::Parse(msg) => AppError::BadRequest(format!("Document parsing failed: {msg}")),
            MqaError::Config(msg) => AppError::Internal(format!("Configuration error: {msg}")),
            MqaError::Other(err) => AppError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = AppError::from(mqa_core::MqaError::Validation("bad input".to_string()));
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_not_found_maps_through() {
        let err = AppError::from(mqa_core::MqaError::NotFound("document".to_string()));
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
