//! Error handling for the identicon service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Digest too short: need {required} bytes, got {actual}")]
    InputTooShort { required: usize, actual: usize },

    #[error("Invalid bitmap geometry: {message}")]
    InvalidGeometry { message: String },

    #[error("Image encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn input_too_short(required: usize, actual: usize) -> Self {
        Self::InputTooShort { required, actual }
    }

    pub fn invalid_geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InputTooShort { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidGeometry { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Redis(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Cache { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InputTooShort { .. } => "INPUT_TOO_SHORT",
            AppError::InvalidGeometry { .. } => "INVALID_GEOMETRY",
            AppError::Encode(_) => "ENCODE_ERROR",
            AppError::Redis(_) => "CACHE_ERROR",
            AppError::Cache { .. } => "CACHE_ERROR",
            AppError::Configuration { .. } => "CONFIG_ERROR",
            AppError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = ErrorResponse {
            error: self.error_code().to_string(),
            message: self.to_string(),
            code: status.as_u16().to_string(),
            details: None,
        };

        tracing::error!("API Error: {} - {}", self.error_code(), self);

        (status, Json(error_response)).into_response()
    }
}
