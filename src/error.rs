//! Common error types for the prompt gallery service

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::workflow::WorkflowStage;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The inference endpoint answered with a non-success status
    #[error("Inference API returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The inference endpoint answered 2xx with something that is not an image
    #[error("Invalid inference response: {0}")]
    InvalidUpstreamResponse(String),

    /// The inference endpoint could not be reached
    #[error("Inference request failed: {0}")]
    UpstreamTransport(#[source] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Image generation failed while {stage}: {source}")]
    GenerationFailed {
        stage: WorkflowStage,
        #[source]
        source: Box<AppError>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error. Anything that is not the caller's fault is a 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::GenerationFailed { source, .. } => source.status_code(),
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Upstream { .. }
            | AppError::InvalidUpstreamResponse(_)
            | AppError::UpstreamTransport(_)
            | AppError::Storage(_)
            | AppError::Persistence(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stage of the generation workflow this error was raised in, if any
    pub fn stage(&self) -> Option<WorkflowStage> {
        match self {
            AppError::GenerationFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Error body returned by every endpoint
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<WorkflowStage>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
            stage: self.stage(),
        });

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
