//! Inference module - the outbound text-to-image client

pub mod data_uri;
pub mod http_client;

use async_trait::async_trait;

use crate::error::{AppError, Result};

pub use http_client::HttpInferenceClient;

/// Turns a prompt into an image
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image and return it as a `data:image/jpeg;base64,...` URI
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Reject prompts that are empty or only whitespace
pub fn validate_prompt(prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt must not be empty".to_string()));
    }
    Ok(())
}
