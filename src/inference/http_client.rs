//! HTTP client for a hosted text-to-image inference endpoint

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::InferenceConfig;
use crate::error::{AppError, Result};
use crate::inference::{data_uri, validate_prompt, ImageGenerator};

/// Inference endpoint that takes `{"inputs": prompt}` and answers with raw image bytes
pub struct HttpInferenceClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

impl HttpInferenceClient {
    /// Create a new inference client from configuration
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ImageGenerator for HttpInferenceClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        validate_prompt(prompt)?;

        debug!(endpoint = %self.endpoint, prompt = %prompt, "Sending inference request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&InferenceRequest { inputs: prompt })
            .send()
            .await
            .map_err(AppError::UpstreamTransport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint = %self.endpoint, status = %status, body = %body, "Inference API error");
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let image = response.bytes().await.map_err(AppError::UpstreamTransport)?;
        if image.is_empty() {
            return Err(AppError::InvalidUpstreamResponse(
                "no image data in inference response".to_string(),
            ));
        }

        debug!(endpoint = %self.endpoint, size = image.len(), "Received image from inference API");

        Ok(data_uri::to_data_uri(&image, data_uri::JPEG_MEDIA_TYPE))
    }
}
