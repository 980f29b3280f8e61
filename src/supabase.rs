//! Shared HTTP plumbing for a hosted Supabase project

use reqwest::{Client, Method, RequestBuilder, Url};

use crate::config::SupabaseConfig;
use crate::error::{AppError, Result};
use crate::storage::{join_segments, parse_base_url};

/// Authenticated client for the Supabase REST surfaces (storage and PostgREST)
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: Url,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: parse_base_url("supabase.url", &config.url)?,
            service_key: config.service_key.clone(),
        })
    }

    /// Project URL with `segments` appended as percent-encoded path segments
    pub fn url(&self, segments: &[&str]) -> Url {
        join_segments(&self.base_url, segments)
    }

    /// Start a request against [`SupabaseClient::url`] carrying the project credentials
    pub fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client
            .request(method, self.url(segments))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}
