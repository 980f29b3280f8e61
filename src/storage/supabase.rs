//! Supabase Storage adapter

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Method};
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::storage::{ObjectKey, ObjectStore};
use crate::supabase::SupabaseClient;

/// Uploads into a Supabase Storage bucket with public read access
pub struct SupabaseStorage {
    client: SupabaseClient,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(client: SupabaseClient, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn upload(&self, key: &ObjectKey, data: Vec<u8>, content_type: &str) -> Result<()> {
        let path = key.path();
        let size = data.len();

        let response = self
            .client
            .request(
                Method::POST,
                &[
                    "storage",
                    "v1",
                    "object",
                    self.bucket.as_str(),
                    key.namespace(),
                    key.filename(),
                ],
            )
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("upload of {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                bucket = %self.bucket,
                path = %path,
                status = %status,
                "Storage upload rejected"
            );
            return Err(AppError::Storage(format!(
                "upload of {} failed with status {}: {}",
                path, status, body
            )));
        }

        debug!(bucket = %self.bucket, path = %path, size, "Uploaded object");
        Ok(())
    }

    fn public_url(&self, key: &ObjectKey) -> String {
        self.client
            .url(&[
                "storage",
                "v1",
                "object",
                "public",
                self.bucket.as_str(),
                key.namespace(),
                key.filename(),
            ])
            .into()
    }
}
