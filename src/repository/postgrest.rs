//! Supabase PostgREST repository

use async_trait::async_trait;
use reqwest::{Method, Response};
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::repository::{GeneratedImage, ImageRepository, NewImage, UserRecord, UserRepository};
use crate::supabase::SupabaseClient;

/// Talks to the `generated_images` and `users` tables through PostgREST
pub struct PostgrestRepository {
    client: SupabaseClient,
    images_table: String,
    users_table: String,
}

impl PostgrestRepository {
    pub fn new(client: SupabaseClient, images_table: &str, users_table: &str) -> Self {
        Self {
            client,
            images_table: images_table.to_string(),
            users_table: users_table.to_string(),
        }
    }
}

async fn ensure_success(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(action = %action, status = %status, body = %body, "PostgREST request rejected");
    Err(AppError::Persistence(format!(
        "{} failed with status {}: {}",
        action, status, body
    )))
}

#[async_trait]
impl ImageRepository for PostgrestRepository {
    async fn insert(&self, image: NewImage) -> Result<()> {
        let response = self
            .client
            .request(Method::POST, &["rest", "v1", self.images_table.as_str()])
            .header("Prefer", "return=minimal")
            .json(&[&image])
            .send()
            .await
            .map_err(|e| AppError::Persistence(format!("insert image failed: {}", e)))?;

        ensure_success(response, "insert image").await?;
        debug!(user_id = %image.user_id, "Stored image metadata");
        Ok(())
    }

    async fn query(&self, user_id: Option<&str>) -> Result<Vec<GeneratedImage>> {
        let mut params = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if let Some(id) = user_id {
            params.push(("user_id", format!("eq.{}", id)));
        }

        let response = self
            .client
            .request(Method::GET, &["rest", "v1", self.images_table.as_str()])
            .query(&params)
            .send()
            .await
            .map_err(|e| AppError::Persistence(format!("query images failed: {}", e)))?;

        let images = ensure_success(response, "query images")
            .await?
            .json::<Vec<GeneratedImage>>()
            .await
            .map_err(|e| AppError::Persistence(format!("invalid image rows: {}", e)))?;

        debug!(count = images.len(), filtered = user_id.is_some(), "Fetched images");
        Ok(images)
    }
}

#[async_trait]
impl UserRepository for PostgrestRepository {
    async fn upsert_user(&self, user: UserRecord) -> Result<()> {
        let response = self
            .client
            .request(Method::POST, &["rest", "v1", self.users_table.as_str()])
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[&user])
            .send()
            .await
            .map_err(|e| AppError::Persistence(format!("upsert user failed: {}", e)))?;

        ensure_success(response, "upsert user").await?;
        debug!(user_id = %user.id, "Upserted user");
        Ok(())
    }
}
