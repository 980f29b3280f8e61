//! Repository module - image metadata and mirrored user records

pub mod memory;
pub mod postgrest;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

use crate::config::{DatabaseBackend, Settings};
use crate::error::{AppError, Result};
use crate::supabase::SupabaseClient;

pub use memory::MemoryRepository;
pub use postgrest::PostgrestRepository;

/// A stored generation: who asked for what, and where the image lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub user_id: String,
    pub image_url: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; id and creation time are assigned by the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewImage {
    pub user_id: String,
    pub image_url: String,
    pub prompt: String,
}

/// Local mirror of an identity-provider user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub last_sign_in: DateTime<Utc>,
}

/// Tables may use either uuid or bigint keys.
fn id_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

/// Generated image metadata
#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn insert(&self, image: NewImage) -> Result<()>;

    /// Newest first; restricted to `user_id` when given. An empty result always means
    /// "no records": backend failures are errors.
    async fn query(&self, user_id: Option<&str>) -> Result<Vec<GeneratedImage>>;
}

/// Mirrored identity-provider users
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert or replace the record with the same id
    async fn upsert_user(&self, user: UserRecord) -> Result<()>;
}

/// Image and user repositories selected by `database.backend`
pub struct Repositories {
    pub images: Arc<dyn ImageRepository>,
    pub users: Arc<dyn UserRepository>,
}

pub fn build_repositories(
    settings: &Settings,
    supabase: Option<&SupabaseClient>,
) -> Result<Repositories> {
    match settings.database.backend {
        DatabaseBackend::Postgrest => {
            let client = supabase.ok_or_else(|| {
                AppError::Internal("postgrest database selected without a client".to_string())
            })?;
            let repository = Arc::new(PostgrestRepository::new(
                client.clone(),
                &settings.database.images_table,
                &settings.database.users_table,
            ));
            Ok(Repositories {
                images: repository.clone(),
                users: repository,
            })
        }
        DatabaseBackend::Memory => {
            let repository = Arc::new(MemoryRepository::new());
            Ok(Repositories {
                images: repository.clone(),
                users: repository,
            })
        }
    }
}
