//! In-memory repository

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::repository::{GeneratedImage, ImageRepository, NewImage, UserRecord, UserRepository};

/// Keeps images in insertion order and users keyed by id
#[derive(Default)]
pub struct MemoryRepository {
    images: RwLock<Vec<GeneratedImage>>,
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image_count(&self) -> usize {
        self.images.read().len()
    }

    pub fn user(&self, id: &str) -> Option<UserRecord> {
        self.users.read().get(id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }
}

#[async_trait]
impl ImageRepository for MemoryRepository {
    async fn insert(&self, image: NewImage) -> Result<()> {
        let record = GeneratedImage {
            id: Uuid::new_v4().to_string(),
            user_id: image.user_id,
            image_url: image.image_url,
            prompt: image.prompt,
            created_at: Utc::now(),
        };
        self.images.write().push(record);
        Ok(())
    }

    async fn query(&self, user_id: Option<&str>) -> Result<Vec<GeneratedImage>> {
        // Reverse first so the stable sort puts the later insert first on equal timestamps.
        let mut images: Vec<GeneratedImage> = self
            .images
            .read()
            .iter()
            .rev()
            .filter(|image| user_id.map_or(true, |id| image.user_id == id))
            .cloned()
            .collect();
        images.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(images)
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn upsert_user(&self, user: UserRecord) -> Result<()> {
        self.users.write().insert(user.id.clone(), user);
        Ok(())
    }
}
