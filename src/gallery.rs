//! Gallery reader - read path over the image repository

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::identity::Identity;
use crate::repository::{GeneratedImage, ImageRepository};

/// Whose images to show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryScope {
    #[default]
    #[serde(rename = "all", alias = "everyone")]
    Everyone,
    Mine,
}

#[derive(Clone)]
pub struct GalleryReader {
    images: Arc<dyn ImageRepository>,
}

impl GalleryReader {
    pub fn new(images: Arc<dyn ImageRepository>) -> Self {
        Self { images }
    }

    /// Full gallery for the scope, newest first. `Mine` requires a signed-in viewer.
    pub async fn list(
        &self,
        scope: GalleryScope,
        viewer: Option<&Identity>,
    ) -> Result<Vec<GeneratedImage>> {
        match scope {
            GalleryScope::Everyone => self.images.query(None).await,
            GalleryScope::Mine => {
                let viewer = viewer.ok_or_else(|| {
                    AppError::Unauthenticated("sign in to see your images".to_string())
                })?;
                self.images.query(Some(&viewer.user_id)).await
            }
        }
    }
}
