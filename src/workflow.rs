//! Generation workflow - prompt to inference to storage to metadata
//!
//! A run moves linearly through [`WorkflowStage`]s. The first failure ends the run and is
//! reported with the stage it happened in. Nothing is compensated: an object uploaded
//! before a failed metadata write stays in the store.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, Result};
use crate::gallery::{GalleryReader, GalleryScope};
use crate::identity::Identity;
use crate::inference::{data_uri, validate_prompt, ImageGenerator};
use crate::repository::{GeneratedImage, ImageRepository, NewImage};
use crate::storage::{ObjectKey, ObjectStore};

/// States of a single generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStage {
    Idle,
    Requesting,
    Decoding,
    Uploading,
    Recording,
    Done,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStage::Idle => "idle",
            WorkflowStage::Requesting => "requesting",
            WorkflowStage::Decoding => "decoding",
            WorkflowStage::Uploading => "uploading",
            WorkflowStage::Recording => "recording",
            WorkflowStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Where a persisted image ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub path: String,
    pub public_url: String,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// The generated image as a `data:image/jpeg;base64,...` URI
    pub image_data_uri: String,
    /// `None` for anonymous callers
    pub stored: Option<StoredImage>,
    /// The caller's refreshed gallery; `None` when anonymous or when the refresh failed
    pub gallery: Option<Vec<GeneratedImage>>,
}

/// Sequences inference, upload and metadata write for one prompt
pub struct GenerationWorkflow {
    generator: Arc<dyn ImageGenerator>,
    store: Arc<dyn ObjectStore>,
    images: Arc<dyn ImageRepository>,
    gallery: GalleryReader,
}

fn failed(stage: WorkflowStage, source: AppError) -> AppError {
    AppError::GenerationFailed {
        stage,
        source: Box::new(source),
    }
}

impl GenerationWorkflow {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        store: Arc<dyn ObjectStore>,
        images: Arc<dyn ImageRepository>,
    ) -> Self {
        let gallery = GalleryReader::new(images.clone());
        Self {
            generator,
            store,
            images,
            gallery,
        }
    }

    /// Run the workflow. Anonymous callers get the image back without it being stored.
    pub async fn run(
        &self,
        prompt: &str,
        identity: Option<&Identity>,
    ) -> Result<GenerationOutcome> {
        validate_prompt(prompt)?;

        debug!(stage = %WorkflowStage::Requesting, prompt = %prompt, "Requesting image");
        let image_data_uri = self
            .generator
            .generate(prompt)
            .await
            .map_err(|e| failed(WorkflowStage::Requesting, e))?;

        let Some(identity) = identity else {
            info!("Generated image for anonymous caller, not persisting");
            return Ok(GenerationOutcome {
                image_data_uri,
                stored: None,
                gallery: None,
            });
        };
        let user_id = identity.user_id.as_str();

        debug!(stage = %WorkflowStage::Decoding, user_id = %user_id, "Decoding image");
        // A generator that hands back undecodable data is at fault, not the caller.
        let bytes = data_uri::decode(&image_data_uri).map_err(|e| {
            failed(
                WorkflowStage::Decoding,
                AppError::InvalidUpstreamResponse(e.to_string()),
            )
        })?;
        let content_type = data_uri::media_type(&image_data_uri)
            .unwrap_or(data_uri::JPEG_MEDIA_TYPE)
            .to_string();

        let key = ObjectKey::for_generated_image(user_id)
            .map_err(|e| failed(WorkflowStage::Uploading, e))?;
        let path = key.path();
        debug!(
            stage = %WorkflowStage::Uploading,
            user_id = %user_id,
            path = %path,
            "Uploading image"
        );
        if let Err(e) = self.store.upload(&key, bytes, &content_type).await {
            error!(
                user_id = %user_id,
                path = %path,
                error = %e,
                "Image generated but not persisted"
            );
            return Err(failed(WorkflowStage::Uploading, e));
        }
        let public_url = self.store.public_url(&key);

        debug!(stage = %WorkflowStage::Recording, user_id = %user_id, "Recording metadata");
        let record = NewImage {
            user_id: user_id.to_string(),
            image_url: public_url.clone(),
            prompt: prompt.to_string(),
        };
        if let Err(e) = self.images.insert(record).await {
            warn!(
                user_id = %user_id,
                path = %path,
                error = %e,
                "Metadata write failed, object left orphaned"
            );
            return Err(failed(WorkflowStage::Recording, e));
        }

        info!(stage = %WorkflowStage::Done, user_id = %user_id, path = %path, "Image stored");

        let gallery = match self.gallery.list(GalleryScope::Mine, Some(identity)).await {
            Ok(images) => Some(images),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Gallery refresh failed");
                None
            }
        };

        Ok(GenerationOutcome {
            image_data_uri,
            stored: Some(StoredImage { path, public_url }),
            gallery,
        })
    }
}
