//! Prompt Gallery
//!
//! Turns text prompts into images through a hosted inference API, stores the images in
//! an object store with their metadata in a repository, and serves a per-user gallery.

pub mod api;
pub mod config;
pub mod error;
pub mod gallery;
pub mod identity;
pub mod inference;
pub mod middleware;
pub mod repository;
pub mod storage;
pub mod supabase;
pub mod workflow;

pub use error::{AppError, Result};

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{DatabaseBackend, Settings, StorageBackend};
use gallery::GalleryReader;
use identity::UserMirror;
use inference::{HttpInferenceClient, ImageGenerator};
use repository::{build_repositories, ImageRepository, UserRepository};
use storage::{build_object_store, ObjectStore};
use supabase::SupabaseClient;
use workflow::GenerationWorkflow;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,
    pub generator: Arc<dyn ImageGenerator>,
    pub workflow: GenerationWorkflow,
    pub gallery: GalleryReader,
    pub users: Arc<dyn UserRepository>,
    pub user_mirror: UserMirror,
    /// Served under `/files` when images are stored on the local filesystem
    pub files_dir: Option<PathBuf>,
}

impl AppState {
    /// Wire explicitly constructed collaborators together
    pub fn new(
        settings: Settings,
        generator: Arc<dyn ImageGenerator>,
        store: Arc<dyn ObjectStore>,
        images: Arc<dyn ImageRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        let files_dir = (settings.storage.backend == StorageBackend::Filesystem)
            .then(|| PathBuf::from(&settings.storage.base_path));

        Self {
            workflow: GenerationWorkflow::new(generator.clone(), store, images.clone()),
            gallery: GalleryReader::new(images),
            user_mirror: UserMirror::new(users.clone()),
            generator,
            users,
            files_dir,
            settings,
        }
    }

    /// Build every collaborator from configuration
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let supabase = if settings.storage.backend == StorageBackend::Supabase
            || settings.database.backend == DatabaseBackend::Postgrest
        {
            Some(SupabaseClient::new(&settings.supabase)?)
        } else {
            None
        };

        let generator: Arc<dyn ImageGenerator> =
            Arc::new(HttpInferenceClient::new(&settings.inference)?);
        let store = build_object_store(&settings, supabase.as_ref())?;
        let repositories = build_repositories(&settings, supabase.as_ref())?;

        Ok(Self::new(
            settings,
            generator,
            store,
            repositories.images,
            repositories.users,
        ))
    }
}
