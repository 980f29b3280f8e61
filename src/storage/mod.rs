//! Storage module - object store adapters for generated images

pub mod filesystem;
pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use reqwest::Url;
use std::sync::Arc;

use crate::config::{Settings, StorageBackend};
use crate::error::{AppError, Result};
use crate::supabase::SupabaseClient;

pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;
pub use supabase::SupabaseStorage;

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 13;

/// Location of an object: `{namespace}/{filename}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    namespace: String,
    filename: String,
}

impl ObjectKey {
    /// Build a key, rejecting empty segments and anything that could escape the namespace
    pub fn new(namespace: impl Into<String>, filename: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let filename = filename.into();
        validate_segment("namespace", &namespace)?;
        validate_segment("filename", &filename)?;
        Ok(Self { namespace, filename })
    }

    /// Fresh key for a generated JPEG owned by `user_id`
    pub fn for_generated_image(user_id: &str) -> Result<Self> {
        Self::new(user_id, generate_filename())
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.namespace, self.filename)
    }
}

fn validate_segment(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(AppError::Validation(format!("object {} must not be empty", kind)));
    }
    if value.contains('/') || value.contains('\\') || value.contains("..") {
        return Err(AppError::Validation(format!(
            "object {} contains a path separator: {}",
            kind, value
        )));
    }
    Ok(())
}

/// Parse a URL that path segments can be appended to
pub(crate) fn parse_base_url(name: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| {
        AppError::Config(config::ConfigError::Message(format!(
            "{} is not a valid URL: {}",
            name, e
        )))
    })?;
    if url.cannot_be_a_base() {
        return Err(AppError::Config(config::ConfigError::Message(format!(
            "{} cannot be used as a base URL: {}",
            name, raw
        ))));
    }
    Ok(url)
}

/// `base` with `segments` appended, each one percent-encoded
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// `{unix millis}-{13 random base36 chars}.jpg`
pub fn generate_filename() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}.jpg", Utc::now().timestamp_millis(), suffix)
}

/// Blob storage with a pure path-to-URL mapping
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `data` under `key`
    async fn upload(&self, key: &ObjectKey, data: Vec<u8>, content_type: &str) -> Result<()>;

    /// Public URL for `key`. Performs no I/O.
    fn public_url(&self, key: &ObjectKey) -> String;
}

/// Construct the object store selected by `storage.backend`
pub fn build_object_store(
    settings: &Settings,
    supabase: Option<&SupabaseClient>,
) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match settings.storage.backend {
        StorageBackend::Supabase => {
            let client = supabase.ok_or_else(|| {
                AppError::Internal("supabase storage selected without a client".to_string())
            })?;
            Arc::new(SupabaseStorage::new(client.clone(), &settings.storage.bucket))
        }
        StorageBackend::Filesystem => Arc::new(FilesystemStore::new(
            &settings.storage.base_path,
            &settings.storage.url_prefix,
        )?),
        StorageBackend::Memory => Arc::new(MemoryStore::new(&settings.storage.bucket)),
    };
    Ok(store)
}
