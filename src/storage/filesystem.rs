//! Local filesystem object store, served back by the HTTP API under `/files`

use async_trait::async_trait;
use reqwest::Url;
use std::path::PathBuf;
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::storage::{join_segments, parse_base_url, ObjectKey, ObjectStore};

/// Stores objects as `{base_path}/{namespace}/{filename}`
pub struct FilesystemStore {
    base_path: PathBuf,
    url_prefix: Url,
}

impl FilesystemStore {
    pub fn new(base_path: impl Into<PathBuf>, url_prefix: &str) -> Result<Self> {
        Ok(Self {
            base_path: base_path.into(),
            url_prefix: parse_base_url("storage.url_prefix", url_prefix)?,
        })
    }

    /// Full path on disk for a key
    pub fn get_path(&self, key: &ObjectKey) -> PathBuf {
        self.base_path.join(key.namespace()).join(key.filename())
    }

    /// Read an object back
    pub async fn read(&self, key: &ObjectKey) -> Result<Vec<u8>> {
        fs::read(self.get_path(key))
            .await
            .map_err(|e| AppError::Storage(format!("read of {} failed: {}", key.path(), e)))
    }
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    async fn upload(&self, key: &ObjectKey, data: Vec<u8>, _content_type: &str) -> Result<()> {
        let dir = self.base_path.join(key.namespace());
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Storage(format!("cannot create {}: {}", dir.display(), e)))?;

        let file_path = dir.join(key.filename());
        // Existing objects are never overwritten.
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .await
            .map_err(|e| AppError::Storage(format!("upload of {} failed: {}", key.path(), e)))?;

        file.write_all(&data)
            .await
            .map_err(|e| AppError::Storage(format!("upload of {} failed: {}", key.path(), e)))?;
        file.flush()
            .await
            .map_err(|e| AppError::Storage(format!("upload of {} failed: {}", key.path(), e)))?;

        debug!(path = ?file_path, size = data.len(), "Saved image file");
        Ok(())
    }

    fn public_url(&self, key: &ObjectKey) -> String {
        join_segments(&self.url_prefix, &[key.namespace(), key.filename()]).into()
    }
}
