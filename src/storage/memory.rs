//! In-memory object store

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::Result;
use crate::storage::{ObjectKey, ObjectStore};

/// A stored blob and its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Keeps objects in a concurrent map keyed by path
pub struct MemoryStore {
    bucket: String,
    objects: DashMap<String, StoredObject>,
}

impl MemoryStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: DashMap::new(),
        }
    }

    pub fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects.get(path).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(&self, key: &ObjectKey, data: Vec<u8>, content_type: &str) -> Result<()> {
        self.objects.insert(
            key.path(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, key: &ObjectKey) -> String {
        format!("memory://{}/{}", self.bucket, key.path())
    }
}
