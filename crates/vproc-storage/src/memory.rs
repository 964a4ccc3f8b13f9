//! In-process object store keyed like the S3 adapter.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use vproc_models::ArtifactRef;

use crate::error::{StorageError, StorageResult};
use crate::store::ObjectStore;

/// Objects held in memory, keyed by `<kind>/<object_id>`.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object directly.
    pub fn insert(&self, artifact: &ArtifactRef, data: impl Into<Vec<u8>>) {
        if let Ok(mut objects) = self.objects.lock() {
            objects.insert(artifact.key(), data.into());
        }
    }

    pub fn get(&self, artifact: &ArtifactRef) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(&artifact.key()).cloned())
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn fetch(&self, artifact: &ArtifactRef, dest: &Path) -> StorageResult<()> {
        let data = self
            .get(artifact)
            .ok_or_else(|| StorageError::not_found(artifact.key()))?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, data).await?;
        Ok(())
    }

    async fn store(&self, src: &Path, artifact: &ArtifactRef) -> StorageResult<()> {
        let data = tokio::fs::read(src)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", src.display(), e)))?;
        self.insert(artifact, data);
        Ok(())
    }
}
