//! Local staging area backing the content cache.

use bytes::Bytes;
use std::sync::Arc;
use strata_core::ContentHash;
use strata_storage::{ObjectStore, StorageError, StorageResult};

/// Local byte storage for uploaded files.
///
/// Staged copies are keyed by content checksum, so concurrent uploads of
/// different files never share a key and identical content always does.
#[derive(Clone)]
pub struct StagingArea {
    store: Arc<dyn ObjectStore>,
}

impl StagingArea {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Staging key for content with this checksum.
    pub fn key_for(checksum: &ContentHash) -> String {
        format!("objects/{}", checksum.to_hex())
    }

    pub async fn write_staged(&self, name: &str, data: Bytes) -> StorageResult<()> {
        self.store.put(name, data).await
    }

    pub async fn read_staged(&self, name: &str) -> StorageResult<Bytes> {
        self.store.get(name).await
    }

    /// Hash the staged bytes stored under `name`.
    pub async fn checksum(&self, name: &str) -> StorageResult<ContentHash> {
        let data = self.store.get(name).await?;
        Ok(ContentHash::compute(&data))
    }

    /// Remove a staged copy. Already-missing copies are not an error.
    pub async fn delete_staged(&self, name: &str) -> StorageResult<()> {
        match self.store.delete(name).await {
            Err(StorageError::NotFound(_)) => Ok(()),
            other => other,
        }
    }

    pub async fn health_check(&self) -> StorageResult<()> {
        self.store.health_check().await
    }
}
