//! Fragment storage keyed by file id.

use bytes::Bytes;
use std::sync::Arc;
use strata_core::FileId;
use strata_storage::{ObjectStore, StorageResult};

/// Holds exactly one fragment per file id. A put for an id that already has a
/// fragment replaces it.
#[derive(Clone)]
pub struct FragmentStore {
    storage: Arc<dyn ObjectStore>,
}

impl FragmentStore {
    pub fn new(storage: Arc<dyn ObjectStore>) -> Self {
        Self { storage }
    }

    fn key(id: &FileId) -> String {
        format!("fragments/{id}")
    }

    /// Store the fragment for `id`, overwriting any previous one.
    pub async fn put(&self, id: &FileId, data: Bytes) -> StorageResult<()> {
        self.storage.put(&Self::key(id), data).await
    }

    /// Fetch the fragment for `id`. Unknown ids fail with `StorageError::NotFound`.
    pub async fn get(&self, id: &FileId) -> StorageResult<Bytes> {
        self.storage.get(&Self::key(id)).await
    }

    pub async fn health_check(&self) -> StorageResult<()> {
        self.storage.health_check().await
    }

    pub fn backend_name(&self) -> &'static str {
        self.storage.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_storage::{MemoryBackend, StorageError};

    fn store() -> FragmentStore {
        FragmentStore::new(Arc::new(MemoryBackend::new()))
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let fragments = store();
        let id = FileId::new();
        fragments.put(&id, Bytes::from("part")).await.unwrap();
        assert_eq!(fragments.get(&id).await.unwrap(), Bytes::from("part"));
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let fragments = store();
        let id = FileId::new();
        fragments.put(&id, Bytes::from("old")).await.unwrap();
        fragments.put(&id, Bytes::from("new")).await.unwrap();
        assert_eq!(fragments.get(&id).await.unwrap(), Bytes::from("new"));
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let fragments = store();
        assert!(matches!(
            fragments.get(&FileId::new()).await,
            Err(StorageError::NotFound(_))
        ));
    }
}
