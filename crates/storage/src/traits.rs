//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;

/// Keyed byte storage.
///
/// Keys are relative, `/`-separated paths. Backends must reject keys that
/// would escape their root and must make `put` atomic: a concurrent `get`
/// observes either the previous value or the new one, never a torn write.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get an object's content.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Put an object atomically, replacing any existing value.
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()>;

    /// Delete an object.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Get the name of this storage backend, for logs and metrics.
    fn backend_name(&self) -> &'static str;

    /// Verify storage backend availability.
    ///
    /// Called at startup and by readiness probes. The default implementation
    /// returns Ok(()), suitable for backends with nothing to verify.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
