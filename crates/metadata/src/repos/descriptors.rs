//! File descriptor repository.

use crate::error::MetadataResult;
use crate::models::FileDescriptorRow;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for file descriptors.
#[async_trait]
pub trait DescriptorRepo: Send + Sync {
    /// Get a descriptor by file id.
    async fn get_descriptor(&self, file_id: Uuid) -> MetadataResult<Option<FileDescriptorRow>>;

    /// Insert a descriptor, or update the existing one with the same checksum.
    ///
    /// Upload is idempotent on content: when a descriptor with the same
    /// checksum exists, its name, content type and shard list are replaced and
    /// its original file id is kept. Returns the canonical file id.
    async fn upsert_descriptor(&self, descriptor: &FileDescriptorRow) -> MetadataResult<Uuid>;

    /// Delete a descriptor. Returns whether a row was removed.
    async fn delete_descriptor(&self, file_id: Uuid) -> MetadataResult<bool>;
}
