//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use sqlx::types::Json;
use strata_core::{ContentHash, FileId, ShardId};
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// File descriptors
// =============================================================================

/// Where an uploaded file lives: its content checksum and the ordered list of
/// shard nodes holding its fragments.
#[derive(Debug, Clone, FromRow)]
pub struct FileDescriptorRow {
    pub file_id: Uuid,
    /// Lowercase hex SHA-256 of the file content. Unique across descriptors.
    pub checksum: String,
    pub file_name: String,
    pub content_type: String,
    /// Shard ids in split order; fragment `i` lives on `shard_ids[i]`.
    pub shard_ids: Json<Vec<ShardId>>,
    pub created_at: OffsetDateTime,
}

impl FileDescriptorRow {
    pub fn new(
        checksum: &ContentHash,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        shard_ids: Vec<ShardId>,
    ) -> Self {
        Self {
            file_id: *FileId::new().as_uuid(),
            checksum: checksum.to_hex(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            shard_ids: Json(shard_ids),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn id(&self) -> FileId {
        FileId::from_uuid(self.file_id)
    }
}

// =============================================================================
// Cache entries
// =============================================================================

/// A locally staged copy of some content, servable until `expires_at`.
#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct CacheEntryRow {
    /// Lowercase hex SHA-256 of the cached content.
    pub checksum: String,
    /// Staging-area key holding the bytes.
    pub local_name: String,
    pub expires_at: OffsetDateTime,
}

impl CacheEntryRow {
    pub fn is_live(&self, now: OffsetDateTime) -> bool {
        self.expires_at > now
    }
}

// =============================================================================
// Shard node registry
// =============================================================================

/// A shard node known to the coordinator.
#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct ShardNodeRow {
    pub node_id: ShardId,
    pub address: String,
    pub active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
