//! Cache entry repository.

use crate::error::MetadataResult;
use crate::models::CacheEntryRow;
use async_trait::async_trait;
use time::OffsetDateTime;

/// Repository for content-addressed cache entries.
#[async_trait]
pub trait CacheEntryRepo: Send + Sync {
    /// Get the cache entry for a checksum, live or not.
    async fn get_cache_entry(&self, checksum: &str) -> MetadataResult<Option<CacheEntryRow>>;

    /// Insert or refresh the entry for `entry.checksum`.
    async fn upsert_cache_entry(&self, entry: &CacheEntryRow) -> MetadataResult<()>;

    /// List entries with `expires_at <= cutoff`.
    async fn list_expired_cache_entries(
        &self,
        cutoff: OffsetDateTime,
    ) -> MetadataResult<Vec<CacheEntryRow>>;

    /// Delete the given entries if they are still expired at `cutoff`.
    ///
    /// An entry refreshed by an upload after it was listed survives. Returns
    /// the entries that were actually removed.
    async fn delete_cache_entries(
        &self,
        entries: &[CacheEntryRow],
        cutoff: OffsetDateTime,
    ) -> MetadataResult<Vec<CacheEntryRow>>;
}
