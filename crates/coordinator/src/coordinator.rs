//! Upload and download orchestration.
//!
//! Upload: checksum, stage locally, upsert the descriptor and cache entry,
//! split, then send one fragment to each shard node concurrently.
//!
//! Download: look up the descriptor, serve a verified cached copy when one is
//! live, otherwise fetch every fragment concurrently and merge by shard id.
//!
//! Neither path retries or rolls back. A failed fragment dispatch leaves the
//! descriptor and cache entry in place and surfaces the error to the caller.

use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use strata_core::config::ShardClientConfig;
use strata_core::{ContentHash, FileId, Shard, ShardId};
use strata_metadata::MetadataStore;
use strata_metadata::models::{CacheEntryRow, FileDescriptorRow};
use strata_storage::{ObjectStore, StorageError};
use time::OffsetDateTime;
use tracing::instrument;

use crate::error::{CoordinatorError, CoordinatorResult};
use crate::fanout::{FanOutError, fan_out};
use crate::metrics;
use crate::shard_client::{ShardClient, ShardError, build_clients, index_clients};
use crate::staging::StagingArea;

/// Where a downloaded file's bytes came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchSource {
    Cache,
    Shards,
}

impl FetchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Shards => "shards",
        }
    }
}

/// A reassembled file.
#[derive(Clone, Debug)]
pub struct FileItem {
    pub id: FileId,
    pub name: String,
    pub content_type: String,
    pub content: Bytes,
    pub source: FetchSource,
}

/// Owns the shard clients and mediates every read and write.
pub struct Coordinator {
    metadata: Arc<dyn MetadataStore>,
    staging: StagingArea,
    clients: BTreeMap<ShardId, Arc<dyn ShardClient>>,
    cache_ttl: Duration,
}

impl Coordinator {
    /// Build a coordinator over a fixed set of shard clients.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        staging: Arc<dyn ObjectStore>,
        clients: Vec<Arc<dyn ShardClient>>,
        cache_ttl: Duration,
    ) -> CoordinatorResult<Self> {
        Ok(Self {
            metadata,
            staging: StagingArea::new(staging),
            clients: index_clients(clients)?,
            cache_ttl,
        })
    }

    /// Build a coordinator whose shard clients are the active nodes in the
    /// metadata registry. The set is fixed for the coordinator's lifetime.
    pub async fn connect(
        metadata: Arc<dyn MetadataStore>,
        staging: Arc<dyn ObjectStore>,
        shard_client: &ShardClientConfig,
        cache_ttl: Duration,
    ) -> CoordinatorResult<Self> {
        let nodes = metadata.list_active_shard_nodes().await?;
        let clients = build_clients(&nodes, shard_client.timeout())?;
        for client in &clients {
            tracing::info!(
                shard_id = client.shard_id(),
                address = client.address(),
                "Shard node registered"
            );
        }
        Self::new(metadata, staging, clients, cache_ttl)
    }

    /// Shard ids in ascending order. Fragment `i` of every new upload goes to
    /// the `i`th id.
    pub fn shard_ids(&self) -> Vec<ShardId> {
        self.clients.keys().copied().collect()
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataStore> {
        &self.metadata
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Store a file and distribute its fragments. Returns the canonical id.
    ///
    /// Uploads are idempotent on content: re-uploading identical bytes keeps
    /// the id first issued for them, refreshes the name, content type and
    /// cache expiry, and re-sends the fragments.
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn put_file_item(
        &self,
        name: &str,
        content_type: &str,
        content: Bytes,
    ) -> CoordinatorResult<FileId> {
        if content.is_empty() {
            return Err(CoordinatorError::Validation("file is empty".to_string()));
        }
        let shard_ids = self.shard_ids();
        if shard_ids.is_empty() {
            return Err(CoordinatorError::Validation(
                "no active shard nodes".to_string(),
            ));
        }

        let Some(expires_at) = cache_expiry(OffsetDateTime::now_utc(), self.cache_ttl) else {
            return Err(CoordinatorError::Validation(format!(
                "cache ttl of {}s is out of range",
                self.cache_ttl.as_secs()
            )));
        };

        let checksum = ContentHash::compute(&content);
        let local_name = StagingArea::key_for(&checksum);
        self.staging
            .write_staged(&local_name, content.clone())
            .await?;
        let staged = self.staging.checksum(&local_name).await?;
        if staged != checksum {
            return Err(CoordinatorError::ChecksumMismatch {
                expected: checksum.to_hex(),
                actual: staged.to_hex(),
            });
        }

        let descriptor = FileDescriptorRow::new(&checksum, name, content_type, shard_ids.clone());
        let file_id = FileId::from_uuid(self.metadata.upsert_descriptor(&descriptor).await?);
        if file_id != descriptor.id() {
            tracing::debug!(file_id = %file_id, "Content already stored, reusing canonical id");
        }

        self.metadata
            .upsert_cache_entry(&CacheEntryRow {
                checksum: checksum.to_hex(),
                local_name,
                expires_at,
            })
            .await?;

        let shards = strata_core::split(&content, &shard_ids)?;
        let mut jobs = Vec::with_capacity(shards.len());
        for shard in shards {
            jobs.push((shard.shard_id, (self.client(shard.shard_id)?, shard.data)));
        }

        let timer = metrics::SHARD_FANOUT_DURATION
            .with_label_values(&["put"])
            .start_timer();
        let dispatched = fan_out(jobs, move |_, (client, data)| async move {
            client.put_fragment(file_id, data).await
        })
        .await;
        timer.observe_duration();
        dispatched.map_err(|e| fan_out_error("put", e))?;

        metrics::FILES_UPLOADED.inc();
        metrics::BYTES_UPLOADED.inc_by(content.len() as u64);
        tracing::info!(
            file_id = %file_id,
            checksum = %checksum,
            shards = shard_ids.len(),
            "File stored"
        );
        Ok(file_id)
    }

    /// Load a file, from the cache when possible, else from the shard nodes.
    #[instrument(skip(self))]
    pub async fn get_file_item(&self, id: FileId) -> CoordinatorResult<FileItem> {
        let descriptor = self
            .metadata
            .get_descriptor(*id.as_uuid())
            .await?
            .ok_or_else(|| CoordinatorError::NotFound(format!("file {id}")))?;
        let expected = ContentHash::from_hex(&descriptor.checksum)?;

        let (content, source) = match self.cached_content(&descriptor, &expected).await? {
            Some(content) => {
                metrics::CACHE_HITS.inc();
                (content, FetchSource::Cache)
            }
            None => {
                metrics::CACHE_MISSES.inc();
                (
                    self.fetch_from_shards(&descriptor, &expected).await?,
                    FetchSource::Shards,
                )
            }
        };

        metrics::FILES_DOWNLOADED
            .with_label_values(&[source.as_str()])
            .inc();
        tracing::debug!(
            file_id = %id,
            source = source.as_str(),
            size = content.len(),
            "File loaded"
        );

        Ok(FileItem {
            id,
            name: descriptor.file_name,
            content_type: descriptor.content_type,
            content,
            source,
        })
    }

    /// Remove a file's descriptor.
    ///
    /// The cache entry is left to expire and shard fragments stay on their
    /// nodes; nodes do not garbage collect.
    #[instrument(skip(self))]
    pub async fn delete_file_item(&self, id: FileId) -> CoordinatorResult<()> {
        if !self.metadata.delete_descriptor(*id.as_uuid()).await? {
            return Err(CoordinatorError::NotFound(format!("file {id}")));
        }
        tracing::info!(file_id = %id, "File descriptor deleted");
        Ok(())
    }

    /// Remove every cache entry that expired at or before `cutoff`, along
    /// with its staged bytes. Returns the number of entries removed.
    ///
    /// Entries refreshed between listing and deletion survive.
    pub async fn sweep_cache(&self, cutoff: OffsetDateTime) -> CoordinatorResult<usize> {
        let expired = self.metadata.list_expired_cache_entries(cutoff).await?;
        if expired.is_empty() {
            return Ok(0);
        }

        let removed = self.metadata.delete_cache_entries(&expired, cutoff).await?;
        for entry in &removed {
            if let Err(e) = self.staging.delete_staged(&entry.local_name).await {
                tracing::warn!(
                    checksum = %entry.checksum,
                    local_name = %entry.local_name,
                    error = %e,
                    "Failed to delete staged copy"
                );
            }
        }

        metrics::CACHE_EVICTIONS.inc_by(removed.len() as u64);
        Ok(removed.len())
    }

    /// Purge every cache entry regardless of expiry.
    pub async fn clear_cache_all(&self) -> CoordinatorResult<usize> {
        self.sweep_cache(time::macros::datetime!(9999-12-31 23:59:59 UTC))
            .await
    }

    fn client(&self, shard_id: ShardId) -> CoordinatorResult<Arc<dyn ShardClient>> {
        self.clients
            .get(&shard_id)
            .cloned()
            .ok_or_else(|| CoordinatorError::Internal(format!("no client for shard {shard_id}")))
    }

    /// The staged copy for `descriptor`, if its cache entry is live and the
    /// bytes still hash to the descriptor's checksum.
    async fn cached_content(
        &self,
        descriptor: &FileDescriptorRow,
        expected: &ContentHash,
    ) -> CoordinatorResult<Option<Bytes>> {
        let Some(entry) = self.metadata.get_cache_entry(&descriptor.checksum).await? else {
            return Ok(None);
        };
        if !entry.is_live(OffsetDateTime::now_utc()) {
            return Ok(None);
        }

        match self.staging.read_staged(&entry.local_name).await {
            Ok(content) if ContentHash::compute(&content) == *expected => Ok(Some(content)),
            Ok(_) => {
                tracing::warn!(
                    local_name = %entry.local_name,
                    "Staged copy does not match checksum, ignoring"
                );
                Ok(None)
            }
            // Evicted between the lookup and the read.
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => {
                tracing::warn!(
                    local_name = %entry.local_name,
                    error = %e,
                    "Failed to read staged copy, falling back to shards"
                );
                Ok(None)
            }
        }
    }

    async fn fetch_from_shards(
        &self,
        descriptor: &FileDescriptorRow,
        expected: &ContentHash,
    ) -> CoordinatorResult<Bytes> {
        let file_id = descriptor.id();
        let wanted = &descriptor.shard_ids.0;

        let jobs: Vec<_> = wanted
            .iter()
            .filter_map(|shard_id| {
                let client = self.clients.get(shard_id).cloned();
                if client.is_none() {
                    tracing::warn!(shard_id, "No active client for shard holding a fragment");
                }
                client.map(|client| (*shard_id, client))
            })
            .collect();

        let timer = metrics::SHARD_FANOUT_DURATION
            .with_label_values(&["get"])
            .start_timer();
        let fetched = fan_out(jobs, move |_, client| async move {
            client.get_fragment(file_id).await
        })
        .await;
        timer.observe_duration();
        let fragments = fetched.map_err(|e| fan_out_error("get", e))?;

        if fragments.len() != wanted.len() {
            return Err(CoordinatorError::IncompleteFetch {
                expected: wanted.len(),
                received: fragments.len(),
            });
        }

        let content = strata_core::merge(
            fragments
                .into_iter()
                .map(|(shard_id, data)| Shard::new(shard_id, data))
                .collect(),
        );

        let actual = ContentHash::compute(&content);
        if actual != *expected {
            return Err(CoordinatorError::ChecksumMismatch {
                expected: expected.to_hex(),
                actual: actual.to_hex(),
            });
        }
        Ok(content)
    }
}

/// `now + ttl`, or `None` when the result is not a representable timestamp.
fn cache_expiry(now: OffsetDateTime, ttl: Duration) -> Option<OffsetDateTime> {
    time::Duration::try_from(ttl)
        .ok()
        .and_then(|ttl| now.checked_add(ttl))
}

fn fan_out_error(operation: &str, error: FanOutError<ShardError>) -> CoordinatorError {
    metrics::SHARD_CALL_ERRORS
        .with_label_values(&[operation])
        .inc();
    match error {
        FanOutError::Call { shard_id, error } => {
            tracing::warn!(shard_id, operation, error = %error, "Shard call failed");
            CoordinatorError::Shard {
                shard_id,
                source: error,
            }
        }
        FanOutError::Join { shard_id, message } => CoordinatorError::Internal(format!(
            "shard {operation} task for {shard_id:?} failed: {message}"
        )),
    }
}
