//! Shard node registry.

use crate::error::MetadataResult;
use crate::models::ShardNodeRow;
use async_trait::async_trait;
use strata_core::ShardId;

/// Repository for the shard node registry.
#[async_trait]
pub trait ShardNodeRepo: Send + Sync {
    /// List active nodes ordered by node id.
    async fn list_active_shard_nodes(&self) -> MetadataResult<Vec<ShardNodeRow>>;

    /// Insert a node or update the address and active flag of an existing one.
    async fn register_shard_node(&self, node: &ShardNodeRow) -> MetadataResult<()>;

    /// Toggle whether a node takes part in new uploads and downloads.
    ///
    /// Returns `NotFound` if the node is not registered.
    async fn set_shard_node_active(&self, node_id: ShardId, active: bool) -> MetadataResult<()>;
}
