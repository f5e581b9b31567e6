//! Shard node registry initialization.

use anyhow::Result;
use strata_core::config::ShardNodeEntry;
use strata_metadata::MetadataStore;
use strata_metadata::models::ShardNodeRow;
use time::OffsetDateTime;

/// Upsert the shard nodes listed in configuration into the registry.
///
/// Nodes already registered but absent from configuration are left untouched,
/// so operators can still manage the registry directly.
pub async fn register_configured_shard_nodes(
    metadata: &dyn MetadataStore,
    nodes: &[ShardNodeEntry],
) -> Result<usize> {
    let now = OffsetDateTime::now_utc();
    for node in nodes {
        node.validate().map_err(anyhow::Error::msg)?;
        metadata
            .register_shard_node(&ShardNodeRow {
                node_id: node.id,
                address: node.address.trim_end_matches('/').to_string(),
                active: node.active,
                created_at: now,
                updated_at: now,
            })
            .await?;
        tracing::info!(
            node_id = node.id,
            address = %node.address,
            active = node.active,
            "Shard node upserted from configuration"
        );
    }
    Ok(nodes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_metadata::SqliteStore;
    use strata_metadata::repos::ShardNodeRepo;

    #[tokio::test]
    async fn test_registers_and_updates_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("metadata.db")).await.unwrap();

        let mut nodes = vec![
            ShardNodeEntry {
                id: 2,
                address: "http://node-2:9000/".to_string(),
                active: true,
            },
            ShardNodeEntry {
                id: 1,
                address: "http://node-1:9000".to_string(),
                active: true,
            },
        ];
        assert_eq!(register_configured_shard_nodes(&store, &nodes).await.unwrap(), 2);

        let active = store.list_active_shard_nodes().await.unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].node_id, 1);
        assert_eq!(active[1].address, "http://node-2:9000");

        nodes[0].active = false;
        register_configured_shard_nodes(&store, &nodes).await.unwrap();
        let active = store.list_active_shard_nodes().await.unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_invalid_address() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("metadata.db")).await.unwrap();
        let nodes = [ShardNodeEntry {
            id: 1,
            address: "node-1:9000".to_string(),
            active: true,
        }];
        assert!(register_configured_shard_nodes(&store, &nodes).await.is_err());
    }
}
