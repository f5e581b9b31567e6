//! Coordinator test utilities.

use super::nodes::{TestShardNode, spawn_nodes};
use std::sync::Arc;
use strata_coordinator::bootstrap::register_configured_shard_nodes;
use strata_coordinator::{AppState, Coordinator, create_router};
use strata_core::config::{CoordinatorConfig, MetadataConfig};
use strata_metadata::{MetadataStore, SqliteStore};
use strata_storage::{FilesystemBackend, ObjectStore};
use tempfile::TempDir;

/// A coordinator wired to real shard nodes, a SQLite registry and a
/// filesystem staging area.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestCoordinator {
    pub coordinator: Arc<Coordinator>,
    pub router: axum::Router,
    pub state: AppState,
    pub metadata: Arc<dyn MetadataStore>,
    pub staging: Arc<dyn ObjectStore>,
    pub nodes: Vec<TestShardNode>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestCoordinator {
    /// Create a coordinator backed by `shard_count` live nodes.
    pub async fn with_nodes(shard_count: usize) -> Self {
        Self::with_config(shard_count, |_| {}).await
    }

    /// Create a coordinator with custom config modifications.
    pub async fn with_config<F>(shard_count: usize, modifier: F) -> Self
    where
        F: FnOnce(&mut CoordinatorConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let db_path = temp_dir.path().join("metadata.db");
        let staging_path = temp_dir.path().join("cache");

        let mut config = CoordinatorConfig::for_testing();
        config.metadata = MetadataConfig::Sqlite {
            path: db_path.clone(),
        };
        config.staging.path = staging_path.clone();
        modifier(&mut config);

        // Nodes share the coordinator's upload limit, as in a deployment
        // where both read the same setting.
        let nodes = spawn_nodes(shard_count, config.server.max_upload_bytes).await;
        config.shard_nodes = nodes.iter().map(TestShardNode::entry).collect();

        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .expect("Failed to create metadata store"),
        );
        register_configured_shard_nodes(metadata.as_ref(), &config.shard_nodes)
            .await
            .expect("Failed to register shard nodes");

        let staging: Arc<dyn ObjectStore> = Arc::new(
            FilesystemBackend::new(&staging_path)
                .await
                .expect("Failed to create staging area"),
        );

        let coordinator = Arc::new(
            Coordinator::connect(
                metadata.clone(),
                staging.clone(),
                &config.shard_client,
                config.cache.ttl(),
            )
            .await
            .expect("Failed to build coordinator"),
        );

        let state = AppState::new(config, coordinator.clone());
        let router = create_router(state.clone());

        Self {
            coordinator,
            router,
            state,
            metadata,
            staging,
            nodes,
            _temp_dir: temp_dir,
        }
    }

    pub fn node(&self, id: i64) -> &TestShardNode {
        self.nodes
            .iter()
            .find(|node| node.id == id)
            .expect("no such test node")
    }
}
