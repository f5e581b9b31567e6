//! Shard node test server.

use std::sync::Arc;
use strata_core::config::NodeConfig;
use strata_node::{NodeState, create_router};
use strata_storage::{MemoryBackend, ObjectStore};

/// A node router backed by memory storage.
#[allow(dead_code)]
pub struct TestNode {
    pub router: axum::Router,
    pub state: NodeState,
}

#[allow(dead_code)]
impl TestNode {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut NodeConfig),
    {
        let mut config = NodeConfig::for_testing();
        modifier(&mut config);

        let storage: Arc<dyn ObjectStore> = Arc::new(MemoryBackend::new());
        let state = NodeState::new(config, storage);
        let router = create_router(state.clone());
        Self { router, state }
    }
}
