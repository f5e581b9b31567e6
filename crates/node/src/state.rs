//! Application state shared across handlers.

use crate::fragments::FragmentStore;
use std::sync::Arc;
use strata_core::config::NodeConfig;
use strata_storage::ObjectStore;

/// Shard node state.
#[derive(Clone)]
pub struct NodeState {
    pub config: Arc<NodeConfig>,
    pub fragments: FragmentStore,
}

impl NodeState {
    pub fn new(config: NodeConfig, storage: Arc<dyn ObjectStore>) -> Self {
        Self {
            config: Arc::new(config),
            fragments: FragmentStore::new(storage),
        }
    }
}
