//! Real shard node servers on ephemeral loopback ports.

use std::sync::{Arc, Mutex};
use strata_core::config::{NodeConfig, ShardNodeEntry};
use strata_core::{FileId, ShardId};
use strata_node::{NodeState, create_router};
use strata_storage::{MemoryBackend, ObjectStore};
use tokio::task::JoinHandle;

/// A shard node serving its HTTP API until dropped.
#[allow(dead_code)]
pub struct TestShardNode {
    pub id: ShardId,
    pub address: String,
    pub state: NodeState,
    handle: Mutex<Option<JoinHandle<()>>>,
}

#[allow(dead_code)]
impl TestShardNode {
    pub async fn spawn(id: ShardId) -> Self {
        Self::spawn_with_config(id, NodeConfig::for_testing()).await
    }

    pub async fn spawn_with_config(id: ShardId, config: NodeConfig) -> Self {
        let storage: Arc<dyn ObjectStore> = Arc::new(MemoryBackend::new());
        let state = NodeState::new(config, storage);
        let router = create_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind shard node listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            id,
            address: format!("http://{addr}"),
            state,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Registry entry for this node.
    pub fn entry(&self) -> ShardNodeEntry {
        ShardNodeEntry {
            id: self.id,
            address: self.address.clone(),
            active: true,
        }
    }

    /// The fragment this node holds for `id`, if any.
    pub async fn fragment(&self, id: FileId) -> Option<bytes::Bytes> {
        self.state.fragments.get(&id).await.ok()
    }

    /// Stop serving and close the listener. Connections opened afterwards
    /// are refused.
    pub async fn stop(&self) {
        let handle = self.handle.lock().expect("handle lock poisoned").take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Drop for TestShardNode {
    fn drop(&mut self) {
        if let Ok(mut handle) = self.handle.lock()
            && let Some(handle) = handle.take()
        {
            handle.abort();
        }
    }
}

/// Spawn nodes with ids `1..=count`, each accepting fragments of up to
/// `max_upload_bytes`.
#[allow(dead_code)]
pub async fn spawn_nodes(count: usize, max_upload_bytes: usize) -> Vec<TestShardNode> {
    let mut nodes = Vec::with_capacity(count);
    for id in 1..=count as ShardId {
        let mut config = NodeConfig::for_testing();
        config.server.max_upload_bytes = max_upload_bytes;
        nodes.push(TestShardNode::spawn_with_config(id, config).await);
    }
    nodes
}
