//! Coordinator service for strata.
//!
//! The coordinator splits uploaded files across a fixed set of shard nodes,
//! keeps a content-addressed local cache of recent uploads, and reassembles
//! files on read:
//! - [`Coordinator`]: upload, download, delete and cache sweeps
//! - [`fanout`]: one concurrent call per shard node with a single collector
//! - [`shard_client`]: the outbound HTTP channel to each node
//! - [`eviction`]: the periodic cache sweep task
//! - HTTP routes, handlers and Prometheus metrics

pub mod bootstrap;
pub mod coordinator;
pub mod error;
pub mod eviction;
pub mod fanout;
pub mod handlers;
pub mod metrics;
pub mod request_id;
pub mod routes;
pub mod shard_client;
pub mod staging;
pub mod state;

pub use coordinator::{Coordinator, FetchSource, FileItem};
pub use error::{ApiError, CoordinatorError, CoordinatorResult};
pub use routes::create_router;
pub use shard_client::{HttpShardClient, ShardClient, ShardError};
pub use state::AppState;
