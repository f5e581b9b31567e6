//! Shard node service for strata.
//!
//! A shard node is a passthrough key/value store: it holds exactly one
//! fragment per file id and serves it back on request. It keeps no
//! replication, integrity or garbage-collection state of its own.

pub mod error;
pub mod fragments;
pub mod handlers;
pub mod request_id;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use fragments::FragmentStore;
pub use routes::create_router;
pub use state::NodeState;
