//! Core domain types and shared logic for the strata sharded object store.
//!
//! This crate defines the data model used by every other crate:
//! - File identifiers and content hashes
//! - The split/merge protocol that turns a file into shard fragments and back
//! - Configuration for the coordinator and shard node services

pub mod config;
pub mod error;
pub mod file_id;
pub mod hash;
pub mod request_id;
pub mod shard;

pub use error::{Error, Result};
pub use file_id::FileId;
pub use hash::{ContentHash, ContentHasher};
pub use request_id::{REQUEST_ID_HEADER, RequestId};
pub use shard::{Shard, ShardId, merge, split};

/// Default cache entry lifetime: 3 minutes
pub const DEFAULT_CACHE_TTL_SECS: u64 = 180;

/// Default interval between cache eviction sweeps: 3 minutes
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 180;

/// Default per-call timeout for shard node requests
pub const DEFAULT_SHARD_TIMEOUT_SECS: u64 = 10;

/// Default maximum accepted upload body: 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
