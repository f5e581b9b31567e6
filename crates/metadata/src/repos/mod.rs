//! Repository traits for metadata operations.

pub mod cache_entries;
pub mod descriptors;
pub mod shard_nodes;

pub use cache_entries::CacheEntryRepo;
pub use descriptors::DescriptorRepo;
pub use shard_nodes::ShardNodeRepo;
