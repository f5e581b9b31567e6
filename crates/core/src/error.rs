//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid file id: {0}")]
    InvalidFileId(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("file is empty")]
    EmptyContent,

    #[error("no shard nodes available")]
    NoShards,

    #[error("duplicate shard id {0}")]
    DuplicateShard(i64),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
