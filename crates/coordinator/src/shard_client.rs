//! Outbound channel from the coordinator to one shard node.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use strata_core::{FileId, REQUEST_ID_HEADER, ShardId};
use strata_metadata::models::ShardNodeRow;
use thiserror::Error;

use crate::error::{CoordinatorError, CoordinatorResult};
use crate::request_id::current_request_id;

/// Shard call failures.
#[derive(Debug, Error)]
pub enum ShardError {
    #[error("fragment not found on {address}")]
    NotFound { address: String },

    #[error("request to {address} timed out")]
    Timeout { address: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("node rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid shard node address: {0}")]
    InvalidAddress(String),
}

/// Send and receive primitives against a single shard node.
///
/// Implementations must be safe to call concurrently; the coordinator issues
/// one call per node in parallel during fan-out.
#[async_trait]
pub trait ShardClient: Send + Sync {
    fn shard_id(&self) -> ShardId;

    fn address(&self) -> &str;

    /// Store `data` as the fragment for `id`, replacing any previous one.
    async fn put_fragment(&self, id: FileId, data: Bytes) -> Result<(), ShardError>;

    /// Fetch the fragment for `id`.
    async fn get_fragment(&self, id: FileId) -> Result<Bytes, ShardError>;
}

/// Shard client speaking the node's HTTP API.
pub struct HttpShardClient {
    shard_id: ShardId,
    address: String,
    http: reqwest::Client,
}

impl HttpShardClient {
    /// Create a client with its own connection pool and per-call `timeout`.
    pub fn new(
        shard_id: ShardId,
        address: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ShardError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ShardError::Network(format!("failed to build HTTP client: {e}")))?;
        Self::with_client(shard_id, address, http)
    }

    /// Create a client that shares an existing `reqwest::Client`.
    pub fn with_client(
        shard_id: ShardId,
        address: impl Into<String>,
        http: reqwest::Client,
    ) -> Result<Self, ShardError> {
        let address = address.into().trim_end_matches('/').to_string();
        if !(address.starts_with("http://") || address.starts_with("https://")) {
            return Err(ShardError::InvalidAddress(address));
        }
        Ok(Self {
            shard_id,
            address,
            http,
        })
    }

    fn map_error(&self, e: reqwest::Error) -> ShardError {
        if e.is_timeout() {
            ShardError::Timeout {
                address: self.address.clone(),
            }
        } else {
            ShardError::Network(format!("{}: {e}", self.address))
        }
    }

    fn with_request_id(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match current_request_id() {
            Some(id) => builder.header(REQUEST_ID_HEADER, id.as_str()),
            None => builder,
        }
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ShardError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ShardError::NotFound {
                address: self.address.clone(),
            });
        }
        let body = response.text().await.unwrap_or_default();
        Err(ShardError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ShardClient for HttpShardClient {
    fn shard_id(&self) -> ShardId {
        self.shard_id
    }

    fn address(&self) -> &str {
        &self.address
    }

    #[tracing::instrument(skip(self, data), fields(shard_id = self.shard_id, size = data.len()))]
    async fn put_fragment(&self, id: FileId, data: Bytes) -> Result<(), ShardError> {
        let length = data.len() as u64;
        let file = Part::stream_with_length(data, length)
            .file_name(id.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| self.map_error(e))?;
        let form = Form::new().text("id", id.to_string()).part("file", file);

        let url = format!("{}/api/filepart", self.address);
        let response = self
            .with_request_id(self.http.put(url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;
        self.check_status(response).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(shard_id = self.shard_id))]
    async fn get_fragment(&self, id: FileId) -> Result<Bytes, ShardError> {
        let url = format!("{}/api/filepart/{id}", self.address);
        let response = self
            .with_request_id(self.http.get(url))
            .send()
            .await
            .map_err(|e| self.map_error(e))?;
        let response = self.check_status(response).await?;
        response.bytes().await.map_err(|e| self.map_error(e))
    }
}

/// Build one HTTP client per registered node, sharing a connection pool.
pub fn build_clients(
    nodes: &[ShardNodeRow],
    timeout: Duration,
) -> CoordinatorResult<Vec<Arc<dyn ShardClient>>> {
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CoordinatorError::Internal(format!("failed to build HTTP client: {e}")))?;

    nodes
        .iter()
        .map(|node| {
            HttpShardClient::with_client(node.node_id, node.address.clone(), http.clone())
                .map(|client| Arc::new(client) as Arc<dyn ShardClient>)
                .map_err(|source| CoordinatorError::Shard {
                    shard_id: node.node_id,
                    source,
                })
        })
        .collect()
}

/// Index clients by shard id, rejecting duplicates.
pub(crate) fn index_clients(
    clients: Vec<Arc<dyn ShardClient>>,
) -> CoordinatorResult<BTreeMap<ShardId, Arc<dyn ShardClient>>> {
    let mut indexed = BTreeMap::new();
    for client in clients {
        let shard_id = client.shard_id();
        if indexed.insert(shard_id, client).is_some() {
            return Err(CoordinatorError::Validation(format!(
                "shard {shard_id} registered twice"
            )));
        }
    }
    Ok(indexed)
}
