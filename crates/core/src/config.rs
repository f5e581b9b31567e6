//! Configuration types shared across crates.
//!
//! Both services load these through figment (TOML file merged with
//! prefixed environment variables), so every field carries a serde default
//! and a partially specified file is always valid input.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// HTTP server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted upload in bytes. A shard node applies it to the
    /// fragment payload and allows multipart framing on top.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Enable request tracing (request ids and per-request spans).
    #[serde(default)]
    pub enable_tracing: bool,
    /// Service name recorded on request spans.
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Enable the /metrics endpoint for Prometheus scraping.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_node_bind() -> String {
    "127.0.0.1:9000".to_string()
}

fn default_max_upload_bytes() -> usize {
    crate::DEFAULT_MAX_UPLOAD_BYTES
}

fn default_service_name() -> String {
    "strata".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
            enable_tracing: false,
            service_name: default_service_name(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl ServerConfig {
    fn default_for_node() -> Self {
        Self {
            bind: default_node_bind(),
            service_name: "strata-node".to_string(),
            ..Self::default()
        }
    }

    /// Validate server configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.bind.trim().is_empty() {
            return Err("server.bind must not be empty".to_string());
        }
        if self.max_upload_bytes == 0 {
            return Err("server.max_upload_bytes must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for storage.
        path: PathBuf,
    },
    /// In-process memory storage. Contents are lost on restart.
    Memory,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/fragments"),
        }
    }
}

/// PostgreSQL SSL mode configuration.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PgSslMode {
    Disable,
    #[default]
    Prefer,
    Require,
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database (single coordinator deployments and tests).
    Sqlite {
        /// Database file path.
        path: PathBuf,
    },
    /// PostgreSQL database.
    Postgres {
        /// Connection URL. Takes precedence over individual fields.
        url: Option<String>,
        host: Option<String>,
        #[serde(default = "default_pg_port")]
        port: Option<u16>,
        username: Option<String>,
        /// Prefer STRATA_METADATA__PASSWORD over storing this in a file.
        password: Option<String>,
        database: Option<String>,
        ssl_mode: Option<PgSslMode>,
        /// Maximum connections in the pool.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
        /// Statement timeout in milliseconds.
        #[serde(default)]
        statement_timeout_ms: Option<u64>,
    },
}

fn default_max_connections() -> u32 {
    10
}

fn default_pg_port() -> Option<u16> {
    Some(5432)
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/metadata.db"),
        }
    }
}

impl MetadataConfig {
    /// Validate metadata configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            MetadataConfig::Sqlite { .. } => Ok(()),
            MetadataConfig::Postgres {
                url,
                host,
                database,
                ..
            } => match (url.as_ref(), host.as_ref(), database.as_ref()) {
                (Some(_), _, _) | (None, Some(_), Some(_)) => Ok(()),
                (None, None, _) => Err(
                    "postgres config requires either 'url' or 'host' + 'database'".to_string(),
                ),
                (None, Some(_), None) => Err(
                    "postgres config requires 'database' when using individual fields".to_string(),
                ),
            },
        }
    }
}

/// Local staging area that holds uploaded files and backs the cache.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StagingConfig {
    #[serde(default = "default_staging_path")]
    pub path: PathBuf,
}

fn default_staging_path() -> PathBuf {
    PathBuf::from("./cache")
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            path: default_staging_path(),
        }
    }
}

/// Cache lifetime and eviction schedule.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long an uploaded file stays servable from the staging area.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    /// Interval between eviction sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_cache_ttl_secs() -> u64 {
    crate::DEFAULT_CACHE_TTL_SECS
}

fn default_sweep_interval_secs() -> u64 {
    crate::DEFAULT_SWEEP_INTERVAL_SECS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sweep_interval_secs == 0 {
            return Err("cache.sweep_interval_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Outbound shard client settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShardClientConfig {
    /// Per-call timeout for shard node requests.
    #[serde(default = "default_shard_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_shard_timeout_secs() -> u64 {
    crate::DEFAULT_SHARD_TIMEOUT_SECS
}

impl Default for ShardClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_shard_timeout_secs(),
        }
    }
}

impl ShardClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("shard_client.timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// A shard node registered into the node registry at coordinator startup.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShardNodeEntry {
    pub id: i64,
    /// Base URL of the node, e.g. "http://10.0.0.5:9000".
    pub address: String,
    #[serde(default = "default_node_active")]
    pub active: bool,
}

fn default_node_active() -> bool {
    true
}

impl ShardNodeEntry {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.address.starts_with("http://") || self.address.starts_with("https://")) {
            return Err(format!(
                "shard node {} address must be an http(s) URL, got {:?}",
                self.id, self.address
            ));
        }
        Ok(())
    }
}

/// Coordinator service configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub shard_client: ShardClientConfig,
    /// Nodes to upsert into the registry on startup.
    #[serde(default)]
    pub shard_nodes: Vec<ShardNodeEntry>,
}

impl CoordinatorConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig {
                bind: "127.0.0.1:0".to_string(),
                ..ServerConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validate every section, returning the first violation.
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.metadata.validate()?;
        self.cache.validate()?;
        self.shard_client.validate()?;

        let mut seen = std::collections::HashSet::new();
        for node in &self.shard_nodes {
            node.validate()?;
            if !seen.insert(node.id) {
                return Err(format!("shard node id {} is configured twice", node.id));
            }
        }
        Ok(())
    }
}

/// Shard node service configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "ServerConfig::default_for_node")]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default_for_node(),
            storage: StorageConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Create a test configuration backed by memory storage.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig {
                bind: "127.0.0.1:0".to_string(),
                ..ServerConfig::default_for_node()
            },
            storage: StorageConfig::Memory,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Figment;
    use figment::providers::{Env, Format, Toml};

    #[test]
    fn test_coordinator_defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.cache.ttl(), Duration::from_secs(180));
        assert_eq!(config.cache.sweep_interval(), Duration::from_secs(180));
        assert_eq!(config.shard_client.timeout(), Duration::from_secs(10));
        assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.staging.path, PathBuf::from("./cache"));
        assert!(config.shard_nodes.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_node_defaults_bind_differs_from_coordinator() {
        let node = NodeConfig::default();
        assert_ne!(node.server.bind, ServerConfig::default().bind);
        assert_eq!(node.server.service_name, "strata-node");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml = r#"
            [cache]
            ttl_secs = 30

            [metadata]
            type = "sqlite"
            path = "/tmp/strata.db"

            [[shard_nodes]]
            id = 1
            address = "http://127.0.0.1:9001"

            [[shard_nodes]]
            id = 2
            address = "http://127.0.0.1:9002"
            active = false
        "#;

        let config: CoordinatorConfig = Figment::new().merge(Toml::string(toml)).extract().unwrap();
        assert_eq!(config.cache.ttl_secs, 30);
        assert_eq!(config.cache.sweep_interval_secs, 180);
        assert_eq!(config.shard_nodes.len(), 2);
        assert!(config.shard_nodes[0].active);
        assert!(!config.shard_nodes[1].active);
        config.validate().unwrap();
    }

    #[test]
    fn test_env_overrides_nested_fields() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("STRATA_SERVER__BIND", "0.0.0.0:7000");
            jail.set_env("STRATA_SHARD_CLIENT__TIMEOUT_SECS", "3");

            let config: CoordinatorConfig = Figment::new()
                .merge(Env::prefixed("STRATA_").split("__"))
                .extract()?;
            assert_eq!(config.server.bind, "0.0.0.0:7000");
            assert_eq!(config.shard_client.timeout_secs, 3);
            Ok(())
        });
    }

    #[test]
    fn test_validate_rejects_duplicate_node_ids() {
        let mut config = CoordinatorConfig::for_testing();
        config.shard_nodes = vec![
            ShardNodeEntry {
                id: 1,
                address: "http://a:1".to_string(),
                active: true,
            },
            ShardNodeEntry {
                id: 1,
                address: "http://b:1".to_string(),
                active: true,
            },
        ];
        assert!(config.validate().unwrap_err().contains("configured twice"));
    }

    #[test]
    fn test_validate_rejects_non_http_address() {
        let entry = ShardNodeEntry {
            id: 4,
            address: "10.0.0.1:9000".to_string(),
            active: true,
        };
        assert!(entry.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_intervals() {
        let mut config = CoordinatorConfig::for_testing();
        config.cache.sweep_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = CoordinatorConfig::for_testing();
        config.shard_client.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_storage_config_memory_roundtrip() {
        let json = serde_json::to_string(&StorageConfig::Memory).unwrap();
        assert_eq!(json, r#"{"type":"memory"}"#);
        let decoded: StorageConfig = serde_json::from_str(&json).unwrap();
        assert!(matches!(decoded, StorageConfig::Memory));
    }

    #[test]
    fn test_postgres_config_requires_database_with_host() {
        let config = MetadataConfig::Postgres {
            url: None,
            host: Some("db".to_string()),
            port: None,
            username: None,
            password: None,
            database: None,
            ssl_mode: None,
            max_connections: 5,
            statement_timeout_ms: None,
        };
        assert!(config.validate().is_err());
    }
}
