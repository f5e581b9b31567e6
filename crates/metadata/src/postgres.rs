//! PostgreSQL-based metadata store implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::*;
use crate::repos::{CacheEntryRepo, DescriptorRepo, ShardNodeRepo};
use crate::store::MetadataStore;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode as SqlxPgSslMode};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use strata_core::ShardId;
use strata_core::config::PgSslMode;
use time::OffsetDateTime;
use uuid::Uuid;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

/// Split the schema into executable statements, dropping comment-only fragments.
fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .map(str::trim)
        .filter(|statement| {
            statement
                .lines()
                .any(|line| !line.trim().is_empty() && !line.trim().starts_with("--"))
        })
        .collect()
}

/// PostgreSQL-based metadata store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Connect using a full connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Connect using individual parameters, so the password can come from its
    /// own environment variable.
    #[allow(clippy::too_many_arguments)]
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        ssl_mode: Option<PgSslMode>,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }
        if let Some(pass) = password {
            opts = opts.password(pass);
        }
        if let Some(mode) = ssl_mode {
            opts = opts.ssl_mode(match mode {
                PgSslMode::Disable => SqlxPgSslMode::Disable,
                PgSslMode::Prefer => SqlxPgSslMode::Prefer,
                PgSslMode::Require => SqlxPgSslMode::Require,
            });
        }

        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            ssl_mode = ?ssl_mode,
            "Connecting to PostgreSQL"
        );

        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    async fn connect(
        mut opts: PgConnectOptions,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{timeout_ms}ms"))]);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for PostgresStore {
    async fn migrate(&self) -> MetadataResult<()> {
        // Prepared statements cannot hold more than one command.
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl DescriptorRepo for PostgresStore {
    async fn get_descriptor(&self, file_id: Uuid) -> MetadataResult<Option<FileDescriptorRow>> {
        let row = sqlx::query_as::<_, FileDescriptorRow>(
            "SELECT * FROM file_descriptors WHERE file_id = $1",
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert_descriptor(&self, descriptor: &FileDescriptorRow) -> MetadataResult<Uuid> {
        let file_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO file_descriptors (
                file_id, checksum, file_name, content_type, shard_ids, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (checksum) DO UPDATE SET
                file_name = EXCLUDED.file_name,
                content_type = EXCLUDED.content_type,
                shard_ids = EXCLUDED.shard_ids
            RETURNING file_id
            "#,
        )
        .bind(descriptor.file_id)
        .bind(&descriptor.checksum)
        .bind(&descriptor.file_name)
        .bind(&descriptor.content_type)
        .bind(&descriptor.shard_ids)
        .bind(descriptor.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(file_id)
    }

    async fn delete_descriptor(&self, file_id: Uuid) -> MetadataResult<bool> {
        let result = sqlx::query("DELETE FROM file_descriptors WHERE file_id = $1")
            .bind(file_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CacheEntryRepo for PostgresStore {
    async fn get_cache_entry(&self, checksum: &str) -> MetadataResult<Option<CacheEntryRow>> {
        let row = sqlx::query_as::<_, CacheEntryRow>(
            "SELECT checksum, local_name, expires_at FROM cache_entries WHERE checksum = $1",
        )
        .bind(checksum)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert_cache_entry(&self, entry: &CacheEntryRow) -> MetadataResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cache_entries (checksum, local_name, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (checksum) DO UPDATE SET
                local_name = EXCLUDED.local_name,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&entry.checksum)
        .bind(&entry.local_name)
        .bind(entry.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_expired_cache_entries(
        &self,
        cutoff: OffsetDateTime,
    ) -> MetadataResult<Vec<CacheEntryRow>> {
        let rows = sqlx::query_as::<_, CacheEntryRow>(
            r#"
            SELECT checksum, local_name, expires_at FROM cache_entries
            WHERE expires_at <= $1
            ORDER BY expires_at
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_cache_entries(
        &self,
        entries: &[CacheEntryRow],
        cutoff: OffsetDateTime,
    ) -> MetadataResult<Vec<CacheEntryRow>> {
        let checksums: Vec<&str> = entries.iter().map(|e| e.checksum.as_str()).collect();
        let deleted: Vec<String> = sqlx::query_scalar(
            r#"
            DELETE FROM cache_entries
            WHERE checksum = ANY($1) AND expires_at <= $2
            RETURNING checksum
            "#,
        )
        .bind(&checksums)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries
            .iter()
            .filter(|e| deleted.contains(&e.checksum))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ShardNodeRepo for PostgresStore {
    async fn list_active_shard_nodes(&self) -> MetadataResult<Vec<ShardNodeRow>> {
        let rows = sqlx::query_as::<_, ShardNodeRow>(
            "SELECT * FROM shard_nodes WHERE active = TRUE ORDER BY node_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn register_shard_node(&self, node: &ShardNodeRow) -> MetadataResult<()> {
        sqlx::query(
            r#"
            INSERT INTO shard_nodes (node_id, address, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (node_id) DO UPDATE SET
                address = EXCLUDED.address,
                active = EXCLUDED.active,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(node.node_id)
        .bind(&node.address)
        .bind(node.active)
        .bind(node.created_at)
        .bind(node.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_shard_node_active(&self, node_id: ShardId, active: bool) -> MetadataResult<()> {
        let result =
            sqlx::query("UPDATE shard_nodes SET active = $1, updated_at = $2 WHERE node_id = $3")
                .bind(active)
                .bind(OffsetDateTime::now_utc())
                .bind(node_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(MetadataError::NotFound(format!("shard node {node_id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_skip_comment_only_fragments() {
        let statements = postgres_schema_statements(POSTGRES_SCHEMA);
        assert_eq!(statements.len(), 5);
        assert!(
            statements
                .iter()
                .all(|s| s.contains("CREATE TABLE") || s.contains("CREATE INDEX"))
        );
    }
}
