//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{CacheEntryRepo, DescriptorRepo, ShardNodeRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: DescriptorRepo + CacheEntryRepo + ShardNodeRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `path` and apply the schema.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        // One connection: SQLite serializes writers anyway, and a single
        // connection keeps ":memory:" databases shared across queries.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use strata_core::ShardId;
    use time::{OffsetDateTime, UtcOffset};
    use uuid::Uuid;

    /// Timestamps are stored as RFC 3339 text and compared as strings, so they
    /// must share one offset and one precision.
    fn db_time(t: OffsetDateTime) -> OffsetDateTime {
        let t = t.to_offset(UtcOffset::UTC);
        t.replace_nanosecond(0).unwrap_or(t)
    }

    #[async_trait]
    impl DescriptorRepo for SqliteStore {
        async fn get_descriptor(&self, file_id: Uuid) -> MetadataResult<Option<FileDescriptorRow>> {
            let row = sqlx::query_as::<_, FileDescriptorRow>(
                "SELECT * FROM file_descriptors WHERE file_id = ?",
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
                ) VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(checksum) DO UPDATE SET
                    file_name = excluded.file_name,
                    content_type = excluded.content_type,
                    shard_ids = excluded.shard_ids
                RETURNING file_id
                "#,
            )
            .bind(descriptor.file_id)
            .bind(&descriptor.checksum)
            .bind(&descriptor.file_name)
            .bind(&descriptor.content_type)
            .bind(&descriptor.shard_ids)
            .bind(db_time(descriptor.created_at))
            .fetch_one(&self.pool)
            .await?;
            Ok(file_id)
        }

        async fn delete_descriptor(&self, file_id: Uuid) -> MetadataResult<bool> {
            let result = sqlx::query("DELETE FROM file_descriptors WHERE file_id = ?")
                .bind(file_id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        }
    }

    #[async_trait]
    impl CacheEntryRepo for SqliteStore {
        async fn get_cache_entry(&self, checksum: &str) -> MetadataResult<Option<CacheEntryRow>> {
            let row = sqlx::query_as::<_, CacheEntryRow>(
                "SELECT checksum, local_name, expires_at FROM cache_entries WHERE checksum = ?",
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
                VALUES (?, ?, ?)
                ON CONFLICT(checksum) DO UPDATE SET
                    local_name = excluded.local_name,
                    expires_at = excluded.expires_at
                "#,
            )
            .bind(&entry.checksum)
            .bind(&entry.local_name)
            .bind(db_time(entry.expires_at))
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
                WHERE expires_at <= ?
                ORDER BY expires_at
                "#,
            )
            .bind(db_time(cutoff))
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn delete_cache_entries(
            &self,
            entries: &[CacheEntryRow],
            cutoff: OffsetDateTime,
        ) -> MetadataResult<Vec<CacheEntryRow>> {
            let cutoff = db_time(cutoff);
            let mut removed = Vec::with_capacity(entries.len());
            let mut tx = self.pool.begin().await?;
            for entry in entries {
                let result =
                    sqlx::query("DELETE FROM cache_entries WHERE checksum = ? AND expires_at <= ?")
                        .bind(&entry.checksum)
                        .bind(cutoff)
                        .execute(&mut *tx)
                        .await?;
                if result.rows_affected() > 0 {
                    removed.push(entry.clone());
                }
            }
            tx.commit().await?;
            Ok(removed)
        }
    }

    #[async_trait]
    impl ShardNodeRepo for SqliteStore {
        async fn list_active_shard_nodes(&self) -> MetadataResult<Vec<ShardNodeRow>> {
            let rows = sqlx::query_as::<_, ShardNodeRow>(
                "SELECT * FROM shard_nodes WHERE active = 1 ORDER BY node_id",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn register_shard_node(&self, node: &ShardNodeRow) -> MetadataResult<()> {
            sqlx::query(
                r#"
                INSERT INTO shard_nodes (node_id, address, active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(node_id) DO UPDATE SET
                    address = excluded.address,
                    active = excluded.active,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(node.node_id)
            .bind(&node.address)
            .bind(node.active)
            .bind(db_time(node.created_at))
            .bind(db_time(node.updated_at))
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn set_shard_node_active(
            &self,
            node_id: ShardId,
            active: bool,
        ) -> MetadataResult<()> {
            let result =
                sqlx::query("UPDATE shard_nodes SET active = ?, updated_at = ? WHERE node_id = ?")
                    .bind(active)
                    .bind(db_time(OffsetDateTime::now_utc()))
                    .bind(node_id)
                    .execute(&self.pool)
                    .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!("shard node {node_id}")));
            }
            Ok(())
        }
    }
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS file_descriptors (
    file_id BLOB PRIMARY KEY,
    checksum TEXT NOT NULL UNIQUE,
    file_name TEXT NOT NULL,
    content_type TEXT NOT NULL,
    shard_ids TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cache_entries (
    checksum TEXT PRIMARY KEY,
    local_name TEXT NOT NULL,
    expires_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_cache_entries_expires ON cache_entries(expires_at);

CREATE TABLE IF NOT EXISTS shard_nodes (
    node_id INTEGER PRIMARY KEY,
    address TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_shard_nodes_active ON shard_nodes(active, node_id);
"#;
