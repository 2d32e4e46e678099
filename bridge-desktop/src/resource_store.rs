//! Durable response storage using SQLite
//!
//! Backs the offline cache on desktop. Every entry is written with a single
//! upsert inside a transaction, so readers observe either the previous entry
//! or the complete new one. Payloads carry a SHA-256 digest; an entry whose
//! body no longer matches its digest is treated as a miss and evicted.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{CachedResponse, ResourceBackend},
};
use bytes::Bytes;
use sha2::{Digest, Sha256};
use sqlx::{
    sqlite::{
        SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
    },
    Row,
};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// SQLite extended result code for `SQLITE_FULL`.
const SQLITE_FULL: &str = "13";

/// SQLite-backed [`ResourceBackend`].
pub struct SqliteResourceBackend {
    pool: SqlitePool,
}

impl SqliteResourceBackend {
    /// Open (or create) the cache database at `db_path`.
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to connect to DB: {}", e)))?;

        Self::create_schema(&pool).await?;
        debug!(path = ?db_path, "Initialized resource cache database");

        Ok(Self { pool })
    }

    /// Create an in-memory backend (for testing)
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to connect to DB: {}", e)))?;

        Self::create_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn create_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_namespaces (
                name TEXT PRIMARY KEY,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                status INTEGER NOT NULL,
                headers_json TEXT NOT NULL,
                body BLOB NOT NULL,
                content_hash TEXT NOT NULL,
                stored_at INTEGER NOT NULL,
                PRIMARY KEY (namespace, key)
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    fn digest(body: &[u8]) -> String {
        format!("{:x}", Sha256::digest(body))
    }

    async fn ensure_namespace<'e, E>(executor: E, namespace: &str, created_at: i64) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query("INSERT OR IGNORE INTO cache_namespaces (name, created_at) VALUES (?, ?)")
            .bind(namespace)
            .bind(created_at)
            .execute(executor)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

fn map_sqlx_error(error: sqlx::Error) -> BridgeError {
    match error {
        sqlx::Error::Io(io) => BridgeError::Io(io),
        sqlx::Error::Database(db) if db.code().as_deref() == Some(SQLITE_FULL) => {
            BridgeError::QuotaExceeded(db.message().to_string())
        }
        other => BridgeError::DatabaseError(other.to_string()),
    }
}

#[async_trait]
impl ResourceBackend for SqliteResourceBackend {
    async fn list_namespaces(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM cache_namespaces ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    async fn open_namespace(&self, namespace: &str) -> Result<()> {
        let now = now_millis();
        Self::ensure_namespace(&self.pool, namespace, now).await
    }

    async fn put(&self, namespace: &str, key: &str, response: CachedResponse) -> Result<()> {
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid headers: {}", e)))?;
        let content_hash = Self::digest(&response.body);

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        Self::ensure_namespace(&mut *tx, namespace, response.stored_at).await?;

        sqlx::query(
            r#"
            INSERT INTO cache_entries
                (namespace, key, status, headers_json, body, content_hash, stored_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(namespace, key) DO UPDATE SET
                status = excluded.status,
                headers_json = excluded.headers_json,
                body = excluded.body,
                content_hash = excluded.content_hash,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(namespace)
        .bind(key)
        .bind(response.status as i64)
        .bind(headers_json)
        .bind(response.body.as_ref())
        .bind(&content_hash)
        .bind(response.stored_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(
            namespace,
            key,
            size = response.body.len(),
            "Stored cache entry"
        );
        Ok(())
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<CachedResponse>> {
        let row = sqlx::query(
            r#"
            SELECT status, headers_json, body, content_hash, stored_at
            FROM cache_entries
            WHERE namespace = ? AND key = ?
            "#,
        )
        .bind(namespace)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status: i64 = row.get(0);
        let headers_json: String = row.get(1);
        let body: Vec<u8> = row.get(2);
        let content_hash: String = row.get(3);
        let stored_at: i64 = row.get(4);

        if Self::digest(&body) != content_hash {
            warn!(namespace, key, "Cache entry failed integrity check, evicting");
            self.delete(namespace, key).await?;
            return Ok(None);
        }

        let headers: HashMap<String, String> = serde_json::from_str(&headers_json)
            .map_err(|e| BridgeError::DatabaseError(format!("Corrupt headers for {}: {}", key, e)))?;

        Ok(Some(CachedResponse {
            status: u16::try_from(status).unwrap_or(200),
            headers,
            body: Bytes::from(body),
            stored_at,
        }))
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE namespace = ? AND key = ?")
            .bind(namespace)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM cache_entries WHERE namespace = ?")
            .bind(namespace)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let result = sqlx::query("DELETE FROM cache_namespaces WHERE name = ?")
            .bind(namespace)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        let existed = result.rows_affected() > 0;
        if existed {
            debug!(namespace, "Deleted cache namespace");
        }
        Ok(existed)
    }

    async fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM cache_entries WHERE namespace = ? ORDER BY key")
            .bind(namespace)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}
