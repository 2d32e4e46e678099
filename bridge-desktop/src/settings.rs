//! Preference storage using SQLite
//!
//! One row per preference key. Each row remembers the kind of value it holds
//! so a flag written with `set_bool` is never read back through `get_string`.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SettingsStore,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS preferences (
        key TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        value TEXT NOT NULL,
        written_at INTEGER NOT NULL
    )
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Text,
    Flag,
    Integer,
    Real,
}

impl ValueKind {
    fn as_str(self) -> &'static str {
        match self {
            ValueKind::Text => "text",
            ValueKind::Flag => "flag",
            ValueKind::Integer => "integer",
            ValueKind::Real => "real",
        }
    }
}

fn db_error(action: &str, e: sqlx::Error) -> BridgeError {
    BridgeError::DatabaseError(format!("Failed to {}: {}", action, e))
}

/// SQLite-backed [`SettingsStore`].
///
/// Writes are single-statement upserts, so each key changes atomically.
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    /// Opens (or creates) the preference database at `db_path`.
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| db_error("open preferences", e))?;

        Self::migrate(&pool).await?;
        debug!(path = ?db_path, "Opened preference store");
        Ok(Self { pool })
    }

    /// Volatile store for tests and ephemeral sessions.
    pub async fn in_memory() -> Result<Self> {
        // A second connection would open a second, empty in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| db_error("open preferences", e))?;

        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(pool)
            .await
            .map_err(|e| db_error("create preference table", e))?;
        Ok(())
    }

    fn unix_now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as i64)
            .unwrap_or_default()
    }

    async fn write(&self, key: &str, kind: ValueKind, value: impl Display) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO preferences (key, kind, value, written_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                kind = excluded.kind,
                value = excluded.value,
                written_at = excluded.written_at
            "#,
        )
        .bind(key)
        .bind(kind.as_str())
        .bind(value.to_string())
        .bind(Self::unix_now())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("write preference", e))?;

        debug!(key, kind = kind.as_str(), "Preference written");
        Ok(())
    }

    async fn read<T>(&self, key: &str, kind: ValueKind) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        let row = sqlx::query("SELECT kind, value FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("read preference", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let stored: String = row.get("kind");
        if stored != kind.as_str() {
            warn!(key, expected = kind.as_str(), stored = %stored, "Preference kind mismatch");
            return Err(BridgeError::OperationFailed(format!(
                "Preference '{}' holds a {} value, not {}",
                key,
                stored,
                kind.as_str()
            )));
        }

        let raw: String = row.get("value");
        raw.parse().map(Some).map_err(|e: T::Err| {
            BridgeError::OperationFailed(format!("Preference '{}' is unreadable: {}", key, e))
        })
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.write(key, ValueKind::Text, value).await
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.read(key, ValueKind::Text).await
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.write(key, ValueKind::Flag, value).await
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        self.read(key, ValueKind::Flag).await
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.write(key, ValueKind::Integer, value).await
    }

    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        self.read(key, ValueKind::Integer).await
    }

    async fn set_f64(&self, key: &str, value: f64) -> Result<()> {
        self.write(key, ValueKind::Real, value).await
    }

    async fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        self.read(key, ValueKind::Real).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM preferences WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete preference", e))?;

        debug!(key, "Preference deleted");
        Ok(())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("look up preference", e))?;
        Ok(row.is_some())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM preferences ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list preferences", e))?;
        Ok(rows.into_iter().map(|row| row.get("key")).collect())
    }

    async fn clear_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM preferences")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("clear preferences", e))?;

        debug!("All preferences cleared");
        Ok(())
    }
}
