//! Storage Abstractions
//!
//! Provides platform-agnostic traits for durable response storage (the
//! backing medium of the offline cache) and key-value settings storage.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;
use crate::http::HttpResponse;

/// A stored response: payload plus the metadata needed to replay it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// HTTP status code of the original response.
    pub status: u16,
    /// Response headers needed for replay (content type, length, ...).
    pub headers: HashMap<String, String>,
    /// Opaque payload.
    #[serde(with = "serde_bytes_compat")]
    pub body: Bytes,
    /// When the entry was written (Unix milliseconds).
    pub stored_at: i64,
}

impl CachedResponse {
    /// Capture a live response for storage.
    pub fn from_response(response: &HttpResponse, stored_at: i64) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
            stored_at,
        }
    }

    /// Rebuild a response that can be handed back to the caller.
    pub fn to_response(&self) -> HttpResponse {
        HttpResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }

    /// Payload size in bytes.
    pub fn size(&self) -> u64 {
        self.body.len() as u64
    }
}

mod serde_bytes_compat {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let raw: Vec<u8> = Vec::deserialize(deserializer)?;
        Ok(Bytes::from(raw))
    }
}

/// Durable, namespaced response storage.
///
/// A namespace is one named generation of the cache (e.g. `app-shell-v4`).
/// Implementations must make every mutation durable across process restarts
/// and atomic per key: a reader observes either the previous entry or the
/// complete new one, never a partial write.
///
/// Abstracts the platform medium:
/// - Desktop: SQLite
/// - Web: Cache Storage API / IndexedDB
/// - Tests: in-memory maps
#[async_trait]
pub trait ResourceBackend: Send + Sync {
    /// List every namespace currently present.
    async fn list_namespaces(&self) -> Result<Vec<String>>;

    /// Create a namespace if it does not exist yet.
    async fn open_namespace(&self, namespace: &str) -> Result<()>;

    /// Store `response` under `key` in `namespace`, replacing any previous
    /// entry. Creates the namespace when missing.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::QuotaExceeded`](crate::error::BridgeError::QuotaExceeded)
    /// or an I/O/database error when the medium rejects the write.
    async fn put(&self, namespace: &str, key: &str, response: CachedResponse) -> Result<()>;

    /// Look up `key` in a single namespace.
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<CachedResponse>>;

    /// Remove `key` from a single namespace. Returns whether it existed.
    async fn delete(&self, namespace: &str, key: &str) -> Result<bool>;

    /// Remove a namespace and all of its entries. Returns whether it existed.
    async fn delete_namespace(&self, namespace: &str) -> Result<bool>;

    /// List the keys stored in a namespace.
    async fn keys(&self, namespace: &str) -> Result<Vec<String>>;
}

/// Key-value settings storage trait
///
/// Abstracts platform-specific preferences storage:
/// - Desktop: SQLite-backed key-value table
/// - Web: localStorage
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn save_preference(store: &dyn SettingsStore) -> Result<()> {
///     store.set_bool("darkMode", true).await?;
///     store.set_f64("playbackRate", 1.25).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store a boolean value
    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Retrieve a boolean value
    async fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Store an integer value
    async fn set_i64(&self, key: &str, value: i64) -> Result<()>;

    /// Retrieve an integer value
    async fn get_i64(&self, key: &str) -> Result<Option<i64>>;

    /// Store a floating-point value
    async fn set_f64(&self, key: &str, value: f64) -> Result<()>;

    /// Retrieve a floating-point value
    async fn get_f64(&self, key: &str) -> Result<Option<f64>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool>;

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Clear all settings
    async fn clear_all(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_response_replays_original() {
        let live = HttpResponse::new(200, "body").with_header("Content-Type", "text/plain");
        let stored = CachedResponse::from_response(&live, 1_700_000_000_000);

        assert_eq!(stored.size(), 4);
        assert_eq!(stored.stored_at, 1_700_000_000_000);
        assert_eq!(stored.to_response(), live);
    }

    #[test]
    fn test_cached_response_serde() {
        let stored = CachedResponse::from_response(&HttpResponse::new(200, vec![0u8, 159, 146]), 7);
        let json = serde_json::to_string(&stored).unwrap();
        let back: CachedResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stored);
    }
}
