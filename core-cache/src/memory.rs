//! In-process [`ResourceBackend`] for tests and ephemeral hosts.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::storage::{CachedResponse, ResourceBackend};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Namespaced response storage held in memory.
///
/// Nothing survives the process. An optional byte quota makes writes fail
/// with [`BridgeError::QuotaExceeded`] the way a full disk would.
#[derive(Debug, Default)]
pub struct MemoryResourceBackend {
    namespaces: RwLock<BTreeMap<String, HashMap<String, CachedResponse>>>,
    quota_bytes: Option<u64>,
}

impl MemoryResourceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes that would grow total body size past `bytes`.
    pub fn with_quota(mut self, bytes: u64) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    /// Total stored body size across all namespaces.
    pub fn used_bytes(&self) -> u64 {
        self.namespaces
            .read()
            .values()
            .flat_map(|entries| entries.values())
            .map(CachedResponse::size)
            .sum()
    }
}

#[async_trait]
impl ResourceBackend for MemoryResourceBackend {
    async fn list_namespaces(&self) -> Result<Vec<String>> {
        Ok(self.namespaces.read().keys().cloned().collect())
    }

    async fn open_namespace(&self, namespace: &str) -> Result<()> {
        self.namespaces
            .write()
            .entry(namespace.to_string())
            .or_default();
        Ok(())
    }

    async fn put(&self, namespace: &str, key: &str, response: CachedResponse) -> Result<()> {
        let mut namespaces = self.namespaces.write();

        if let Some(quota) = self.quota_bytes {
            let replaced = namespaces
                .get(namespace)
                .and_then(|entries| entries.get(key))
                .map(CachedResponse::size)
                .unwrap_or(0);
            let used: u64 = namespaces
                .values()
                .flat_map(|entries| entries.values())
                .map(CachedResponse::size)
                .sum();
            if used - replaced + response.size() > quota {
                return Err(BridgeError::QuotaExceeded(format!(
                    "{} bytes for {} would exceed quota of {} bytes",
                    response.size(),
                    key,
                    quota
                )));
            }
        }

        namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), response);
        Ok(())
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<CachedResponse>> {
        Ok(self
            .namespaces
            .read()
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<bool> {
        Ok(self
            .namespaces
            .write()
            .get_mut(namespace)
            .map(|entries| entries.remove(key).is_some())
            .unwrap_or(false))
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<bool> {
        Ok(self.namespaces.write().remove(namespace).is_some())
    }

    async fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        Ok(self
            .namespaces
            .read()
            .get(namespace)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::collections::HashMap;

    fn entry(body: &'static [u8]) -> CachedResponse {
        CachedResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from_static(body),
            stored_at: 0,
        }
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let backend = MemoryResourceBackend::new();
        backend.put("media-v1", "k", entry(b"abc")).await.unwrap();

        assert_eq!(
            backend.get("media-v1", "k").await.unwrap().unwrap().body,
            Bytes::from_static(b"abc")
        );
        assert!(backend.get("app-shell-v4", "k").await.unwrap().is_none());
        assert!(backend.delete("media-v1", "k").await.unwrap());
        assert!(!backend.delete("media-v1", "k").await.unwrap());
        assert_eq!(backend.list_namespaces().await.unwrap(), vec!["media-v1"]);
    }

    #[tokio::test]
    async fn test_quota_counts_replaced_entries() {
        let backend = MemoryResourceBackend::new().with_quota(4);
        backend.put("media-v1", "a", entry(b"1234")).await.unwrap();
        backend.put("media-v1", "a", entry(b"abcd")).await.unwrap();

        let err = backend.put("media-v1", "b", entry(b"x")).await.unwrap_err();
        assert!(matches!(err, BridgeError::QuotaExceeded(_)));
        assert_eq!(backend.used_bytes(), 4);
    }
}
