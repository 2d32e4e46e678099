//! # Resource Cache Store
//!
//! Namespaced, durable storage of replayable responses. Each namespace is one
//! generation of one logical store (`app-shell-v4`, `media-v1`). Lookups
//! consult the current namespaces first and then any namespace still retained
//! from an earlier generation; [`ResourceCacheStore::rotate`] drops the
//! latter once a new generation activates.

use crate::error::{CacheError, Result};
use bridge_traits::http::HttpResponse;
use bridge_traits::storage::{CachedResponse, ResourceBackend};
use bridge_traits::time::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ResourceCacheStore {
    backend: Arc<dyn ResourceBackend>,
    clock: Arc<dyn Clock>,
    current: Vec<String>,
}

impl ResourceCacheStore {
    /// `current` lists the namespaces consulted first on lookups.
    pub fn new(
        backend: Arc<dyn ResourceBackend>,
        clock: Arc<dyn Clock>,
        current: Vec<String>,
    ) -> Self {
        Self {
            backend,
            clock,
            current,
        }
    }

    pub fn current_namespaces(&self) -> &[String] {
        &self.current
    }

    /// Creates `namespace` if it does not exist yet.
    pub async fn open(&self, namespace: &str) -> Result<()> {
        self.backend
            .open_namespace(namespace)
            .await
            .map_err(CacheError::storage)
    }

    /// Stores `response` under `key`, replacing any previous entry.
    pub async fn put(&self, namespace: &str, key: &str, response: &HttpResponse) -> Result<()> {
        let entry = CachedResponse::from_response(response, self.clock.unix_timestamp_millis());
        let size = entry.size();

        self.backend
            .put(namespace, key, entry)
            .await
            .map_err(CacheError::storage)?;

        debug!(namespace, key, size, "Stored cache entry");
        Ok(())
    }

    /// Returns the entry for `key` from any retained namespace.
    pub async fn get(&self, key: &str) -> Result<Option<CachedResponse>> {
        for namespace in self.lookup_order().await? {
            if let Some(entry) = self
                .backend
                .get(&namespace, key)
                .await
                .map_err(CacheError::storage)?
            {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    pub async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Removes `key` from every namespace. Returns whether anything was removed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut removed = false;
        for namespace in self.namespaces().await? {
            removed |= self
                .backend
                .delete(&namespace, key)
                .await
                .map_err(CacheError::storage)?;
        }
        Ok(removed)
    }

    pub async fn namespaces(&self) -> Result<Vec<String>> {
        self.backend
            .list_namespaces()
            .await
            .map_err(CacheError::storage)
    }

    pub async fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        self.backend
            .keys(namespace)
            .await
            .map_err(CacheError::storage)
    }

    /// Deletes every namespace not listed in `keep`. Returns the deleted names.
    pub async fn rotate(&self, keep: &[String]) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for namespace in self.namespaces().await? {
            if keep.contains(&namespace) {
                continue;
            }
            info!(namespace = %namespace, "Deleting stale cache namespace");
            if self
                .backend
                .delete_namespace(&namespace)
                .await
                .map_err(CacheError::storage)?
            {
                deleted.push(namespace);
            }
        }
        Ok(deleted)
    }

    /// Deletes every namespace. Returns how many were removed.
    pub async fn clear_all(&self) -> Result<usize> {
        let mut cleared = 0;
        for namespace in self.namespaces().await? {
            match self.backend.delete_namespace(&namespace).await {
                Ok(true) => cleared += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(namespace = %namespace, error = %e, "Failed to delete cache namespace");
                    return Err(CacheError::storage(e));
                }
            }
        }
        info!(namespaces = cleared, "Cleared all cache namespaces");
        Ok(cleared)
    }

    async fn lookup_order(&self) -> Result<Vec<String>> {
        let existing = self.namespaces().await?;
        let mut order: Vec<String> = self
            .current
            .iter()
            .filter(|ns| existing.contains(ns))
            .cloned()
            .collect();
        order.extend(existing.into_iter().filter(|ns| !self.current.contains(ns)));
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryResourceBackend;
    use bridge_traits::time::ManualClock;

    fn store(backend: Arc<MemoryResourceBackend>) -> ResourceCacheStore {
        ResourceCacheStore::new(
            backend,
            Arc::new(ManualClock::new(1_700_000_000_000)),
            vec!["app-shell-v4".to_string(), "media-v1".to_string()],
        )
    }

    #[tokio::test]
    async fn test_put_is_an_idempotent_overwrite() {
        let backend = Arc::new(MemoryResourceBackend::new());
        let store = store(backend.clone());

        store
            .put("media-v1", "k", &HttpResponse::new(200, "first"))
            .await
            .unwrap();
        store
            .put("media-v1", "k", &HttpResponse::new(200, "second"))
            .await
            .unwrap();

        assert_eq!(store.keys("media-v1").await.unwrap(), vec!["k"]);
        let entry = store.get("k").await.unwrap().unwrap();
        assert_eq!(entry.body.as_ref(), b"second");
        assert_eq!(entry.stored_at, 1_700_000_000_000);
    }

    #[tokio::test]
    async fn test_current_namespace_wins_over_stale() {
        let backend = Arc::new(MemoryResourceBackend::new());
        let store = store(backend.clone());

        store
            .put("app-shell-v3", "index", &HttpResponse::new(200, "old"))
            .await
            .unwrap();
        assert_eq!(
            store.get("index").await.unwrap().unwrap().body.as_ref(),
            b"old"
        );

        store
            .put("app-shell-v4", "index", &HttpResponse::new(200, "new"))
            .await
            .unwrap();
        assert_eq!(
            store.get("index").await.unwrap().unwrap().body.as_ref(),
            b"new"
        );
    }

    #[tokio::test]
    async fn test_delete_removes_from_all_namespaces() {
        let backend = Arc::new(MemoryResourceBackend::new());
        let store = store(backend.clone());

        store
            .put("app-shell-v3", "k", &HttpResponse::new(200, "a"))
            .await
            .unwrap();
        store
            .put("media-v1", "k", &HttpResponse::new(200, "b"))
            .await
            .unwrap();

        assert!(store.delete("k").await.unwrap());
        assert!(!store.contains("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_rotate_keeps_only_current() {
        let backend = Arc::new(MemoryResourceBackend::new());
        let store = store(backend.clone());
        for ns in ["app-shell-v3", "app-shell-v4", "media-v0", "media-v1"] {
            store.open(ns).await.unwrap();
        }

        let mut deleted = store
            .rotate(&["app-shell-v4".to_string(), "media-v1".to_string()])
            .await
            .unwrap();
        deleted.sort();

        assert_eq!(deleted, vec!["app-shell-v3", "media-v0"]);
        assert_eq!(
            store.namespaces().await.unwrap(),
            vec!["app-shell-v4", "media-v1"]
        );
    }

    #[tokio::test]
    async fn test_quota_rejection_is_storage_failure() {
        let backend = Arc::new(MemoryResourceBackend::new().with_quota(2));
        let store = store(backend);

        let err = store
            .put("media-v1", "k", &HttpResponse::new(200, "too large"))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::StorageFailure(_)));
    }

    #[tokio::test]
    async fn test_clear_all() {
        let backend = Arc::new(MemoryResourceBackend::new());
        let store = store(backend);
        store.open("app-shell-v4").await.unwrap();
        store.open("media-v1").await.unwrap();

        assert_eq!(store.clear_all().await.unwrap(), 2);
        assert!(store.namespaces().await.unwrap().is_empty());
    }
}
