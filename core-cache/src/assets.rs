//! # Selective Asset Controller
//!
//! Adds and evicts individual audio assets in the media namespace on request.
//!
//! ## Ordering
//!
//! Commands for the same canonical key run strictly in the order they were
//! scheduled: [`SelectiveAssetController::schedule`] takes a per-key ticket
//! synchronously, and each ticket waits for the previous one on that key to
//! finish. A cache request followed by an uncache request can therefore
//! never leave the entry behind. Commands for different keys run
//! concurrently. [`SelectiveAssetController::clear_all`] takes an exclusive
//! gate, so no per-key command straddles it.

use crate::canonical::UrlCanonicalizer;
use crate::command::CommandOutcome;
use crate::error::{CacheError, Result};
use crate::store::ResourceCacheStore;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_runtime::logging::redact_url_query;
use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct SelectiveAssetController {
    inner: Arc<Inner>,
}

struct Inner {
    canonicalizer: UrlCanonicalizer,
    store: Arc<ResourceCacheStore>,
    http_client: Arc<dyn HttpClient>,
    media_namespace: String,
    lanes: Mutex<HashMap<String, Lane>>,
    next_ticket: AtomicU64,
    gate: RwLock<()>,
}

/// Tail of the per-key command chain.
struct Lane {
    ticket: u64,
    finished: oneshot::Receiver<()>,
}

/// Position in a key's command chain. Dropping it lets the next command run.
struct Ticket {
    inner: Arc<Inner>,
    key: String,
    id: u64,
    previous: Option<oneshot::Receiver<()>>,
    _finished: oneshot::Sender<()>,
}

impl Ticket {
    async fn wait_turn(&mut self) {
        if let Some(previous) = self.previous.take() {
            // Resolves with an error once the previous ticket is dropped.
            let _ = previous.await;
        }
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let mut lanes = self.inner.lanes.lock();
        if lanes.get(&self.key).map(|lane| lane.ticket) == Some(self.id) {
            lanes.remove(&self.key);
        }
    }
}

impl SelectiveAssetController {
    pub fn new(
        canonicalizer: UrlCanonicalizer,
        store: Arc<ResourceCacheStore>,
        http_client: Arc<dyn HttpClient>,
        media_namespace: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                canonicalizer,
                store,
                http_client,
                media_namespace: media_namespace.into(),
                lanes: Mutex::new(HashMap::new()),
                next_ticket: AtomicU64::new(0),
                gate: RwLock::new(()),
            }),
        }
    }

    pub fn canonicalizer(&self) -> &UrlCanonicalizer {
        &self.inner.canonicalizer
    }

    /// Schedules a cache (`cache == true`) or uncache of `url`.
    ///
    /// The position in the per-key order is fixed when this returns, before
    /// the future is first polled.
    pub fn schedule(&self, url: &str, cache: bool) -> BoxFuture<'static, Result<CommandOutcome>> {
        let key = match self.inner.canonicalizer.canonicalize(url) {
            Ok(key) => key,
            Err(e) => return future::ready(Err(e)).boxed(),
        };
        let mut ticket = self.take_ticket(&key);
        let inner = self.inner.clone();

        async move {
            ticket.wait_turn().await;
            let _gate = inner.gate.read().await;

            if cache {
                inner.store_asset(&ticket.key).await
            } else {
                inner.evict_asset(&ticket.key).await
            }
        }
        .boxed()
    }

    /// Caches or uncaches `url` and waits for the outcome.
    pub async fn cache_asset(&self, url: &str, cache: bool) -> Result<CommandOutcome> {
        self.schedule(url, cache).await
    }

    /// Deletes every namespace. Returns how many were removed.
    pub async fn clear_all(&self) -> Result<usize> {
        let _gate = self.inner.gate.write().await;
        self.inner.store.clear_all().await
    }

    /// Whether the asset behind `original_url` is stored under its canonical key.
    pub async fn is_cached(&self, original_url: &str) -> Result<bool> {
        let key = self.inner.canonicalizer.canonicalize(original_url)?;
        self.inner.store.contains(&key).await
    }

    /// Number of keys with a scheduled or running command.
    pub fn pending_keys(&self) -> usize {
        self.inner.lanes.lock().len()
    }

    fn take_ticket(&self, key: &str) -> Ticket {
        let id = self.inner.next_ticket.fetch_add(1, Ordering::SeqCst);
        let (finished_tx, finished_rx) = oneshot::channel();

        let previous = self
            .inner
            .lanes
            .lock()
            .insert(
                key.to_string(),
                Lane {
                    ticket: id,
                    finished: finished_rx,
                },
            )
            .map(|lane| lane.finished);

        Ticket {
            inner: self.inner.clone(),
            key: key.to_string(),
            id,
            previous,
            _finished: finished_tx,
        }
    }
}

impl Inner {
    async fn store_asset(&self, key: &str) -> Result<CommandOutcome> {
        info!(key = %redact_url_query(key), "Caching audio");

        let response = self
            .http_client
            .execute(HttpRequest::get(key))
            .await
            .map_err(|e| CacheError::network(key, e))?;

        if !response.is_success() {
            warn!(status = response.status, "Audio fetch failed; not caching");
            return Err(CacheError::status(key, response.status));
        }

        self.store.put(&self.media_namespace, key, &response).await?;

        Ok(CommandOutcome::Cached {
            canonical_key: key.to_string(),
            bytes: response.body.len() as u64,
        })
    }

    async fn evict_asset(&self, key: &str) -> Result<CommandOutcome> {
        let existed = self.store.delete(key).await?;
        debug!(key = %redact_url_query(key), existed, "Deleted audio from cache");

        Ok(CommandOutcome::Evicted {
            canonical_key: key.to_string(),
            existed,
        })
    }
}
