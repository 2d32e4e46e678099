//! # Cache Strategy Router
//!
//! Intercepts every request of a running client and answers it according to
//! the class of the resource:
//!
//! - **Media** (audio by extension or path pattern): cache-first. A hit never
//!   touches the network; a miss is fetched and returned without being
//!   stored, because media is only persisted on explicit request.
//! - **Shell** (everything else): network-first. A successful response is
//!   copied into the current shell namespace before it is returned; on
//!   network failure the stored copy is served, and without one the caller
//!   gets [`CacheError::OfflineMiss`].
//!
//! Only `GET` requests for `http(s)` URLs are cached; everything else passes
//! straight through.
//!
//! ## Lifecycle
//!
//! ```text
//!  Idle ──install()──> Installing ──ok──> Installed ──activate()──> Activating ──> Activated
//!                           │
//!                           └──err──> Redundant
//! ```
//!
//! Install and activate share one lifecycle lock, so a rotation can never
//! delete a namespace that another cycle is still populating.

use crate::canonical::{is_http, UrlCanonicalizer};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::store::ResourceCacheStore;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
use core_runtime::logging::redact_url_query;
use futures::future::try_join_all;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Caching class of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceClass {
    /// Static application asset, network-first
    Shell,
    /// Large audio asset, cache-first
    Media,
}

/// Observable install/activate progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecyclePhase {
    /// No install has been attempted yet.
    Idle,
    Installing,
    /// Installed and waiting for activation.
    Installed,
    Activating,
    Activated,
    /// The last install failed; a new one may be attempted.
    Redundant,
}

pub struct CacheStrategyRouter {
    config: Arc<CacheConfig>,
    canonicalizer: UrlCanonicalizer,
    store: Arc<ResourceCacheStore>,
    http_client: Arc<dyn HttpClient>,
    event_bus: Option<EventBus>,
    lifecycle: Mutex<()>,
    phase: RwLock<LifecyclePhase>,
    skip_waiting: AtomicBool,
}

impl CacheStrategyRouter {
    pub fn new(
        config: Arc<CacheConfig>,
        store: Arc<ResourceCacheStore>,
        http_client: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            canonicalizer: UrlCanonicalizer::from_config(&config),
            config,
            store,
            http_client,
            event_bus: None,
            lifecycle: Mutex::new(()),
            phase: RwLock::new(LifecyclePhase::Idle),
            skip_waiting: AtomicBool::new(false),
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn canonicalizer(&self) -> &UrlCanonicalizer {
        &self.canonicalizer
    }

    pub fn store(&self) -> &Arc<ResourceCacheStore> {
        &self.store
    }

    pub fn phase(&self) -> LifecyclePhase {
        *self.phase.read()
    }

    /// Classifies a canonical key.
    ///
    /// Proxied keys are also checked through the original URL they wrap,
    /// since the proxy URL itself carries no path information.
    pub fn classify(&self, canonical_key: &str) -> ResourceClass {
        let is_media = self.config.is_media_url(canonical_key)
            || self
                .canonicalizer
                .original_of(canonical_key)
                .is_some_and(|original| self.config.is_media_url(&original));

        if is_media {
            ResourceClass::Media
        } else {
            ResourceClass::Shell
        }
    }

    // ========================================================================
    // Fetch interception
    // ========================================================================

    /// Answers an intercepted request.
    #[instrument(skip(self, request), fields(method = request.method.as_str(), url = %redact_url_query(&request.url)))]
    pub async fn handle_fetch(&self, request: HttpRequest) -> Result<HttpResponse> {
        if request.method != HttpMethod::Get {
            return self.pass_through(request).await;
        }

        let resolved = self.canonicalizer.resolve(&request.url)?;
        if !is_http(&resolved) {
            return self.pass_through(request).await;
        }

        let canonical = self.canonicalizer.canonicalize(resolved.as_str())?;
        match self.classify(&canonical) {
            ResourceClass::Media => self.cache_first(request.with_url(canonical)).await,
            ResourceClass::Shell => self.network_first(request.with_url(resolved)).await,
        }
    }

    async fn pass_through(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        self.http_client
            .execute(request)
            .await
            .map_err(|e| CacheError::network(url, e))
    }

    async fn cache_first(&self, request: HttpRequest) -> Result<HttpResponse> {
        let key = request.url.clone();

        match self.store.get(&key).await {
            Ok(Some(entry)) => {
                debug!("Serving media from cache");
                return Ok(entry.to_response());
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Cache lookup failed; treating as miss"),
        }

        let response = self.fetch_ok(request).await?;
        debug!(size = response.body.len(), "Serving media from network (not persisted)");
        Ok(response)
    }

    async fn network_first(&self, request: HttpRequest) -> Result<HttpResponse> {
        let key = request.url.clone();

        match self.fetch_ok(request).await {
            Ok(response) => {
                let namespace = &self.config.shell_namespace;
                if let Err(e) = self.store.put(namespace, &key, &response).await {
                    warn!(error = %e, "Failed to store shell resource; serving live response");
                    self.emit(CacheEvent::StorageFailure {
                        key: key.clone(),
                        message: e.to_string(),
                    });
                }
                Ok(response)
            }
            Err(network_error) => {
                debug!(error = %network_error, "Network failed; falling back to cache");
                match self.store.get(&key).await {
                    Ok(Some(entry)) => Ok(entry.to_response()),
                    Ok(None) => Err(CacheError::OfflineMiss { url: key }),
                    Err(e) => {
                        warn!(error = %e, "Cache fallback failed");
                        Err(CacheError::OfflineMiss { url: key })
                    }
                }
            }
        }
    }

    /// Fetches `request`, treating non-2xx statuses as network failures.
    async fn fetch_ok(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| CacheError::network(url.clone(), e))?;

        if !response.is_success() {
            return Err(CacheError::status(url, response.status));
        }
        Ok(response)
    }

    // ========================================================================
    // Install / activate lifecycle
    // ========================================================================

    /// Populates the current shell namespace from the resource manifest.
    ///
    /// All-or-nothing: if any manifest entry cannot be fetched nothing is
    /// stored and the phase becomes [`LifecyclePhase::Redundant`].
    pub async fn install(&self) -> Result<usize> {
        let _guard = self.lifecycle.lock().await;
        self.install_locked().await
    }

    /// Rotates out stale namespaces and claims control.
    pub async fn activate(&self) -> Result<Vec<String>> {
        let _guard = self.lifecycle.lock().await;
        self.activate_locked().await
    }

    /// Installs, then activates if [`skip_waiting`](Self::skip_waiting) was requested.
    ///
    /// Returns the phase the cycle settled in.
    pub async fn install_and_activate(&self) -> Result<LifecyclePhase> {
        let _guard = self.lifecycle.lock().await;
        self.install_locked().await?;

        if self.skip_waiting.load(Ordering::SeqCst) {
            self.activate_locked().await?;
        }
        Ok(self.phase())
    }

    /// Lets an installed generation activate without waiting.
    ///
    /// If an install is already waiting it is activated now; otherwise the
    /// next [`install_and_activate`](Self::install_and_activate) activates
    /// immediately.
    pub async fn skip_waiting(&self) -> Result<LifecyclePhase> {
        self.skip_waiting.store(true, Ordering::SeqCst);

        let _guard = self.lifecycle.lock().await;
        if self.phase() == LifecyclePhase::Installed {
            self.activate_locked().await?;
        }
        Ok(self.phase())
    }

    #[instrument(skip(self), fields(namespace = %self.config.shell_namespace))]
    async fn install_locked(&self) -> Result<usize> {
        self.set_phase(LifecyclePhase::Installing);

        match self.populate_shell().await {
            Ok(count) => {
                info!(resources = count, "Installed shell resources");
                self.set_phase(LifecyclePhase::Installed);
                self.emit(CacheEvent::Installed {
                    namespace: self.config.shell_namespace.clone(),
                    resources: count,
                });
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "Failed to cache resources during install");
                self.set_phase(LifecyclePhase::Redundant);
                Err(CacheError::LifecycleFailed(e.to_string()))
            }
        }
    }

    async fn populate_shell(&self) -> Result<usize> {
        let keys = self
            .config
            .resource_manifest
            .iter()
            .map(|entry| self.canonicalizer.resolve(entry).map(String::from))
            .collect::<Result<Vec<_>>>()?;

        let responses = try_join_all(
            keys.iter()
                .map(|key| self.fetch_ok(HttpRequest::get(key.as_str()))),
        )
        .await?;

        let namespace = &self.config.shell_namespace;
        self.store.open(namespace).await?;
        for (key, response) in keys.iter().zip(responses.iter()) {
            self.store.put(namespace, key, response).await?;
        }
        Ok(keys.len())
    }

    #[instrument(skip(self))]
    async fn activate_locked(&self) -> Result<Vec<String>> {
        self.set_phase(LifecyclePhase::Activating);

        let retained = self.config.current_namespaces();
        let deleted = match self.store.rotate(&retained).await {
            Ok(deleted) => deleted,
            Err(e) => {
                self.set_phase(LifecyclePhase::Installed);
                return Err(CacheError::LifecycleFailed(e.to_string()));
            }
        };

        for namespace in &deleted {
            self.emit(CacheEvent::NamespaceDeleted {
                namespace: namespace.clone(),
            });
        }

        self.set_phase(LifecyclePhase::Activated);
        info!(deleted = deleted.len(), "Cache generation activated");
        self.emit(CacheEvent::Activated { retained });
        self.emit(CacheEvent::ControllerClaimed);
        Ok(deleted)
    }

    fn set_phase(&self, phase: LifecyclePhase) {
        *self.phase.write() = phase;
    }

    fn emit(&self, event: CacheEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Cache(event)).ok();
        }
    }
}
