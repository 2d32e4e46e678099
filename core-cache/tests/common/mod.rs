#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::ResourceBackend;
use bridge_traits::time::SystemClock;
use core_cache::{
    CacheConfig, CacheStrategyRouter, CacheWorker, CacheWorkerHandle, MemoryResourceBackend,
    ResourceCacheStore, SelectiveAssetController,
};
use core_runtime::events::EventBus;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const BASE: &str = "https://dua.example/";
pub const AUDIO: &str = "https://cdn.example.org/audio/kumayl.mp3";
pub const PROXIED_AUDIO: &str =
    "https://corsproxy.io/?https%3A%2F%2Fcdn.example.org%2Faudio%2Fkumayl.mp3";

/// Scripted network that counts requests per URL.
#[derive(Default)]
pub struct CountingHttp {
    routes: Mutex<HashMap<String, (u16, Vec<u8>)>>,
    delays: Mutex<HashMap<String, Duration>>,
    counts: Mutex<HashMap<String, usize>>,
    offline: AtomicBool,
}

impl CountingHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serve(&self, url: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .insert(url.to_string(), (status, body.as_bytes().to_vec()));
    }

    pub fn delay(&self, url: &str, delay: Duration) {
        self.delays.lock().insert(url.to_string(), delay);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn count(&self, url: &str) -> usize {
        self.counts.lock().get(url).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.lock().values().sum()
    }
}

#[async_trait]
impl HttpClient for CountingHttp {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        *self.counts.lock().entry(request.url.clone()).or_default() += 1;

        let delay = self.delays.lock().get(&request.url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("network unreachable".to_string()));
        }

        let route = self.routes.lock().get(&request.url).cloned();
        Ok(match route {
            Some((status, body)) => HttpResponse::new(status, body),
            None => HttpResponse::new(404, "not found"),
        })
    }
}

pub fn config(manifest: &[&str]) -> CacheConfig {
    let mut config = CacheConfig::new(Url::parse(BASE).unwrap());
    config.resource_manifest = manifest.iter().map(|s| s.to_string()).collect();
    config
}

pub struct Harness {
    pub http: Arc<CountingHttp>,
    pub backend: Arc<dyn ResourceBackend>,
    pub store: Arc<ResourceCacheStore>,
    pub router: Arc<CacheStrategyRouter>,
    pub assets: SelectiveAssetController,
    pub event_bus: EventBus,
    pub config: Arc<CacheConfig>,
}

impl Harness {
    pub fn new(manifest: &[&str]) -> Self {
        Self::with_backend(manifest, Arc::new(MemoryResourceBackend::new()))
    }

    pub fn with_backend(manifest: &[&str], backend: Arc<dyn ResourceBackend>) -> Self {
        let http = CountingHttp::new();
        let config = Arc::new(config(manifest));
        let event_bus = EventBus::new(64);
        let store = Arc::new(ResourceCacheStore::new(
            backend.clone(),
            Arc::new(SystemClock),
            config.current_namespaces(),
        ));
        let router = Arc::new(
            CacheStrategyRouter::new(config.clone(), store.clone(), http.clone())
                .with_event_bus(event_bus.clone()),
        );
        let assets = SelectiveAssetController::new(
            router.canonicalizer().clone(),
            store.clone(),
            http.clone(),
            config.media_namespace.clone(),
        );

        Self {
            http,
            backend,
            store,
            router,
            assets,
            event_bus,
            config,
        }
    }

    pub fn spawn_worker(&self) -> CacheWorkerHandle {
        let (worker, handle) = CacheWorker::new(
            self.router.clone(),
            self.assets.clone(),
            self.event_bus.clone(),
            self.config.command_queue_capacity,
        );
        worker.spawn();
        handle
    }
}
