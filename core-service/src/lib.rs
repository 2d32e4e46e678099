//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, durable
//! response storage, settings, clock) into the shared Rust core: it starts
//! the background cache worker, installs the current cache generation, loads
//! the recitation catalog and opens [`ReaderSession`]s for the foreground.
//! Desktop apps typically enable the `desktop-shims` feature (which depends
//! on `bridge-desktop`) to get reqwest/SQLite defaults.
//!
//! ```ignore
//! let config = CoreConfig::builder()
//!     .app_base_url("https://dua.example/")
//!     .build_with_desktop_defaults()
//!     .await?;
//! let core = CoreService::start(config).await?;
//! core.load_catalog().await;
//!
//! let mut reader = core.open_session(Box::new(transport), Box::new(renderer)).await?;
//! reader.open("kumayl").await?;
//! ```

pub mod error;
pub mod intercept;
pub mod session;

pub use error::{CoreError, Result};
pub use intercept::CacheRoutedHttpClient;
pub use session::ReaderSession;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::{ReqwestHttpClient, SqliteResourceBackend, SqliteSettingsStore};

use std::sync::Arc;

use bridge_traits::{
    http::HttpClient,
    playback::AudioTransport,
    render::VerseRenderer,
    storage::{ResourceBackend, SettingsStore},
    time::Clock,
};
use core_cache::{
    CacheConfig, CacheStrategyRouter, CacheWorker, CacheWorkerHandle, LifecyclePhase,
    ResourceCacheStore, SelectiveAssetController,
};
use core_library::{Preferences, RecitationCatalog};
use core_playback::{PlaybackSyncEngine, SyncConfig, TimingLoader};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, Receiver, DEFAULT_EVENT_BUFFER_SIZE};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Aggregated handle to all bridge dependencies the core requires.
#[derive(Clone)]
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub resource_backend: Arc<dyn ResourceBackend>,
    pub settings_store: Arc<dyn SettingsStore>,
    pub clock: Arc<dyn Clock>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        resource_backend: Arc<dyn ResourceBackend>,
        settings_store: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http_client,
            resource_backend,
            settings_store,
            clock,
        }
    }
}

impl From<&CoreConfig> for CoreDependencies {
    fn from(config: &CoreConfig) -> Self {
        Self::new(
            config.http_client.clone(),
            config.resource_backend.clone(),
            config.settings_store.clone(),
            config.clock.clone(),
        )
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    config: CoreConfig,
    deps: Arc<CoreDependencies>,
    event_bus: EventBus,
    cache: CacheWorkerHandle,
    worker: Mutex<Option<JoinHandle<()>>>,
    foreground_http: Arc<dyn HttpClient>,
    catalog: Arc<RecitationCatalog>,
    preferences: Preferences,
}

impl CoreService {
    /// Starts the cache worker and installs the current cache generation.
    ///
    /// Must be called from within a tokio runtime. A failed install is
    /// logged and leaves the previous generation in charge; the service
    /// still starts.
    #[instrument(skip(config), fields(base = %config.app_base_url))]
    pub async fn start(config: CoreConfig) -> Result<Self> {
        let deps = Arc::new(CoreDependencies::from(&config));
        let event_bus = EventBus::new(DEFAULT_EVENT_BUFFER_SIZE);

        let cache_config = Arc::new(CacheConfig::from(&config));
        let store = Arc::new(ResourceCacheStore::new(
            deps.resource_backend.clone(),
            deps.clock.clone(),
            cache_config.current_namespaces(),
        ));
        let router = Arc::new(
            CacheStrategyRouter::new(cache_config.clone(), store.clone(), deps.http_client.clone())
                .with_event_bus(event_bus.clone()),
        );
        let assets = SelectiveAssetController::new(
            router.canonicalizer().clone(),
            store,
            deps.http_client.clone(),
            cache_config.media_namespace.clone(),
        );
        let (worker, cache) = CacheWorker::new(
            router.clone(),
            assets,
            event_bus.clone(),
            cache_config.command_queue_capacity,
        );
        let worker = worker.spawn();

        // A fresh generation takes over as soon as it is installed.
        router.skip_waiting().await?;
        match router.install_and_activate().await {
            Ok(LifecyclePhase::Activated) => info!("Cache generation active"),
            Ok(phase) => info!(?phase, "Cache generation installed"),
            Err(e) => warn!(error = %e, "Install failed; continuing without a fresh shell cache"),
        }

        let foreground_http: Arc<dyn HttpClient> =
            Arc::new(CacheRoutedHttpClient::new(cache.clone()));
        let catalog = Arc::new(RecitationCatalog::new(
            foreground_http.clone(),
            config.app_base_url.clone(),
        ));
        let preferences = Preferences::new(deps.settings_store.clone());

        Ok(Self {
            inner: Arc::new(ServiceInner {
                config,
                deps,
                event_bus,
                cache,
                worker: Mutex::new(Some(worker)),
                foreground_http,
                catalog,
                preferences,
            }),
        })
    }

    /// Loads metadata for the configured recitations. Returns the keys that
    /// loaded.
    pub async fn load_catalog(&self) -> Vec<String> {
        self.inner
            .catalog
            .load_metadata(&self.inner.config.recitation_keys)
            .await
    }

    /// Opens a reader bound to the host's audio element and verse list.
    ///
    /// The persisted playback rate is applied to the new engine.
    pub async fn open_session(
        &self,
        transport: Box<dyn AudioTransport>,
        renderer: Box<dyn VerseRenderer>,
    ) -> Result<ReaderSession> {
        let rate = self.inner.preferences.playback_rate().await?;
        let sync_config = SyncConfig::from(&self.inner.config).with_initial_rate(rate);
        let engine = PlaybackSyncEngine::new(
            transport,
            renderer,
            self.inner.deps.clock.clone(),
            sync_config,
        )
        .with_event_bus(self.inner.event_bus.clone());

        Ok(ReaderSession::new(
            self.inner.catalog.clone(),
            self.inner.preferences.clone(),
            TimingLoader::new(
                self.inner.foreground_http.clone(),
                self.inner.config.app_base_url.clone(),
            ),
            self.inner.cache.clone(),
            self.inner.foreground_http.clone(),
            engine,
            self.inner.event_bus.clone(),
        ))
    }

    pub fn catalog(&self) -> Arc<RecitationCatalog> {
        Arc::clone(&self.inner.catalog)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.inner.preferences
    }

    /// Handle to the background cache worker.
    pub fn cache(&self) -> &CacheWorkerHandle {
        &self.inner.cache
    }

    /// HTTP client whose requests are answered by the cache router.
    pub fn http_client(&self) -> Arc<dyn HttpClient> {
        Arc::clone(&self.inner.foreground_http)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.inner.event_bus.subscribe()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.inner.deps)
    }

    /// Stops the cache worker after in-flight commands finish.
    pub async fn shutdown(&self) -> Result<()> {
        if self.inner.cache.shutdown().await.is_err() {
            debug!("Cache worker already stopped");
        }
        let worker = self.inner.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!(error = %e, "Cache worker task failed");
            }
        }
        Ok(())
    }
}
