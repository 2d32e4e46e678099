//! # Offline Resource Cache
//!
//! An offline-first cache controller for the recitation client:
//!
//! - [`store::ResourceCacheStore`] - namespaced, durable response storage
//! - [`router::CacheStrategyRouter`] - per-class strategies and the
//!   install/activate lifecycle
//! - [`canonical::UrlCanonicalizer`] - the single `original -> proxied` key mapping
//! - [`assets::SelectiveAssetController`] - explicit add/evict of audio assets
//! - [`worker::CacheWorker`] - background message loop driven by [`command::CacheCommand`]s
//!
//! ## Wiring
//!
//! ```ignore
//! let config = Arc::new(CacheConfig::from(&core_config));
//! let store = Arc::new(ResourceCacheStore::new(backend, clock, config.current_namespaces()));
//! let router = Arc::new(
//!     CacheStrategyRouter::new(config.clone(), store.clone(), http.clone())
//!         .with_event_bus(event_bus.clone()),
//! );
//! let assets = SelectiveAssetController::new(
//!     router.canonicalizer().clone(),
//!     store,
//!     http,
//!     config.media_namespace.clone(),
//! );
//! let (worker, handle) = CacheWorker::new(router, assets, event_bus, config.command_queue_capacity);
//! worker.spawn();
//!
//! handle.post(CacheCommand::cache("https://cdn.example/kumayl.mp3")).await?;
//! ```

pub mod assets;
pub mod canonical;
pub mod command;
pub mod config;
pub mod error;
pub mod memory;
pub mod router;
pub mod store;
pub mod worker;

pub use assets::SelectiveAssetController;
pub use canonical::UrlCanonicalizer;
pub use command::{CacheCommand, CommandOutcome};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use memory::MemoryResourceBackend;
pub use router::{CacheStrategyRouter, LifecyclePhase, ResourceClass};
pub use store::ResourceCacheStore;
pub use worker::{CacheWorker, CacheWorkerHandle};
