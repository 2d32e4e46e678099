//! Workspace umbrella crate.
//!
//! Exposes feature flags that map to the individual workspace crates
//! (`core-service`, `core-cache`, `core-playback`). Host applications can
//! depend on `recital-workspace` and enable the documented features without
//! wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service;

#[cfg(feature = "offline-cache")]
pub use core_cache;

#[cfg(feature = "playback-sync")]
pub use core_playback;
