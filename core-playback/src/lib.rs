//! # Playback Sync Module
//!
//! Keeps a scrolling verse view in step with an independently advancing
//! audio position.
//!
//! ## Overview
//!
//! This module handles:
//! - Verse timing tables and their lazy loading per narrator
//! - The sync engine: highlight, scroll-into-view, seek, rate and loop
//! - Scroll suppression while the user scrolls manually
//!
//! The audio element and the verse list are host collaborators, injected as
//! [`AudioTransport`](bridge_traits::AudioTransport) and
//! [`VerseRenderer`](bridge_traits::VerseRenderer).

pub mod config;
pub mod debounce;
pub mod error;
pub mod sync;
pub mod timing;
pub mod transport;

pub use config::SyncConfig;
pub use debounce::ScrollDebounce;
pub use error::{PlaybackError, Result};
pub use sync::{PlaybackCursor, PlaybackSyncEngine, SyncState};
pub use timing::{TimingLoader, TimingTable};
