//! # Event Bus System
//!
//! Provides an event-driven architecture for the recitation core using `tokio::sync::broadcast`.
//! The background cache worker, the playback sync engine and the reader session publish
//! typed events here; foreground views subscribe without holding references to the
//! producers.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ Cache Worker ├──────────────>│           │
//! └──────────────┘               │           │
//!                                │ EventBus  │
//! ┌──────────────┐     emit      │ (broadcast│     subscribe    ┌────────────┐
//! │ Sync Engine  ├──────────────>│  channel) ├─────────────────>│ Subscriber │
//! └──────────────┘               │           │                  └────────────┘
//!                                │           │
//! ┌──────────────┐     emit      │           │     subscribe    ┌────────────┐
//! │ Reader       ├──────────────>│           ├─────────────────>│ Subscriber │
//! └──────────────┘               └───────────┘                  └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Cache(CacheEvent::AssetCached {
//!         url: "https://example.org/audio/kumayl.mp3".to_string(),
//!         canonical_key: "https://corsproxy.io/?https%3A%2F%2Fexample.org%2Faudio%2Fkumayl.mp3"
//!             .to_string(),
//!     }))
//!     .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert!(matches!(event, CoreEvent::Cache(_)));
//! # }
//! ```
//!
//! ## Event Types
//!
//! ### Cache Events
//! - `Installed` / `Activated` / `ControllerClaimed`: install lifecycle progress
//! - `NamespaceDeleted`: a stale generation was rotated out
//! - `AssetCached` / `AssetEvicted` / `AssetCacheFailed`: outcome of a cache command
//! - `CacheCleared` / `ReloadRequired`: every namespace was dropped
//! - `StorageFailure`: a write was rejected by the backing medium
//!
//! ### Playback Events
//! - `SourceChanged`, `VerseActivated`, `TimingUnavailable`, `Looped`, `Completed`, `Error`
//!
//! ### Library Events
//! - `RecitationOpened`, `FavoritesChanged`
//!
//! ## Lagging
//!
//! Each subscriber has an independent buffer. A subscriber that falls behind by more
//! than the capacity receives `RecvError::Lagged(n)` and continues from the oldest
//! retained event.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use broadcast::error::{RecvError, SendError};
pub use broadcast::Receiver;

/// Default buffer size for event channels.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Root event type encompassing all domain events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Cache lifecycle and asset command outcomes
    Cache(CacheEvent),
    /// Playback synchronization events
    Playback(PlaybackEvent),
    /// Recitation library events
    Library(LibraryEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Cache(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Cache(CacheEvent::AssetCacheFailed { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::Error {
                recoverable: false, ..
            }) => EventSeverity::Error,
            CoreEvent::Cache(CacheEvent::StorageFailure { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::TimingUnavailable { .. }) => EventSeverity::Warning,
            CoreEvent::Cache(CacheEvent::ReloadRequired) => EventSeverity::Warning,
            CoreEvent::Cache(CacheEvent::Activated { .. })
            | CoreEvent::Cache(CacheEvent::ControllerClaimed)
            | CoreEvent::Cache(CacheEvent::AssetCached { .. })
            | CoreEvent::Cache(CacheEvent::AssetEvicted { .. })
            | CoreEvent::Cache(CacheEvent::CacheCleared { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Cache Events
// ============================================================================

/// Events published by the cache worker and strategy router.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CacheEvent {
    /// The resource manifest was stored in the current shell namespace.
    Installed {
        /// Namespace that was populated.
        namespace: String,
        /// Number of manifest entries stored.
        resources: usize,
    },
    /// Stale namespaces were rotated out.
    Activated {
        /// Namespaces retained after rotation.
        retained: Vec<String>,
    },
    /// The controller now intercepts requests for every client.
    ControllerClaimed,
    /// A stale namespace was deleted.
    NamespaceDeleted {
        /// The deleted namespace.
        namespace: String,
    },
    /// An audio asset is now available offline.
    AssetCached {
        /// Original (pre-proxy) URL.
        url: String,
        /// Key the entry was stored under.
        canonical_key: String,
    },
    /// An audio asset was removed from the offline store.
    AssetEvicted {
        /// Original (pre-proxy) URL.
        url: String,
        /// Key the entry was removed from.
        canonical_key: String,
    },
    /// Fetching or storing an audio asset failed.
    AssetCacheFailed {
        /// Original (pre-proxy) URL.
        url: String,
        /// Human-readable failure reason.
        message: String,
    },
    /// Every namespace was deleted.
    CacheCleared {
        /// Number of namespaces removed.
        namespaces: usize,
    },
    /// Foreground state must be rebuilt from scratch.
    ReloadRequired,
    /// A write was rejected by the backing medium.
    StorageFailure {
        /// Key whose write failed.
        key: String,
        /// Human-readable failure reason.
        message: String,
    },
}

impl CacheEvent {
    fn description(&self) -> &str {
        match self {
            CacheEvent::Installed { .. } => "Shell resources installed",
            CacheEvent::Activated { .. } => "Cache generation activated",
            CacheEvent::ControllerClaimed => "Cache controller claimed clients",
            CacheEvent::NamespaceDeleted { .. } => "Stale cache namespace deleted",
            CacheEvent::AssetCached { .. } => "Audio cached for offline use",
            CacheEvent::AssetEvicted { .. } => "Audio removed from offline cache",
            CacheEvent::AssetCacheFailed { .. } => "Caching audio failed",
            CacheEvent::CacheCleared { .. } => "All caches cleared",
            CacheEvent::ReloadRequired => "Reload required",
            CacheEvent::StorageFailure { .. } => "Cache storage write failed",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events related to synchronized playback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// The transport was pointed at a new audio source.
    SourceChanged {
        /// Canonical source URL.
        source: String,
    },
    /// The highlighted verse changed.
    VerseActivated {
        /// Verse index, `None` when the highlight was cleared.
        verse: Option<usize>,
        /// Position that produced the change (milliseconds).
        position_ms: u64,
    },
    /// No timing table is available for the selected narrator.
    TimingUnavailable {
        /// Recitation key.
        recitation: String,
        /// Narrator display name.
        narrator: String,
    },
    /// Playback reached the end and restarted.
    Looped,
    /// Playback reached the end and stopped.
    Completed,
    /// The transport reported an error.
    Error {
        /// Human-readable error message.
        message: String,
        /// Whether playback can be retried.
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::SourceChanged { .. } => "Audio source changed",
            PlaybackEvent::VerseActivated { .. } => "Active verse changed",
            PlaybackEvent::TimingUnavailable { .. } => "Timing unavailable",
            PlaybackEvent::Looped => "Playback looped",
            PlaybackEvent::Completed => "Playback completed",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Events related to the recitation library and preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// A recitation was opened in the reader.
    RecitationOpened {
        /// Recitation key.
        key: String,
    },
    /// The favorites set changed.
    FavoritesChanged {
        /// Recitation key that was toggled.
        key: String,
        /// Whether it is now a favorite.
        favorite: bool,
    },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::RecitationOpened { .. } => "Recitation opened",
            LibraryEvent::FavoritesChanged { .. } => "Favorites changed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers. Producers treat the error
    /// as "nobody is listening" and carry on.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let cache_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Cache(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events that match `predicate` will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
