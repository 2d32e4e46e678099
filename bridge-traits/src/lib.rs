//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the recitation core and
//! platform-specific implementations. Each trait represents a capability that
//! the core requires but that must be implemented differently per host
//! (desktop, embedded webview, browser worker).
//!
//! ## Traits
//!
//! ### Networking & Storage
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry
//! - [`ResourceBackend`](storage::ResourceBackend) - Durable, namespaced response storage
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preferences storage
//!
//! ### Foreground Collaborators
//! - [`VerseRenderer`](render::VerseRenderer) - Highlight and scroll the rendered verse list
//! - [`AudioTransport`](playback::AudioTransport) - The host audio element
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ In Progress |
//! | Web      | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for consistent
//! error handling. Platform implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Include error context (e.g., URL, namespace, key)
//!
//! ## Thread Safety
//!
//! Background-facing traits (`HttpClient`, `ResourceBackend`, `SettingsStore`,
//! `Clock`) require `Send + Sync` so they can be shared by the cache worker
//! and any number of foreground handles. Foreground collaborators
//! (`VerseRenderer`, `AudioTransport`) are only `Send`; they are driven from a
//! single event loop through `&mut self`.

pub mod error;
pub mod http;
pub mod playback;
pub mod render;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use playback::{AudioTransport, MediaErrorKind};
pub use render::{VerseRenderer, VerseTiming};
pub use storage::{CachedResponse, ResourceBackend, SettingsStore};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
