//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the recitation core crates:
//! - Logging and tracing setup ([`logging`])
//! - Configuration and capability wiring ([`config`])
//! - The event bus used by the cache worker, sync engine and reader ([`events`])
//!
//! Everything host-specific arrives through `bridge-traits`; with the
//! `desktop-shims` feature the configuration builder can fill in the
//! `bridge-desktop` adapters on its own.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
