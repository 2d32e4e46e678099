//! # Recitation Library Module
//!
//! Owns the recitation catalog and the reader's persisted preferences.
//!
//! ## Overview
//!
//! This module manages:
//! - Recitation metadata and narrators from `data/<key>/meta.json`
//! - Verse and translation text, newline-delimited per language
//! - Menu ordering and search
//! - Typed preferences (favorites, offline intents, font scale, rate)

pub mod catalog;
pub mod error;
pub mod models;
pub mod preferences;

pub use catalog::RecitationCatalog;
pub use error::{LibraryError, Result};
pub use models::{Language, Narrator, RecitationMeta, RecitationText};
pub use preferences::{FontScale, Preferences};
