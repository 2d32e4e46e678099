//! # Preferences
//!
//! Typed accessors over the host [`SettingsStore`]. Collections are stored
//! as JSON strings; scalars use the store's typed slots. Unreadable values
//! fall back to their defaults.

use crate::error::{LibraryError, Result};
use crate::models::Language;
use bridge_traits::storage::SettingsStore;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

pub const FAVORITES_KEY: &str = "favorites";
pub const CACHED_AUDIO_KEY: &str = "cachedAudio";
pub const LAST_VIEWED_KEY: &str = "lastViewedPrayer";
pub const FONT_SIZE_KEY: &str = "fontSize";
pub const DARK_MODE_KEY: &str = "darkMode";
pub const SHOW_FARSI_KEY: &str = "showFarsi";
pub const SHOW_ENGLISH_KEY: &str = "showEnglish";
pub const PLAYBACK_RATE_KEY: &str = "playbackRate";

pub const MIN_FONT_LEVEL: i64 = -3;
pub const MAX_FONT_LEVEL: i64 = 5;
const BASE_FONT_REM: f64 = 1.8;
const FONT_STEP_REM: f64 = 0.2;

/// Font scale level, clamped to `[-3, 5]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontScale {
    level: i64,
}

impl FontScale {
    pub fn new(level: i64) -> Self {
        Self {
            level: level.clamp(MIN_FONT_LEVEL, MAX_FONT_LEVEL),
        }
    }

    pub fn level(&self) -> i64 {
        self.level
    }

    /// Verse font size in rem.
    pub fn size_rem(&self) -> f64 {
        BASE_FONT_REM + self.level as f64 * FONT_STEP_REM
    }

    pub fn adjust(&self, delta: i64) -> Self {
        Self::new(self.level.saturating_add(delta))
    }
}

#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn SettingsStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    // ========================================================================
    // Favorites
    // ========================================================================

    /// Favorited recitation keys in the order they were added.
    pub async fn favorites(&self) -> Result<Vec<String>> {
        Ok(self.read_json(FAVORITES_KEY).await?.unwrap_or_default())
    }

    pub async fn is_favorite(&self, key: &str) -> Result<bool> {
        Ok(self.favorites().await?.iter().any(|favorite| favorite == key))
    }

    /// Adds or removes `key`. Returns whether it is now a favorite.
    pub async fn toggle_favorite(&self, key: &str) -> Result<bool> {
        if key.is_empty() {
            return Err(LibraryError::invalid("key", "recitation key is empty"));
        }

        let mut favorites = self.favorites().await?;
        let favorite = match favorites.iter().position(|favorite| favorite == key) {
            Some(index) => {
                favorites.remove(index);
                false
            }
            None => {
                favorites.push(key.to_string());
                true
            }
        };
        self.write_json(FAVORITES_KEY, &favorites).await?;
        Ok(favorite)
    }

    // ========================================================================
    // Cache Intents
    // ========================================================================

    /// "Keep offline" choices keyed by original audio URL.
    pub async fn cache_intents(&self) -> Result<BTreeMap<String, bool>> {
        Ok(self.read_json(CACHED_AUDIO_KEY).await?.unwrap_or_default())
    }

    pub async fn cache_intent(&self, original_url: &str) -> Result<bool> {
        Ok(self
            .cache_intents()
            .await?
            .get(original_url)
            .copied()
            .unwrap_or(false))
    }

    pub async fn set_cache_intent(&self, original_url: &str, keep: bool) -> Result<()> {
        let mut intents = self.cache_intents().await?;
        intents.insert(original_url.to_string(), keep);
        self.write_json(CACHED_AUDIO_KEY, &intents).await
    }

    pub async fn clear_cache_intents(&self) -> Result<()> {
        self.store.delete(CACHED_AUDIO_KEY).await?;
        Ok(())
    }

    // ========================================================================
    // Reader
    // ========================================================================

    pub async fn last_viewed(&self) -> Result<Option<String>> {
        Ok(self.store.get_string(LAST_VIEWED_KEY).await?)
    }

    pub async fn set_last_viewed(&self, key: &str) -> Result<()> {
        self.store.set_string(LAST_VIEWED_KEY, key).await?;
        Ok(())
    }

    pub async fn font_scale(&self) -> Result<FontScale> {
        let level = self.store.get_i64(FONT_SIZE_KEY).await?.unwrap_or(0);
        Ok(FontScale::new(level))
    }

    /// Moves the font level by `delta`, clamped, and persists it.
    pub async fn change_font_scale(&self, delta: i64) -> Result<FontScale> {
        let scale = self.font_scale().await?.adjust(delta);
        self.store.set_i64(FONT_SIZE_KEY, scale.level()).await?;
        Ok(scale)
    }

    pub async fn dark_mode(&self) -> Result<bool> {
        Ok(self.store.get_bool(DARK_MODE_KEY).await?.unwrap_or(false))
    }

    pub async fn set_dark_mode(&self, enabled: bool) -> Result<()> {
        self.store.set_bool(DARK_MODE_KEY, enabled).await?;
        Ok(())
    }

    /// Farsi is shown unless turned off; English is hidden unless turned on.
    /// Arabic is always shown.
    pub async fn translation_visible(&self, language: Language) -> Result<bool> {
        match language {
            Language::Arabic => Ok(true),
            Language::Farsi => Ok(self.store.get_bool(SHOW_FARSI_KEY).await?.unwrap_or(true)),
            Language::English => Ok(self
                .store
                .get_bool(SHOW_ENGLISH_KEY)
                .await?
                .unwrap_or(false)),
        }
    }

    pub async fn set_translation_visible(&self, language: Language, visible: bool) -> Result<()> {
        let key = match language {
            Language::Farsi => SHOW_FARSI_KEY,
            Language::English => SHOW_ENGLISH_KEY,
            Language::Arabic => {
                return Err(LibraryError::invalid(
                    "language",
                    "the Arabic text cannot be hidden",
                ))
            }
        };
        self.store.set_bool(key, visible).await?;
        Ok(())
    }

    pub async fn playback_rate(&self) -> Result<f64> {
        let rate = self.store.get_f64(PLAYBACK_RATE_KEY).await?;
        Ok(rate.filter(|r| r.is_finite() && *r > 0.0).unwrap_or(1.0))
    }

    pub async fn set_playback_rate(&self, rate: f64) -> Result<()> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(LibraryError::invalid(
                "playback_rate",
                format!("{} is not a positive rate", rate),
            ));
        }
        self.store.set_f64(PLAYBACK_RATE_KEY, rate).await?;
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.store.get_string(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "Ignoring unreadable preference");
                Ok(None)
            }
        }
    }

    async fn write_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value).map_err(|e| LibraryError::Decode {
            what: key.to_string(),
            message: e.to_string(),
        })?;
        self.store.set_string(key, &raw).await?;
        Ok(())
    }
}
