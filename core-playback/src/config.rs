//! # Sync Configuration
//!
//! Tuning knobs for the playback sync engine.

use core_runtime::config::CoreConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback sync engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Quiet period after the last user scroll before automatic
    /// scroll-into-view resumes.
    ///
    /// Default: 250 ms.
    #[serde(default = "default_scroll_debounce")]
    pub scroll_debounce: Duration,

    /// Distance of one skip forward/backward.
    ///
    /// Default: 5 seconds.
    #[serde(default = "default_seek_step")]
    pub seek_step: Duration,

    /// Rate applied to every newly loaded source until changed.
    ///
    /// Default: 1.0.
    #[serde(default = "default_rate")]
    pub initial_rate: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            scroll_debounce: default_scroll_debounce(),
            seek_step: default_seek_step(),
            initial_rate: default_rate(),
        }
    }
}

impl SyncConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.scroll_debounce.is_zero() {
            return Err("scroll_debounce must be > 0".to_string());
        }

        if self.seek_step.is_zero() {
            return Err("seek_step must be > 0".to_string());
        }

        if !(self.initial_rate.is_finite() && self.initial_rate > 0.0) {
            return Err("initial_rate must be finite and > 0".to_string());
        }

        Ok(())
    }

    pub fn with_initial_rate(mut self, rate: f64) -> Self {
        self.initial_rate = rate;
        self
    }
}

impl From<&CoreConfig> for SyncConfig {
    fn from(config: &CoreConfig) -> Self {
        Self {
            scroll_debounce: config.scroll_debounce,
            seek_step: config.seek_step,
            ..Default::default()
        }
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_scroll_debounce() -> Duration {
    Duration::from_millis(250)
}

fn default_seek_step() -> Duration {
    Duration::from_secs(5)
}

fn default_rate() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scroll_debounce, Duration::from_millis(250));
        assert_eq!(config.seek_step, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        let config = SyncConfig::default().with_initial_rate(0.0);
        assert!(config.validate().is_err());
    }
}
