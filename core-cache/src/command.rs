//! Wire protocol between foreground views and the cache worker.
//!
//! Messages are JSON objects tagged by `action`:
//!
//! ```json
//! { "action": "cachePrayer", "url": "https://cdn.example/a.mp3", "cache": true }
//! { "action": "clearAllCache" }
//! { "action": "skipWaiting" }
//! ```

use crate::error::{CacheError, Result};
use crate::router::LifecyclePhase;
use serde::{Deserialize, Serialize};

/// A command posted to the cache worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum CacheCommand {
    /// Add (`cache == true`) or remove an audio asset, keyed by its original URL.
    #[serde(rename = "cachePrayer")]
    CacheAsset { url: String, cache: bool },

    /// Drop every namespace.
    #[serde(rename = "clearAllCache")]
    ClearAll,

    /// Activate a waiting generation immediately.
    #[serde(rename = "skipWaiting")]
    SkipWaiting,
}

impl CacheCommand {
    pub fn cache(url: impl Into<String>) -> Self {
        CacheCommand::CacheAsset {
            url: url.into(),
            cache: true,
        }
    }

    pub fn uncache(url: impl Into<String>) -> Self {
        CacheCommand::CacheAsset {
            url: url.into(),
            cache: false,
        }
    }

    pub fn from_json(message: &str) -> Result<Self> {
        serde_json::from_str(message).map_err(|e| CacheError::InvalidCommand(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CacheError::InvalidCommand(e.to_string()))
    }

    /// Wire name of the command, used in logs.
    pub fn action(&self) -> &'static str {
        match self {
            CacheCommand::CacheAsset { .. } => "cachePrayer",
            CacheCommand::ClearAll => "clearAllCache",
            CacheCommand::SkipWaiting => "skipWaiting",
        }
    }
}

/// What a processed command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Cached { canonical_key: String, bytes: u64 },
    Evicted { canonical_key: String, existed: bool },
    Cleared { namespaces: usize },
    Lifecycle(LifecyclePhase),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_wire_messages() {
        assert_eq!(
            CacheCommand::from_json(
                r#"{"action":"cachePrayer","url":"https://cdn.example/a.mp3","cache":true}"#
            )
            .unwrap(),
            CacheCommand::cache("https://cdn.example/a.mp3")
        );
        assert_eq!(
            CacheCommand::from_json(r#"{"action":"clearAllCache"}"#).unwrap(),
            CacheCommand::ClearAll
        );
        assert_eq!(
            CacheCommand::from_json(r#"{"action":"skipWaiting"}"#).unwrap(),
            CacheCommand::SkipWaiting
        );
    }

    #[test]
    fn test_serializes_with_action_tag() {
        let json = CacheCommand::uncache("https://cdn.example/a.mp3")
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["action"], "cachePrayer");
        assert_eq!(value["cache"], false);
        assert_eq!(value["url"], "https://cdn.example/a.mp3");
    }

    #[test]
    fn test_rejects_unknown_or_malformed() {
        for message in [
            r#"{"action":"format"}"#,
            r#"{"action":"cachePrayer","url":"x"}"#,
            r#"{"url":"x","cache":true}"#,
            "not json",
        ] {
            assert!(matches!(
                CacheCommand::from_json(message),
                Err(CacheError::InvalidCommand(_))
            ));
        }
    }
}
