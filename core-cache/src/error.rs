use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Network request for {url} failed: {reason}")]
    NetworkFailure { url: String, reason: String },

    #[error("Cache storage rejected the operation: {0}")]
    StorageFailure(String),

    #[error("{url} is not cached and the network is unavailable")]
    OfflineMiss { url: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid cache command: {0}")]
    InvalidCommand(String),

    #[error("Cache lifecycle failed: {0}")]
    LifecycleFailed(String),

    #[error("Cache worker has stopped")]
    WorkerStopped,
}

impl CacheError {
    pub(crate) fn network(url: impl Into<String>, error: BridgeError) -> Self {
        CacheError::NetworkFailure {
            url: url.into(),
            reason: error.to_string(),
        }
    }

    pub(crate) fn status(url: impl Into<String>, status: u16) -> Self {
        CacheError::NetworkFailure {
            url: url.into(),
            reason: format!("HTTP {}", status),
        }
    }

    pub(crate) fn storage(error: BridgeError) -> Self {
        CacheError::StorageFailure(error.to_string())
    }

    /// True for failures caused by the network rather than local state.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            CacheError::NetworkFailure { .. } | CacheError::OfflineMiss { .. }
        )
    }

    /// True when retrying the same operation later may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CacheError::NetworkFailure { .. }
                | CacheError::OfflineMiss { .. }
                | CacheError::StorageFailure(_)
                | CacheError::LifecycleFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
