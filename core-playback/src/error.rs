//! # Playback Error Types
//!
//! Errors surfaced by timing loading and the playback sync engine. None of
//! them is fatal: the engine reports them and keeps running.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during synchronized playback.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// The audio could not be fetched.
    #[error("Network error while loading audio: {0}")]
    NetworkFailure(String),

    /// The audio is malformed or in an unsupported format.
    #[error("Audio could not be decoded: {0}")]
    DecodeFailure(String),

    /// No source is loaded, or it has no metadata yet.
    #[error("No audio source is ready")]
    NoSource,

    // ========================================================================
    // Timing Errors
    // ========================================================================
    /// The timing file is missing, unreadable or not monotonic.
    #[error("Timing unavailable: {0}")]
    TimingLoadFailure(String),

    // ========================================================================
    // Control Errors
    // ========================================================================
    /// Playback rate must be finite and positive.
    #[error("Invalid playback rate: {0}")]
    InvalidRate(f64),

    /// The host transport refused a command.
    #[error("Transport error: {0}")]
    Transport(#[from] BridgeError),
}

impl PlaybackError {
    /// Returns `true` if the user can retry without the transport being reset.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlaybackError::NetworkFailure(_)
                | PlaybackError::NoSource
                | PlaybackError::TimingLoadFailure(_)
                | PlaybackError::Transport(_)
        )
    }

    /// Returns `true` if this error is due to network issues.
    pub fn is_network_error(&self) -> bool {
        matches!(self, PlaybackError::NetworkFailure(_))
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
