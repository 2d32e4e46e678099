//! Playback bridge traits and supporting audio types.
//!
//! The host owns the actual audio element (an HTML media element, a native
//! player, ...). The core playback engine drives it through
//! [`AudioTransport`] from the foreground event loop and receives position,
//! end-of-stream and error notifications back from the host.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Classification of a media failure reported by the host audio element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaErrorKind {
    /// Playback was aborted by the user agent.
    Aborted,
    /// The media could not be fetched.
    Network,
    /// The media is malformed or truncated.
    Decode,
    /// The source format is not supported by the host.
    SourceNotSupported,
    /// The host did not classify the failure.
    Unknown,
}

impl MediaErrorKind {
    /// Map a numeric `MediaError.code` as reported by web hosts.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => MediaErrorKind::Aborted,
            2 => MediaErrorKind::Network,
            3 => MediaErrorKind::Decode,
            4 => MediaErrorKind::SourceNotSupported,
            _ => MediaErrorKind::Unknown,
        }
    }

    /// Whether the user can recover by retrying or switching narrators
    /// without the transport having to be reset.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MediaErrorKind::Aborted | MediaErrorKind::Network)
    }
}

impl fmt::Display for MediaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MediaErrorKind::Aborted => "playback aborted",
            MediaErrorKind::Network => "network error while loading audio",
            MediaErrorKind::Decode => "audio could not be decoded",
            MediaErrorKind::SourceNotSupported => "audio format not supported",
            MediaErrorKind::Unknown => "unknown media error",
        };
        f.write_str(text)
    }
}

/// The host audio element.
///
/// All positions are in milliseconds. Implementations report progress back
/// to the engine themselves; these methods only issue commands.
pub trait AudioTransport: Send {
    /// Whether enough metadata is loaded for seeking to be meaningful.
    fn is_ready(&self) -> bool;

    /// Total duration of the current source, when known.
    fn duration_ms(&self) -> Option<u64>;

    /// Current playback position.
    fn position_ms(&self) -> u64;

    /// Move the playhead.
    fn set_position_ms(&mut self, position_ms: u64);

    /// Apply a playback rate multiplier.
    fn set_rate(&mut self, rate: f64);

    /// Start or resume playback.
    ///
    /// # Errors
    ///
    /// Returns an error when the host refuses to start (autoplay policy,
    /// missing source, ...).
    fn play(&mut self) -> Result<()>;

    /// Pause playback, keeping the position.
    fn pause(&mut self);

    /// Whether playback is currently paused.
    fn is_paused(&self) -> bool;

    /// Replace the current source. The host starts loading it but does not
    /// start playback.
    fn set_source(&mut self, url: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_error_codes_map_to_kinds() {
        assert_eq!(MediaErrorKind::from_code(1), MediaErrorKind::Aborted);
        assert_eq!(MediaErrorKind::from_code(2), MediaErrorKind::Network);
        assert_eq!(MediaErrorKind::from_code(3), MediaErrorKind::Decode);
        assert_eq!(MediaErrorKind::from_code(4), MediaErrorKind::SourceNotSupported);
        assert_eq!(MediaErrorKind::from_code(42), MediaErrorKind::Unknown);
    }

    #[test]
    fn test_decode_errors_are_not_recoverable() {
        assert!(MediaErrorKind::Network.is_recoverable());
        assert!(!MediaErrorKind::Decode.is_recoverable());
        assert_eq!(
            MediaErrorKind::Decode.to_string(),
            "audio could not be decoded"
        );
    }
}
