//! Transport arithmetic shared by every seek path.

use crate::error::{PlaybackError, Result};

/// Clamps a seek target to `[0, duration]`.
///
/// With an unknown duration (live or still loading), only the lower bound
/// applies.
pub fn clamp_position(target_ms: i64, duration_ms: Option<u64>) -> u64 {
    let floor = target_ms.max(0) as u64;
    match duration_ms {
        Some(duration) => floor.min(duration),
        None => floor,
    }
}

/// Accepts finite, positive playback rates.
pub fn validate_rate(rate: f64) -> Result<f64> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(PlaybackError::InvalidRate(rate))
    }
}

/// Position for a progress-bar fraction, when the duration is known.
pub fn fraction_to_position(fraction: f64, duration_ms: Option<u64>) -> Option<u64> {
    let duration = duration_ms?;
    if !fraction.is_finite() {
        return None;
    }
    Some((fraction.clamp(0.0, 1.0) * duration as f64).round() as u64)
}
