//! # Verse Timing
//!
//! A [`TimingTable`] maps verse positions to the millisecond offset where the
//! recitation of that verse starts. Timing files are JSON arrays indexed by
//! verse position; `null` marks a verse without a known start:
//!
//! ```json
//! [0, 5000, null, 12000]
//! ```
//!
//! Tables are immutable and scoped to one (recitation, narrator) pair.

use crate::error::{PlaybackError, Result};
use bridge_traits::http::{HttpClient, HttpRequest};
use bridge_traits::render::VerseTiming;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimingTable {
    /// Ascending by verse and non-decreasing by offset.
    entries: Vec<VerseTiming>,
}

impl TimingTable {
    /// Builds a table from per-verse offsets.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::TimingLoadFailure`] if a known offset is smaller than
    /// the one of an earlier verse.
    pub fn from_offsets(offsets: Vec<Option<u64>>) -> Result<Self> {
        let mut entries: Vec<VerseTiming> = Vec::with_capacity(offsets.len());

        for (verse, offset) in offsets.into_iter().enumerate() {
            let Some(offset_ms) = offset else { continue };
            if let Some(previous) = entries.last() {
                if offset_ms < previous.offset_ms {
                    return Err(PlaybackError::TimingLoadFailure(format!(
                        "offset of verse {} ({} ms) precedes verse {} ({} ms)",
                        verse, offset_ms, previous.verse, previous.offset_ms
                    )));
                }
            }
            entries.push(VerseTiming { verse, offset_ms });
        }

        Ok(Self { entries })
    }

    /// The verse being recited at `position_ms`.
    ///
    /// That is the verse with the greatest offset not exceeding the position;
    /// among verses sharing that offset, the last one. `None` before the
    /// first offset.
    pub fn active_verse(&self, position_ms: u64) -> Option<usize> {
        let after = self
            .entries
            .partition_point(|entry| entry.offset_ms <= position_ms);
        after.checked_sub(1).map(|index| self.entries[index].verse)
    }

    pub fn offset_of(&self, verse: usize) -> Option<u64> {
        self.entries
            .binary_search_by_key(&verse, |entry| entry.verse)
            .ok()
            .map(|index| self.entries[index].offset_ms)
    }

    pub fn entries(&self) -> &[VerseTiming] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetches timing files relative to the app base URL.
pub struct TimingLoader {
    http_client: Arc<dyn HttpClient>,
    base_url: Url,
}

impl TimingLoader {
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: Url) -> Self {
        Self {
            http_client,
            base_url,
        }
    }

    /// `<base>/data/<recitation>/timings_<timing_key>.json`
    pub fn timing_url(&self, recitation: &str, timing_key: &str) -> Result<Url> {
        self.base_url
            .join(&format!("data/{}/timings_{}.json", recitation, timing_key))
            .map_err(|e| PlaybackError::TimingLoadFailure(e.to_string()))
    }

    /// Loads the table for a narrator, degrading every failure to `None`.
    pub async fn load(&self, recitation: &str, timing_key: Option<&str>) -> Option<TimingTable> {
        match self.try_load(recitation, timing_key).await {
            Ok(table) => Some(table),
            Err(e) => {
                warn!(recitation, timing_key, error = %e, "Timing unavailable; highlighting disabled");
                None
            }
        }
    }

    pub async fn try_load(&self, recitation: &str, timing_key: Option<&str>) -> Result<TimingTable> {
        let timing_key = timing_key.ok_or_else(|| {
            PlaybackError::TimingLoadFailure("narrator has no timing key".to_string())
        })?;
        let url = self.timing_url(recitation, timing_key)?;

        let response = self
            .http_client
            .execute(HttpRequest::get(url.as_str()))
            .await
            .map_err(|e| PlaybackError::TimingLoadFailure(e.to_string()))?;

        if !response.is_success() {
            return Err(PlaybackError::TimingLoadFailure(format!(
                "timings file not found at {} (HTTP {})",
                url, response.status
            )));
        }

        let raw: Vec<Option<f64>> = response
            .json()
            .map_err(|e| PlaybackError::TimingLoadFailure(e.to_string()))?;
        let offsets = raw
            .into_iter()
            .enumerate()
            .map(|(verse, offset)| offset.map(|ms| whole_millis(verse, ms)).transpose())
            .collect::<Result<Vec<_>>>()?;
        let table = TimingTable::from_offsets(offsets)?;

        debug!(recitation, timing_key, verses = table.len(), "Loaded timings");
        Ok(table)
    }
}

/// Timing files may carry fractional milliseconds; the fraction is dropped.
fn whole_millis(verse: usize, ms: f64) -> Result<u64> {
    if !ms.is_finite() || ms < 0.0 {
        return Err(PlaybackError::TimingLoadFailure(format!(
            "offset of verse {} is not a valid time: {}",
            verse, ms
        )));
    }
    Ok(ms.trunc() as u64)
}
