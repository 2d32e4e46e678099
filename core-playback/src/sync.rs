//! # Playback Sync Engine
//!
//! Keeps the rendered verse list in lock-step with the audio position.
//!
//! ## States
//!
//! ```text
//!             set_timing(Some)            on_position
//! NoTiming ───────────────────> Loaded ───────────────> Active
//!    ^                            ^                       │
//!    └──── set_timing(None) ──────┴──── on_ended / ───────┘
//!                                       set_timing
//! ```
//!
//! Without a timing table nothing is highlighted and verse clicks are
//! inert. The engine is driven from a single foreground loop; every method
//! takes `&mut self` and there is no internal locking.

use crate::config::SyncConfig;
use crate::debounce::ScrollDebounce;
use crate::error::{PlaybackError, Result};
use crate::timing::TimingTable;
use crate::transport::{clamp_position, fraction_to_position, validate_rate};
use bridge_traits::playback::{AudioTransport, MediaErrorKind};
use bridge_traits::render::VerseRenderer;
use bridge_traits::time::Clock;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No timing table; highlighting is disabled.
    NoTiming,
    /// A table is loaded but no position update has arrived yet.
    Loaded,
    /// Position updates are driving the highlight.
    Active,
}

/// Snapshot derived from the transport and engine on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackCursor {
    pub position_ms: u64,
    /// The user is scrolling; automatic scroll-into-view is held back.
    pub suppressed: bool,
    pub highlighted: Option<usize>,
}

pub struct PlaybackSyncEngine {
    transport: Box<dyn AudioTransport>,
    renderer: Box<dyn VerseRenderer>,
    debounce: ScrollDebounce,
    timing: Option<TimingTable>,
    state: SyncState,
    highlighted: Option<usize>,
    /// Verse last brought into view; `None` after the user scrolled away.
    scrolled: Option<usize>,
    looping: bool,
    source: Option<String>,
    rate: f64,
    seek_step_ms: i64,
    event_bus: Option<EventBus>,
}

impl PlaybackSyncEngine {
    pub fn new(
        transport: Box<dyn AudioTransport>,
        renderer: Box<dyn VerseRenderer>,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
    ) -> Self {
        let rate = validate_rate(config.initial_rate).unwrap_or(1.0);
        Self {
            transport,
            renderer,
            debounce: ScrollDebounce::new(clock, config.scroll_debounce),
            timing: None,
            state: SyncState::NoTiming,
            highlighted: None,
            scrolled: None,
            looping: false,
            source: None,
            rate,
            seek_step_ms: config.seek_step.as_millis() as i64,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    // ========================================================================
    // Position
    // ========================================================================

    /// Natural playback progress reported by the transport.
    pub fn on_position(&mut self, position_ms: u64) {
        let Some(timing) = &self.timing else {
            return;
        };
        self.state = SyncState::Active;

        let verse = timing.active_verse(position_ms);
        if verse != self.highlighted {
            self.highlighted = verse;
            self.renderer.set_highlight(verse);
            self.emit(PlaybackEvent::VerseActivated { verse, position_ms });
        }

        // Held back while the user scrolls; caught up on the first update after.
        if let Some(verse) = self.highlighted {
            if self.scrolled != Some(verse) && !self.debounce.is_suppressing() {
                self.renderer.scroll_into_view(verse);
                self.scrolled = Some(verse);
            }
        }
    }

    /// The user scrolled the verse list.
    pub fn on_user_scroll(&mut self) {
        self.debounce.arm();
        self.scrolled = None;
    }

    // ========================================================================
    // Seeking
    // ========================================================================

    /// Moves the playhead to `target_ms`, clamped to `[0, duration]`.
    ///
    /// Returns the position actually applied.
    pub fn seek_to(&mut self, target_ms: i64) -> Result<u64> {
        if !self.transport.is_ready() {
            return Err(PlaybackError::NoSource);
        }

        let position = clamp_position(target_ms, self.transport.duration_ms());
        self.transport.set_position_ms(position);
        self.on_position(position);
        Ok(position)
    }

    pub fn seek_relative(&mut self, delta_ms: i64) -> Result<u64> {
        let current = self.transport.position_ms() as i64;
        self.seek_to(current.saturating_add(delta_ms))
    }

    pub fn skip_forward(&mut self) -> Result<u64> {
        self.seek_relative(self.seek_step_ms)
    }

    pub fn skip_backward(&mut self) -> Result<u64> {
        self.seek_relative(-self.seek_step_ms)
    }

    /// Seeks to a fraction of the duration (progress bar). Does nothing
    /// while the duration is unknown.
    pub fn seek_to_fraction(&mut self, fraction: f64) -> Result<Option<u64>> {
        if !self.transport.is_ready() {
            return Err(PlaybackError::NoSource);
        }

        match fraction_to_position(fraction, self.transport.duration_ms()) {
            Some(position) => self.seek_to(position as i64).map(Some),
            None => Ok(None),
        }
    }

    // ========================================================================
    // Transport Controls
    // ========================================================================

    /// Starts or pauses playback. Returns whether audio is now playing.
    pub fn toggle_play(&mut self) -> Result<bool> {
        if !self.transport.is_paused() {
            self.transport.pause();
            return Ok(false);
        }
        if self.source.is_none() {
            return Err(PlaybackError::NoSource);
        }
        self.transport.play()?;
        Ok(true)
    }

    pub fn set_rate(&mut self, rate: f64) -> Result<()> {
        let rate = validate_rate(rate)?;
        self.rate = rate;
        self.transport.set_rate(rate);
        let position = self.transport.position_ms();
        self.on_position(position);
        Ok(())
    }

    pub fn toggle_loop(&mut self) -> bool {
        self.looping = !self.looping;
        self.looping
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// End of stream.
    pub fn on_ended(&mut self) -> Result<()> {
        if self.looping {
            self.transport.set_position_ms(0);
            self.on_position(0);
            self.emit(PlaybackEvent::Looped);
            return self.transport.play().map_err(PlaybackError::from);
        }

        self.clear_highlight();
        if self.timing.is_some() {
            self.state = SyncState::Loaded;
        }
        self.emit(PlaybackEvent::Completed);
        Ok(())
    }

    // ========================================================================
    // Verses & Sources
    // ========================================================================

    /// Highlights `verse` and seeks to its start when the audio is ready.
    ///
    /// Returns `false` when the verse has no timing (or there is no table),
    /// in which case nothing changes.
    pub fn on_verse_clicked(&mut self, verse: usize) -> bool {
        let Some(offset_ms) = self.timing.as_ref().and_then(|t| t.offset_of(verse)) else {
            return false;
        };

        if self.highlighted != Some(verse) {
            self.highlighted = Some(verse);
            self.renderer.set_highlight(Some(verse));
            self.emit(PlaybackEvent::VerseActivated {
                verse: Some(verse),
                position_ms: offset_ms,
            });
        }

        if self.transport.is_ready() {
            self.transport.set_position_ms(offset_ms);
            self.state = SyncState::Active;
        } else {
            debug!(verse, "Audio not ready; highlight only");
        }
        true
    }

    /// Replaces the timing table wholesale and resets the highlight.
    ///
    /// An empty table is treated like no table.
    pub fn set_timing(&mut self, timing: Option<TimingTable>) {
        self.timing = timing.filter(|table| !table.is_empty());

        let entries = self
            .timing
            .as_ref()
            .map(|table| table.entries())
            .unwrap_or(&[]);
        self.renderer.apply_timings(entries);
        self.clear_highlight();

        self.state = if self.timing.is_some() {
            SyncState::Loaded
        } else {
            SyncState::NoTiming
        };
    }

    /// Points the transport at `url` unless it is already the source.
    ///
    /// Returns whether the source changed.
    pub fn load_source(&mut self, url: &str) -> bool {
        if self.source.as_deref() == Some(url) {
            return false;
        }

        self.transport.pause();
        self.transport.set_source(url);
        self.transport.set_position_ms(0);
        self.transport.set_rate(self.rate);
        self.source = Some(url.to_string());
        self.clear_highlight();

        self.emit(PlaybackEvent::SourceChanged {
            source: url.to_string(),
        });
        true
    }

    /// Classifies a host media error. Fatal kinds reset the transport to
    /// stopped; the returned error is meant for display.
    pub fn on_media_error(&mut self, kind: MediaErrorKind) -> PlaybackError {
        let recoverable = kind.is_recoverable();
        let err = if recoverable {
            warn!(%kind, "Recoverable media error");
            PlaybackError::NetworkFailure(kind.to_string())
        } else {
            error!(%kind, "Media error; stopping playback");
            self.transport.pause();
            self.clear_highlight();
            if self.timing.is_some() {
                self.state = SyncState::Loaded;
            }
            PlaybackError::DecodeFailure(kind.to_string())
        };

        self.emit(PlaybackEvent::Error {
            message: err.to_string(),
            recoverable,
        });
        err
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn cursor(&self) -> PlaybackCursor {
        PlaybackCursor {
            position_ms: self.transport.position_ms(),
            suppressed: self.debounce.is_suppressing(),
            highlighted: self.highlighted,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn timing(&self) -> Option<&TimingTable> {
        self.timing.as_ref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    fn clear_highlight(&mut self) {
        self.scrolled = None;
        if self.highlighted.take().is_some() {
            self.renderer.set_highlight(None);
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(event_bus) = &self.event_bus {
            event_bus.emit(CoreEvent::Playback(event)).ok();
        }
    }
}
