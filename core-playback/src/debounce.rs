//! Scroll-suppression debounce.
//!
//! While the user scrolls the verse list, automatic scroll-into-view is
//! suppressed so the two do not fight. Every scroll event re-arms the
//! window; suppression ends once the window passes with no further events.

use bridge_traits::time::Clock;
use std::sync::Arc;
use std::time::Duration;

pub struct ScrollDebounce {
    clock: Arc<dyn Clock>,
    window_ms: i64,
    last_scroll_ms: Option<i64>,
}

impl ScrollDebounce {
    pub fn new(clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            clock,
            window_ms: window.as_millis() as i64,
            last_scroll_ms: None,
        }
    }

    /// Records a scroll event.
    pub fn arm(&mut self) {
        self.last_scroll_ms = Some(self.clock.unix_timestamp_millis());
    }

    /// Whether a scroll happened within the window.
    pub fn is_suppressing(&self) -> bool {
        self.last_scroll_ms
            .map(|last| self.clock.unix_timestamp_millis() - last < self.window_ms)
            .unwrap_or(false)
    }

    pub fn reset(&mut self) {
        self.last_scroll_ms = None;
    }
}
