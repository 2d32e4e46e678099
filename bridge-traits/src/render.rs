//! Verse rendering collaborator.
//!
//! Rendering the verse list itself is a host concern. The core only needs to
//! annotate verses with their timing, move the highlight and occasionally
//! bring a verse into view.

use serde::{Deserialize, Serialize};

/// Timing attribute attached to a rendered verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseTiming {
    /// Zero-based verse position.
    pub verse: usize,
    /// Recitation start offset in milliseconds.
    pub offset_ms: u64,
}

/// Host-side verse list.
///
/// Driven from the foreground loop only, hence `&mut self` and no `Sync`.
pub trait VerseRenderer: Send {
    /// Replace the timing attributes of every verse. Verses absent from
    /// `timings` lose their attribute and become non-interactive.
    fn apply_timings(&mut self, timings: &[VerseTiming]);

    /// Move the highlight to `verse`, or clear it with `None`.
    fn set_highlight(&mut self, verse: Option<usize>);

    /// Scroll so that `verse` is visible.
    fn scroll_into_view(&mut self, verse: usize);
}
