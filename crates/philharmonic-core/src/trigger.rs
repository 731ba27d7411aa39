//! Scroll-position triggers for incremental loading.
//!
//! Positions are list rows. A [`VisibilityTrigger`] watches one sentinel row
//! (normally the row just past the last item) and fires when it comes within
//! `margin` rows below the visible area. It is level-triggered and consults a
//! [`LoadGate`] on every check, so repeated checks while a load is outstanding
//! never produce a second request.
//!
//! Triggers are plain values owned by their view; dropping the view unbinds
//! them.

use std::time::{Duration, Instant};

use crate::loader::LoadGate;

pub const PAST_MARGIN: u32 = 8;
pub const GALLERY_MARGIN: u32 = 6;

/// The visible slice of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
  /// First visible row.
  pub offset: u32,
  /// Number of visible rows.
  pub height: u32,
}

impl Viewport {
  pub fn new(offset: u32, height: u32) -> Self { Self { offset, height } }

  /// One past the last visible row.
  pub fn end(&self) -> u32 { self.offset.saturating_add(self.height) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityTrigger {
  margin:   u32,
  sentinel: Option<u32>,
}

impl VisibilityTrigger {
  pub fn new(margin: u32) -> Self { Self { margin, sentinel: None } }

  /// Watch `row`. Re-binding after the list grows simply moves the sentinel.
  pub fn bind(&mut self, row: u32) { self.sentinel = Some(row); }

  pub fn unbind(&mut self) { self.sentinel = None; }

  pub fn sentinel(&self) -> Option<u32> { self.sentinel }

  pub fn margin(&self) -> u32 { self.margin }

  /// Whether the sentinel is inside the viewport extended by the margin.
  pub fn in_range(&self, viewport: Viewport) -> bool {
    self.sentinel.is_some_and(|row| {
      row >= viewport.offset && row < viewport.end().saturating_add(self.margin)
    })
  }

  /// Whether a load should be requested now.
  pub fn check(&self, viewport: Viewport, gate: &impl LoadGate) -> bool {
    self.in_range(viewport) && gate.can_load()
  }
}

// ─── Fast scroll ─────────────────────────────────────────────────────────────

/// Rows per second above which a scroll counts as fast.
pub const FAST_SCROLL_SPEED: f64 = 40.0;
/// Distance from the end of the list within which fast scrolls fire.
pub const FAST_SCROLL_ROWS: u32 = 3;

/// Fallback for scrolls that jump past the sentinel between two frames.
#[derive(Debug, Clone, Default)]
pub struct FastScroll {
  last: Option<(Instant, u32)>,
}

impl FastScroll {
  pub fn new() -> Self { Self::default() }

  /// Record a scroll position and report whether it warrants a load.
  pub fn observe(
    &mut self,
    viewport: Viewport,
    content_rows: u32,
    now: Instant,
    gate: &impl LoadGate,
  ) -> bool {
    let previous = self.last.replace((now, viewport.offset));
    let Some((then, offset)) = previous else {
      return false;
    };
    let elapsed = now.saturating_duration_since(then).max(Duration::from_millis(1));
    let moved = viewport.offset.abs_diff(offset) as f64;
    let speed = moved / elapsed.as_secs_f64();
    let near_end = viewport.end().saturating_add(FAST_SCROLL_ROWS) >= content_rows;
    speed > FAST_SCROLL_SPEED && near_end && gate.can_load()
  }
}
