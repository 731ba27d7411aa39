//! Chunked reveal of an already loaded list.

use crate::loader::LoadGate;

pub const GALLERY_INITIAL: usize = 12;
pub const GALLERY_STEP: usize = 4;
pub const DETAIL_INITIAL: usize = 9;
pub const DETAIL_STEP: usize = 3;

/// The visible prefix of a list of `total` items: `initial` at first, then
/// `step` more per call to [`Reveal::reveal_more`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reveal {
  total:   usize,
  visible: usize,
  initial: usize,
  step:    usize,
}

impl Reveal {
  pub fn new(total: usize, initial: usize, step: usize) -> Self {
    Self { total, visible: initial.min(total), initial, step: step.max(1) }
  }

  pub fn gallery(total: usize) -> Self { Self::new(total, GALLERY_INITIAL, GALLERY_STEP) }

  pub fn detail(total: usize) -> Self { Self::new(total, DETAIL_INITIAL, DETAIL_STEP) }

  pub fn visible(&self) -> usize { self.visible }

  pub fn total(&self) -> usize { self.total }

  pub fn is_complete(&self) -> bool { self.visible >= self.total }

  /// Show the next step. Returns how many items became visible.
  pub fn reveal_more(&mut self) -> usize {
    let before = self.visible;
    self.visible = (self.visible + self.step).min(self.total);
    self.visible - before
  }

  /// Start over for a list of `total` items.
  pub fn reset(&mut self, total: usize) {
    self.total = total;
    self.visible = self.initial.min(total);
  }
}

impl LoadGate for Reveal {
  fn can_load(&self) -> bool { !self.is_complete() }
}
