//! The one-slide-at-a-time media viewer.

use std::time::{Duration, Instant};

use crate::{Error, Result};

/// Minimum time the loading indicator stays up after the slide changes.
pub const SETTLE: Duration = Duration::from_millis(280);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
  pub url:     String,
  pub caption: String,
}

impl Slide {
  pub fn new(url: impl Into<String>, caption: impl Into<String>) -> Self {
    Self { url: url.into(), caption: caption.into() }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavMode {
  /// Next from the last slide goes to the first, and back.
  Circular,
  /// Navigation stops at either end.
  Clamped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKey {
  Escape,
  Left,
  Right,
}

#[derive(Debug, Clone)]
pub struct MediaViewer {
  mode:       NavMode,
  slides:     Vec<Slide>,
  index:      usize,
  open:       bool,
  changed_at: Option<Instant>,
}

impl MediaViewer {
  pub fn new(mode: NavMode) -> Self {
    Self { mode, slides: Vec::new(), index: 0, open: false, changed_at: None }
  }

  pub fn mode(&self) -> NavMode { self.mode }

  pub fn is_open(&self) -> bool { self.open }

  pub fn index(&self) -> usize { self.index }

  pub fn slides(&self) -> &[Slide] { &self.slides }

  /// The slide on screen, if open.
  pub fn current(&self) -> Option<&Slide> {
    if self.open { self.slides.get(self.index) } else { None }
  }

  /// 1-based position and total, for the "n / total" counter.
  pub fn position(&self) -> Option<(usize, usize)> {
    self.current().map(|_| (self.index + 1, self.slides.len()))
  }

  fn touch(&mut self) { self.changed_at = Some(Instant::now()); }

  pub fn open(&mut self, slides: Vec<Slide>, index: usize) -> Result<()> {
    if slides.is_empty() {
      return Err(Error::EmptySlides);
    }
    if index >= slides.len() {
      return Err(Error::SlideOutOfRange { index, len: slides.len() });
    }
    self.slides = slides;
    self.index = index;
    self.open = true;
    self.touch();
    Ok(())
  }

  pub fn close(&mut self) { self.open = false; }

  pub fn next(&mut self) {
    if !self.open {
      return;
    }
    let last = self.slides.len() - 1;
    let target = match (self.mode, self.index >= last) {
      (NavMode::Circular, true) => 0,
      (NavMode::Clamped, true) => last,
      (_, false) => self.index + 1,
    };
    self.go_to(target);
  }

  pub fn prev(&mut self) {
    if !self.open {
      return;
    }
    let target = match (self.mode, self.index) {
      (NavMode::Circular, 0) => self.slides.len() - 1,
      (NavMode::Clamped, 0) => 0,
      (_, i) => i - 1,
    };
    self.go_to(target);
  }

  fn go_to(&mut self, index: usize) {
    if index != self.index {
      self.index = index;
      self.touch();
    }
  }

  pub fn handle_key(&mut self, key: ViewerKey) {
    match key {
      ViewerKey::Escape => self.close(),
      ViewerKey::Left => self.prev(),
      ViewerKey::Right => self.next(),
    }
  }

  /// Swap the slide list while keeping the viewer state. An index that no
  /// longer exists falls back to the first slide; an empty list closes.
  pub fn replace_slides(&mut self, slides: Vec<Slide>) {
    let count_changed = slides.len() != self.slides.len();
    self.slides = slides;
    if self.slides.is_empty() {
      self.open = false;
      self.index = 0;
      return;
    }
    if self.index >= self.slides.len() {
      self.index = 0;
      self.touch();
    } else if count_changed {
      self.touch();
    }
  }

  /// Whether the loading indicator should still show at `now`.
  pub fn is_settling(&self, now: Instant) -> bool {
    self.open
      && self
        .changed_at
        .is_some_and(|at| now.saturating_duration_since(at) < SETTLE)
  }
}
