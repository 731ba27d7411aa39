//! View state machines.
//!
//! Each view owns its controllers and turns key presses and responses into
//! [`Action`]s for the app to carry out. Nothing in here touches the terminal
//! or the network.

pub mod detail;
pub mod events;
pub mod gallery;
pub mod home;
pub mod past;
pub mod reports;

use crossterm::event::KeyCode;
use philharmonic_core::{notify::Notice, trigger::Viewport};

use crate::fetch::Request;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
  Fetch(Request),
  /// Open the detail screen for a document id.
  ShowEvent(String),
  /// Open a URL in the system browser.
  Launch(String),
  Notify(Notice),
}

/// Saturating conversion from a list index to a row number.
pub fn row(index: usize) -> u32 { u32::try_from(index).unwrap_or(u32::MAX) }

// ─── Scroll ──────────────────────────────────────────────────────────────────

/// Cursor and scroll offset of a one-row-per-entry list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scroll {
  selected: usize,
  offset:   usize,
  height:   u32,
}

impl Scroll {
  pub fn selected(&self) -> usize { self.selected }

  pub fn offset(&self) -> usize { self.offset }

  pub fn set_height(&mut self, height: u32) {
    self.height = height;
    self.follow();
  }

  pub fn viewport(&self) -> Viewport { Viewport::new(row(self.offset), self.height) }

  pub fn reset(&mut self) {
    self.selected = 0;
    self.offset = 0;
  }

  /// Move the cursor down by rows inserted above it.
  pub fn shift(&mut self, by: usize) {
    self.selected += by;
    self.follow();
  }

  /// Keep the cursor inside a list that may have shrunk.
  pub fn clamp(&mut self, len: usize) {
    self.selected = self.selected.min(len.saturating_sub(1));
    self.follow();
  }

  /// Apply a movement key. Returns whether it was one.
  pub fn handle(&mut self, code: KeyCode, len: usize) -> bool {
    let last = len.saturating_sub(1);
    let page = (self.height as usize).max(1);
    self.selected = match code {
      KeyCode::Down | KeyCode::Char('j') => (self.selected + 1).min(last),
      KeyCode::Up | KeyCode::Char('k') => self.selected.saturating_sub(1),
      KeyCode::PageDown => (self.selected + page).min(last),
      KeyCode::PageUp => self.selected.saturating_sub(page),
      KeyCode::Home | KeyCode::Char('g') => 0,
      KeyCode::End | KeyCode::Char('G') => last,
      _ => return false,
    };
    self.follow();
    true
  }

  fn follow(&mut self) {
    let height = (self.height as usize).max(1);
    if self.selected < self.offset {
      self.offset = self.selected;
    } else if self.selected >= self.offset + height {
      self.offset = self.selected + 1 - height;
    }
  }
}

#[cfg(test)]
pub mod tests {
  use chrono::{TimeZone, Utc};
  use philharmonic_core::{
    event::{EventRecord, ImageRef},
    query::Page,
  };

  use super::*;

  pub fn event(id: u64, document_id: &str) -> EventRecord {
    EventRecord {
      id,
      document_id: document_id.into(),
      title: format!("Concert {id}"),
      description: String::new(),
      location: None,
      date: Utc.with_ymd_and_hms(2025, 5, 1, 19, 0, 0).unwrap(),
      cover: None,
      images: Vec::new(),
      videos: Vec::new(),
    }
  }

  pub fn with_images(mut record: EventRecord, n: usize) -> EventRecord {
    record.images = (0..n)
      .map(|i| ImageRef::new(format!("/uploads/{}-{i}.jpg", record.id)))
      .collect();
    record
  }

  /// Page 1 of `page_count`.
  pub fn page(items: Vec<EventRecord>, page_count: u32) -> Page<EventRecord> {
    let total = items.len() as u64;
    Page { items, page_number: 1, page_count, total }
  }

  #[test]
  fn offset_follows_the_cursor() {
    let mut scroll = Scroll::default();
    scroll.set_height(3);
    for _ in 0..4 {
      scroll.handle(KeyCode::Down, 10);
    }
    assert_eq!((scroll.selected(), scroll.offset()), (4, 2));
    assert_eq!(scroll.viewport(), Viewport::new(2, 3));

    scroll.handle(KeyCode::End, 10);
    assert_eq!((scroll.selected(), scroll.offset()), (9, 7));
    scroll.handle(KeyCode::Home, 10);
    assert_eq!((scroll.selected(), scroll.offset()), (0, 0));
    assert!(!scroll.handle(KeyCode::Enter, 10));
  }

  #[test]
  fn clamping_after_the_list_shrinks() {
    let mut scroll = Scroll::default();
    scroll.set_height(2);
    scroll.handle(KeyCode::End, 8);
    scroll.clamp(3);
    assert_eq!((scroll.selected(), scroll.offset()), (2, 2));
    scroll.clamp(0);
    assert_eq!(scroll.selected(), 0);
  }
}
