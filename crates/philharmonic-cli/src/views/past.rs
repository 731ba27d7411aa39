//! Past events: an infinite list, newest first.
//!
//! The sentinel sits one row past the last loaded event. A fast jump towards
//! the end (PageDown held, End) can skip the trigger range between two checks,
//! so a [`FastScroll`] watches the scroll speed as well. Both consult the same
//! loader, so a gesture that trips both still yields one request.

use std::time::Instant;

use chrono::{DateTime, Utc};
use crossterm::event::KeyCode;
use philharmonic_core::{
  CollectionLoader, Completion, PageTicket, Result,
  event::EventRecord,
  locale::Locale,
  query::Page,
  scope::{self, PAST_PAGE_SIZE},
  trigger::{FastScroll, PAST_MARGIN, VisibilityTrigger},
};

use super::{Action, Scroll, row};
use crate::fetch::{Feed, Request};

#[derive(Debug, Clone)]
pub struct PastView {
  loader:  CollectionLoader,
  scroll:  Scroll,
  trigger: VisibilityTrigger,
  fast:    FastScroll,
}

impl PastView {
  pub fn new(now: DateTime<Utc>, locale: Locale) -> Self {
    Self {
      loader:  CollectionLoader::new(scope::past(now, locale), PAST_PAGE_SIZE),
      scroll:  Scroll::default(),
      trigger: VisibilityTrigger::new(PAST_MARGIN),
      fast:    FastScroll::new(),
    }
  }

  pub fn loader(&self) -> &CollectionLoader { &self.loader }

  pub fn scroll(&self) -> &Scroll { &self.scroll }

  pub fn set_height(&mut self, height: u32) { self.scroll.set_height(height); }

  pub fn start(&mut self) -> Vec<Action> { self.fetch() }

  pub fn reset(&mut self, now: DateTime<Utc>, locale: Locale) -> Vec<Action> {
    self.loader.reset(scope::past(now, locale));
    self.scroll.reset();
    self.fast = FastScroll::new();
    self.fetch()
  }

  fn fetch(&mut self) -> Vec<Action> {
    self
      .loader
      .begin_next()
      .map(|ticket| Action::Fetch(Request::Page { feed: Feed::Past, ticket }))
      .into_iter()
      .collect()
  }

  /// Check both triggers against the current scroll position.
  pub fn poll(&mut self, now: Instant) -> Vec<Action> {
    let len = self.loader.items().len();
    let viewport = self.scroll.viewport();
    self.trigger.bind(row(len));
    let near = self.trigger.check(viewport, &self.loader);
    let fast = self.fast.observe(viewport, row(len), now, &self.loader);
    if near || fast {
      tracing::debug!(near, fast, rows = len, "past events trigger");
      self.fetch()
    } else {
      Vec::new()
    }
  }

  /// Successful pages re-check the trigger, since a short page may leave the
  /// sentinel in view.
  pub fn complete(
    &mut self,
    ticket: PageTicket,
    result: Result<Page<EventRecord>>,
  ) -> Result<Vec<Action>> {
    match self.loader.complete(ticket, result)? {
      Completion::Appended { .. } => Ok(self.poll(Instant::now())),
      _ => Ok(Vec::new()),
    }
  }

  pub fn handle_key(&mut self, code: KeyCode, now: Instant) -> Vec<Action> {
    let items = self.loader.items();
    if code == KeyCode::Enter {
      return items
        .get(self.scroll.selected())
        .map(|e| Action::ShowEvent(e.document_id.clone()))
        .into_iter()
        .collect();
    }
    if self.scroll.handle(code, items.len()) {
      return self.poll(now);
    }
    Vec::new()
  }
}
