//! The incremental collection loader.
//!
//! A loader owns one paginated query: the cursor of the next page to fetch,
//! the items accumulated so far, and whether more pages exist. Requests are
//! split in two halves so they can run on another task:
//!
//! 1. [`CollectionLoader::begin_next`] marks the loader as fetching and hands
//!    out a [`PageTicket`] describing the request, or nothing when a request is
//!    already outstanding or the collection is exhausted.
//! 2. [`CollectionLoader::complete`] applies the response for that ticket.
//!
//! Every [`reset`](CollectionLoader::reset) bumps the loader's generation. A
//! ticket from an older generation completes as [`Completion::Stale`] and does
//! not touch the loader.

use crate::{
  Result,
  event::EventRecord,
  query::{EventQuery, Page, PageCursor, PageRequest},
  source::ContentSource,
};

/// Anything that decides whether a visibility trigger may request more.
pub trait LoadGate {
  fn can_load(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderPhase {
  Idle,
  Fetching,
  Exhausted,
}

/// A dispatched page request, valid for the generation that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTicket {
  generation: u64,
  request:    PageRequest,
}

impl PageTicket {
  pub fn request(&self) -> &PageRequest { &self.request }

  pub fn generation(&self) -> u64 { self.generation }
}

/// What happened when a page was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
  /// Nothing was requested: already fetching or exhausted.
  Skipped,
  Appended { count: usize, has_more: bool },
  /// The loader was reset after the request was dispatched.
  Stale,
}

#[derive(Debug, Clone)]
pub struct CollectionLoader {
  query:      EventQuery,
  cursor:     PageCursor,
  items:      Vec<EventRecord>,
  has_more:   bool,
  in_flight:  bool,
  generation: u64,
}

impl CollectionLoader {
  pub fn new(query: EventQuery, page_size: u32) -> Self {
    Self {
      query,
      cursor: PageCursor::first(page_size),
      items: Vec::new(),
      has_more: true,
      in_flight: false,
      generation: 0,
    }
  }

  pub fn query(&self) -> &EventQuery { &self.query }

  /// Cursor of the next page to request.
  pub fn cursor(&self) -> PageCursor { self.cursor }

  pub fn items(&self) -> &[EventRecord] { &self.items }

  pub fn has_more(&self) -> bool { self.has_more }

  pub fn is_fetching(&self) -> bool { self.in_flight }

  pub fn generation(&self) -> u64 { self.generation }

  pub fn phase(&self) -> LoaderPhase {
    if self.in_flight {
      LoaderPhase::Fetching
    } else if self.has_more {
      LoaderPhase::Idle
    } else {
      LoaderPhase::Exhausted
    }
  }

  /// Dispatch the next page if the loader is idle.
  pub fn begin_next(&mut self) -> Option<PageTicket> {
    if self.phase() != LoaderPhase::Idle {
      return None;
    }
    self.in_flight = true;
    tracing::debug!(
      page = self.cursor.page_number(),
      generation = self.generation,
      "requesting page"
    );
    Some(PageTicket {
      generation: self.generation,
      request:    PageRequest::new(self.query.clone(), self.cursor),
    })
  }

  /// Apply the outcome of `ticket`.
  ///
  /// A failure for the current generation returns the loader to idle with its
  /// cursor and items unchanged, so the next trigger retries the same page.
  pub fn complete(
    &mut self,
    ticket: PageTicket,
    result: Result<Page<EventRecord>>,
  ) -> Result<Completion> {
    if ticket.generation != self.generation {
      tracing::debug!(
        ticket = ticket.generation,
        current = self.generation,
        "discarding stale page"
      );
      return Ok(Completion::Stale);
    }
    self.in_flight = false;
    let page = result?;

    let has_more = page.has_more();
    let count = page.items.len();
    self.items.extend(page.items);
    self.has_more = has_more;
    self.cursor = self.cursor.advanced();
    Ok(Completion::Appended { count, has_more })
  }

  /// Replace the query and start over from page 1. Any outstanding ticket
  /// becomes stale.
  pub fn reset(&mut self, query: EventQuery) {
    self.generation += 1;
    self.query = query;
    self.cursor = PageCursor::first(self.cursor.page_size());
    self.items.clear();
    self.has_more = true;
    self.in_flight = false;
  }

  /// Fetch and apply the next page from `source`.
  pub async fn load_next<S>(&mut self, source: &S) -> Result<Completion>
  where
    S: ContentSource + ?Sized,
  {
    let Some(ticket) = self.begin_next() else {
      return Ok(Completion::Skipped);
    };
    let result = source.fetch_page(ticket.request()).await;
    self.complete(ticket, result)
  }
}

impl LoadGate for CollectionLoader {
  fn can_load(&self) -> bool { self.phase() == LoaderPhase::Idle }
}

#[cfg(test)]
mod tests {
  use std::{sync::Arc, time::Duration};

  use tokio::sync::Mutex;

  use super::*;
  use crate::{
    Error,
    locale::Locale,
    query::{Comparison, Filter, SortKey},
    testing::{MockSource, at, event},
  };

  fn query() -> EventQuery {
    EventQuery::new(Locale::En).sort(SortKey::date_desc())
  }

  fn events(n: u64) -> Vec<EventRecord> {
    (1..=n).map(|i| event(i, at(2024, 1, i as u32))).collect()
  }

  #[tokio::test]
  async fn serial_loads_accumulate_every_page() {
    let source = MockSource::new(events(7));
    let mut loader = CollectionLoader::new(query(), 3);

    let mut appended = 0;
    while loader.has_more() {
      match loader.load_next(&source).await.unwrap() {
        Completion::Appended { count, .. } => appended += count,
        other => panic!("unexpected {other:?}"),
      }
    }
    assert_eq!(appended, 7);
    assert_eq!(loader.items().len(), 7);
    let mut ids: Vec<u64> = loader.items().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![7, 6, 5, 4, 3, 2, 1]);
    ids.dedup();
    assert_eq!(ids.len(), 7);
    assert_eq!(source.calls(), 3);
    assert_eq!(loader.cursor().page_number(), 4);
  }

  #[tokio::test]
  async fn exhausted_loader_ignores_further_loads() {
    let source = MockSource::new(events(2));
    let mut loader = CollectionLoader::new(query(), 2);
    assert_eq!(
      loader.load_next(&source).await.unwrap(),
      Completion::Appended { count: 2, has_more: false }
    );
    assert_eq!(loader.phase(), LoaderPhase::Exhausted);
    assert_eq!(loader.load_next(&source).await.unwrap(), Completion::Skipped);
    assert_eq!(source.calls(), 1);
  }

  #[tokio::test]
  async fn short_last_page_ends_the_collection() {
    let source = MockSource::new(vec![]);
    let two = vec![event(1, at(2024, 1, 1)), event(2, at(2024, 1, 2))];
    source.script(Ok(Page { items: two, page_number: 1, page_count: 2, total: 3 }));
    source.script(Ok(Page {
      items:       vec![event(3, at(2024, 1, 3))],
      page_number: 2,
      page_count:  2,
      total:       3,
    }));
    let mut loader = CollectionLoader::new(query(), 2);

    loader.load_next(&source).await.unwrap();
    assert!(loader.has_more());
    loader.load_next(&source).await.unwrap();
    assert_eq!(loader.items().len(), 3);
    assert!(!loader.has_more());
  }

  #[tokio::test]
  async fn empty_page_ends_the_collection() {
    let source = MockSource::new(vec![]);
    source.script(Ok(Page { items: vec![], page_number: 1, page_count: 5, total: 0 }));
    let mut loader = CollectionLoader::new(query(), 2);
    loader.load_next(&source).await.unwrap();
    assert_eq!(loader.phase(), LoaderPhase::Exhausted);
  }

  #[test]
  fn only_one_ticket_is_outstanding() {
    let mut loader = CollectionLoader::new(query(), 4);
    let ticket = loader.begin_next();
    assert!(ticket.is_some());
    assert!(loader.begin_next().is_none());
    assert!(!loader.can_load());
  }

  #[tokio::test]
  async fn concurrent_callers_share_one_request() {
    let source = Arc::new(MockSource::new(events(8)).with_delay(Duration::from_millis(20)));
    let loader = Arc::new(Mutex::new(CollectionLoader::new(query(), 4)));

    let tickets: Vec<_> = {
      let mut guard = loader.lock().await;
      (0..3).filter_map(|_| guard.begin_next()).collect()
    };
    assert_eq!(tickets.len(), 1);

    let mut tasks = Vec::new();
    for ticket in tickets {
      let source = source.clone();
      let loader = loader.clone();
      tasks.push(tokio::spawn(async move {
        let result = source.fetch_page(ticket.request()).await;
        loader.lock().await.complete(ticket, result)
      }));
    }
    for task in tasks {
      task.await.unwrap().unwrap();
    }
    assert_eq!(source.calls(), 1);
    assert_eq!(source.max_in_flight(), 1);
    assert_eq!(loader.lock().await.items().len(), 4);
  }

  #[tokio::test]
  async fn reset_makes_outstanding_responses_stale() {
    let source = MockSource::new(events(4));
    let mut loader = CollectionLoader::new(query(), 2);

    let ticket = loader.begin_next().unwrap();
    let response = source.fetch_page(ticket.request()).await;

    let march = query().filter(Filter::date(Comparison::Gte, at(2024, 3, 1)));
    loader.reset(march.clone());
    assert_eq!(loader.complete(ticket, response).unwrap(), Completion::Stale);
    assert!(loader.items().is_empty());
    assert_eq!(loader.cursor().page_number(), 1);
    assert_eq!(loader.phase(), LoaderPhase::Idle);

    // The new identity loads normally afterwards.
    let fresh = loader.begin_next().unwrap();
    assert_eq!(fresh.request().query, march);
    assert_eq!(fresh.request().cursor.page_number(), 1);
  }

  #[tokio::test]
  async fn failure_leaves_state_untouched_and_retries_the_same_page() {
    let source = MockSource::new(events(4));
    let mut loader = CollectionLoader::new(query(), 2);
    loader.load_next(&source).await.unwrap();

    source.fail_next(Error::NetworkUnavailable("offline".into()));
    let err = loader.load_next(&source).await.unwrap_err();
    assert!(matches!(err, Error::NetworkUnavailable(_)));
    assert_eq!(loader.items().len(), 2);
    assert_eq!(loader.cursor().page_number(), 2);
    assert_eq!(loader.phase(), LoaderPhase::Idle);

    loader.load_next(&source).await.unwrap();
    let pages: Vec<u32> =
      source.requests().iter().map(|r| r.cursor.page_number()).collect();
    assert_eq!(pages, vec![1, 2, 2]);
    assert_eq!(loader.items().len(), 4);
  }

  #[test]
  fn stale_failure_is_swallowed() {
    let mut loader = CollectionLoader::new(query(), 2);
    let ticket = loader.begin_next().unwrap();
    loader.reset(query());
    let outcome = loader.complete(ticket, Err(Error::RemoteRejected("nope".into())));
    assert_eq!(outcome, Ok(Completion::Stale));
  }
}
