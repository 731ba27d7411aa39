//! An in-memory `ContentSource` for controller tests.

use std::{
  collections::VecDeque,
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use chrono::{DateTime, Datelike, TimeZone, Utc};

use crate::{
  Error, Result,
  event::EventRecord,
  locale::Locale,
  query::{Direction, Page, PageRequest},
  source::ContentSource,
};

pub fn event(id: u64, date: DateTime<Utc>) -> EventRecord {
  EventRecord {
    id,
    document_id: format!("doc-{id}"),
    title: format!("Event {id}"),
    description: String::new(),
    location: None,
    date,
    cover: None,
    images: Vec::new(),
    videos: Vec::new(),
  }
}

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

/// Serves `events` through the real filter and sort semantics, unless a
/// scripted page or failure is queued. Counts calls and peak concurrency.
#[derive(Debug, Default)]
pub struct MockSource {
  events:        Vec<EventRecord>,
  script:        Mutex<VecDeque<Result<Page<EventRecord>>>>,
  failures:      Mutex<VecDeque<Error>>,
  delay:         Option<Duration>,
  calls:         AtomicUsize,
  in_flight:     AtomicUsize,
  max_in_flight: AtomicUsize,
  requests:      Mutex<Vec<PageRequest>>,
}

impl MockSource {
  pub fn new(events: Vec<EventRecord>) -> Self {
    Self { events, ..Self::default() }
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  pub fn script(&self, page: Result<Page<EventRecord>>) {
    self.script.lock().unwrap().push_back(page);
  }

  pub fn fail_next(&self, error: Error) {
    self.failures.lock().unwrap().push_back(error);
  }

  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

  pub fn max_in_flight(&self) -> usize { self.max_in_flight.load(Ordering::SeqCst) }

  pub fn requests(&self) -> Vec<PageRequest> { self.requests.lock().unwrap().clone() }

  fn serve(&self, request: &PageRequest) -> Page<EventRecord> {
    let mut matching: Vec<EventRecord> = self
      .events
      .iter()
      .filter(|e| {
        request
          .query
          .filter
          .as_ref()
          .is_none_or(|f| f.matches(e.date, request.query.locale))
      })
      .cloned()
      .collect();
    if let Some(key) = request.query.sort.first() {
      matching.sort_by_key(|e| e.date);
      if key.direction == Direction::Desc {
        matching.reverse();
      }
    }
    let size = request.cursor.page_size() as usize;
    let page = request.cursor.page_number();
    let total = matching.len();
    let page_count = total.div_ceil(size) as u32;
    let items = matching
      .into_iter()
      .skip((page as usize - 1) * size)
      .take(size)
      .collect();
    Page { items, page_number: page, page_count, total: total as u64 }
  }
}

impl ContentSource for MockSource {
  async fn fetch_page(&self, request: &PageRequest) -> Result<Page<EventRecord>> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    self.requests.lock().unwrap().push(request.clone());

    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }

    let failure = self.failures.lock().unwrap().pop_front();
    let scripted = self.script.lock().unwrap().pop_front();
    let result = match (failure, scripted) {
      (Some(e), _) => Err(e),
      (None, Some(page)) => page,
      (None, None) => Ok(self.serve(request)),
    };
    self.in_flight.fetch_sub(1, Ordering::SeqCst);
    result
  }

  async fn fetch_event(
    &self,
    document_id: &str,
    _locale: Locale,
  ) -> Result<Option<EventRecord>> {
    if let Some(e) = self.failures.lock().unwrap().pop_front() {
      return Err(e);
    }
    Ok(self.events.iter().find(|e| e.document_id == document_id).cloned())
  }

  async fn event_years(&self, _locale: Locale) -> Result<Vec<i32>> {
    let mut years: Vec<i32> = self.events.iter().map(|e| e.date.year()).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    Ok(years)
  }

  async fn event_months(&self, year: i32, _locale: Locale) -> Result<Vec<u32>> {
    let mut months: Vec<u32> = self
      .events
      .iter()
      .filter(|e| e.date.year() == year)
      .map(|e| e.date.month())
      .collect();
    months.sort_unstable();
    months.dedup();
    Ok(months)
  }

  async fn upcoming_years(&self, _locale: Locale) -> Result<Vec<i32>> {
    let now = Utc::now();
    let mut years: Vec<i32> = self
      .events
      .iter()
      .filter(|e| e.date >= now)
      .map(|e| e.date.year())
      .collect();
    years.sort_unstable();
    years.dedup();
    Ok(years)
  }

  async fn events_by_month(
    &self,
    year: i32,
    month: u32,
    _locale: Locale,
  ) -> Result<Vec<EventRecord>> {
    let mut events: Vec<EventRecord> = self
      .events
      .iter()
      .filter(|e| e.date.year() == year && e.date.month() == month)
      .cloned()
      .collect();
    events.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(events)
  }
}
