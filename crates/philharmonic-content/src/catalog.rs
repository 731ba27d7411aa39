//! The in-memory event catalog served by the content server.
//!
//! The catalog file is JSON: `{ "events": [ ... ] }`, each entry an event in
//! wire form plus its `locale`. Locale variants of one event share a
//! `documentId`.

use std::{cmp::Ordering, path::Path};

use chrono::{DateTime, Datelike, Utc};
use philharmonic_core::{
  event::EventRecord,
  locale::Locale,
  query::{Direction, Page, PageRequest, SortField, SortKey},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("failed to read catalog: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to parse catalog: {0}")]
  Parse(#[from] serde_json::Error),
}

/// One locale variant of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
  #[serde(default)]
  pub locale: Locale,
  #[serde(flatten)]
  pub record: EventRecord,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
  #[serde(default)]
  events: Vec<StoredEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
  events: Vec<StoredEvent>,
}

impl Catalog {
  pub fn new(events: Vec<StoredEvent>) -> Self { Self { events } }

  pub fn from_json(bytes: &[u8]) -> Result<Self, CatalogError> {
    let file: CatalogFile = serde_json::from_slice(bytes)?;
    Ok(Self::new(file.events))
  }

  /// Read a catalog file. A missing file yields an empty catalog.
  pub fn load(path: &Path) -> Result<Self, CatalogError> {
    match std::fs::read(path) {
      Ok(bytes) => Self::from_json(&bytes),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        tracing::warn!(path = %path.display(), "catalog file not found, serving no events");
        Ok(Self::default())
      }
      Err(e) => Err(e.into()),
    }
  }

  pub fn len(&self) -> usize { self.events.len() }

  pub fn is_empty(&self) -> bool { self.events.is_empty() }

  fn in_locale(&self, locale: Locale) -> impl Iterator<Item = &EventRecord> {
    self
      .events
      .iter()
      .filter(move |e| e.locale == locale)
      .map(|e| &e.record)
  }

  pub fn find(&self, document_id: &str, locale: Locale) -> Option<&EventRecord> {
    self.in_locale(locale).find(|e| e.document_id == document_id)
  }

  /// One page of events in the request's locale matching its filter, in the
  /// requested order.
  pub fn list(&self, request: &PageRequest) -> Page<&EventRecord> {
    let query = &request.query;
    let mut matching: Vec<&EventRecord> = self
      .in_locale(query.locale)
      .filter(|e| {
        query
          .filter
          .as_ref()
          .is_none_or(|f| f.matches(e.date, query.locale))
      })
      .collect();
    matching.sort_by(|a, b| compare(&query.sort, a, b));

    let size = request.cursor.page_size() as usize;
    let page = request.cursor.page_number();
    let total = matching.len();
    let items = matching
      .into_iter()
      .skip((page as usize).saturating_sub(1).saturating_mul(size))
      .take(size)
      .collect();
    Page {
      items,
      page_number: page,
      page_count: total.div_ceil(size) as u32,
      total: total as u64,
    }
  }

  /// Years with events, newest first.
  pub fn years(&self, locale: Locale) -> Vec<i32> {
    let mut years: Vec<i32> = self.in_locale(locale).map(|e| e.date.year()).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
  }

  /// Months of `year` with events, ascending.
  pub fn months(&self, year: i32, locale: Locale) -> Vec<u32> {
    let mut months: Vec<u32> = self
      .in_locale(locale)
      .filter(|e| e.date.year() == year)
      .map(|e| e.date.month())
      .collect();
    months.sort_unstable();
    months.dedup();
    months
  }

  /// Years with events at or after `now`, ascending.
  pub fn upcoming_years(&self, locale: Locale, now: DateTime<Utc>) -> Vec<i32> {
    let mut years: Vec<i32> = self
      .in_locale(locale)
      .filter(|e| e.date >= now)
      .map(|e| e.date.year())
      .collect();
    years.sort_unstable();
    years.dedup();
    years
  }

  /// Every event in a calendar month, newest first.
  pub fn by_month(&self, year: i32, month: u32, locale: Locale) -> Vec<&EventRecord> {
    let mut events: Vec<&EventRecord> = self
      .in_locale(locale)
      .filter(|e| e.date.year() == year && e.date.month() == month)
      .collect();
    events.sort_by(|a, b| b.date.cmp(&a.date));
    events
  }
}

fn compare(sort: &[SortKey], a: &EventRecord, b: &EventRecord) -> Ordering {
  for key in sort {
    let ord = match key.field {
      SortField::Date => a.date.cmp(&b.date),
      SortField::Title => a.title.cmp(&b.title),
    };
    let ord = match key.direction {
      Direction::Asc => ord,
      Direction::Desc => ord.reverse(),
    };
    if ord != Ordering::Equal {
      return ord;
    }
  }
  a.id.cmp(&b.id)
}
