//! Raw response shapes and their validation into typed records.
//!
//! Everything the server sends is first read into permissive `Raw*` types, then
//! checked. A record without `id` or `documentId`, or with a date that does not
//! parse, is a malformed response rather than a silently defaulted event.

use chrono::{DateTime, Utc};
use philharmonic_core::{
  Error, Result,
  event::{EventRecord, ImageRef, VideoRef},
  query::Page,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct RawEvent {
  id:           Option<u64>,
  #[serde(rename = "documentId")]
  document_id:  Option<String>,
  name:         Option<String>,
  #[serde(default)]
  description:  Value,
  location:     Option<String>,
  date:         Option<String>,
  cover:        Option<ImageRef>,
  #[serde(default)]
  images:       Option<Vec<ImageRef>>,
  #[serde(default, rename = "eventVideos")]
  event_videos: Option<Vec<VideoRef>>,
}

impl TryFrom<RawEvent> for EventRecord {
  type Error = Error;

  fn try_from(raw: RawEvent) -> Result<Self> {
    let id = raw
      .id
      .ok_or_else(|| Error::ResponseMalformed("event without id".into()))?;
    let document_id = raw
      .document_id
      .filter(|d| !d.is_empty())
      .ok_or_else(|| Error::ResponseMalformed(format!("event {id} without documentId")))?;
    let date = raw
      .date
      .as_deref()
      .ok_or_else(|| Error::ResponseMalformed(format!("event {id} without date")))
      .and_then(|d| {
        DateTime::parse_from_rfc3339(d)
          .map(|d| d.with_timezone(&Utc))
          .map_err(|e| Error::ResponseMalformed(format!("event {id} date {d:?}: {e}")))
      })?;
    // Rich text may arrive as blocks; only plain HTML strings are shown.
    let description = match raw.description {
      Value::String(s) => s,
      _ => String::new(),
    };
    Ok(EventRecord {
      id,
      document_id,
      title: raw.name.unwrap_or_default(),
      description,
      location: raw.location.filter(|l| !l.trim().is_empty()),
      date,
      cover: raw.cover,
      images: raw.images.unwrap_or_default(),
      videos: raw.event_videos.unwrap_or_default(),
    })
  }
}

fn event(value: Value) -> Result<EventRecord> {
  let raw: RawEvent = serde_json::from_value(value)
    .map_err(|e| Error::ResponseMalformed(format!("unexpected event shape: {e}")))?;
  raw.try_into()
}

pub fn events(values: Vec<Value>) -> Result<Vec<EventRecord>> {
  values.into_iter().map(event).collect()
}

// ─── Envelopes ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawPagination {
  page:       u32,
  #[serde(rename = "pageCount")]
  page_count: u32,
  #[serde(default)]
  total:      u64,
}

#[derive(Debug, Deserialize)]
struct RawMeta {
  pagination: RawPagination,
}

#[derive(Debug, Deserialize)]
pub struct ListEnvelope {
  data: Vec<Value>,
  meta: RawMeta,
}

impl TryFrom<ListEnvelope> for Page<EventRecord> {
  type Error = Error;

  fn try_from(raw: ListEnvelope) -> Result<Self> {
    Ok(Page {
      items:       events(raw.data)?,
      page_number: raw.meta.pagination.page,
      page_count:  raw.meta.pagination.page_count,
      total:       raw.meta.pagination.total,
    })
  }
}

#[derive(Debug, Deserialize)]
pub struct SingleEnvelope {
  data: Option<Value>,
}

impl SingleEnvelope {
  pub fn into_event(self) -> Result<Option<EventRecord>> {
    self.data.filter(|d| !d.is_null()).map(event).transpose()
  }
}

#[derive(Debug, Deserialize)]
pub struct Years {
  pub years: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct Months {
  pub months: Vec<u32>,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawErrorBody {
  message: Option<String>,
  #[serde(default)]
  details: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: Option<RawErrorBody>,
}

/// The message a rejected request should surface: the joined
/// `details.errors[].message` list when present, else `error.message`.
/// `None` when the body is not an error envelope.
pub fn rejection_message(body: &[u8]) -> Option<String> {
  let envelope: ErrorEnvelope = serde_json::from_slice(body).ok()?;
  let error = envelope.error?;
  if let Some(errors) = error.details.get("errors").and_then(Value::as_array) {
    let messages: Vec<&str> = errors
      .iter()
      .filter_map(|e| e.get("message").and_then(Value::as_str))
      .collect();
    if !messages.is_empty() {
      return Some(messages.join(", "));
    }
  }
  error.message
}
