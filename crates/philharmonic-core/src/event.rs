//! Event records: the unit of content served by the catalog.
//!
//! Records are authored elsewhere and are read-only here. The serde names
//! follow the content API's wire vocabulary (`documentId`, `name`,
//! `eventVideos`, `alternativeText`) so the same types describe both the
//! catalog file and the typed result of the client adapter.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Media ───────────────────────────────────────────────────────────────────

/// A pre-rendered size variant of an image (`thumbnail`, `small`, `medium`,
/// `large`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFormat {
  pub url:    String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub width:  Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub height: Option<u32>,
}

/// A reference to an uploaded image. `url` may be absolute (cloud host) or
/// relative to the media base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
  pub url:              String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:             Option<String>,
  #[serde(
    default,
    rename = "alternativeText",
    skip_serializing_if = "Option::is_none"
  )]
  pub alternative_text: Option<String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub formats:          BTreeMap<String, ImageFormat>,
}

impl ImageRef {
  pub fn new(url: impl Into<String>) -> Self {
    Self {
      url:              url.into(),
      name:             None,
      alternative_text: None,
      formats:          BTreeMap::new(),
    }
  }

  /// The URL to display: the original upload, then the `medium` and `large`
  /// renditions. Empty when none is available.
  pub fn preferred_url(&self) -> &str {
    if !self.url.is_empty() {
      return &self.url;
    }
    ["medium", "large"]
      .iter()
      .filter_map(|size| self.formats.get(*size))
      .map(|f| f.url.as_str())
      .find(|u| !u.is_empty())
      .unwrap_or_default()
  }

  /// The `thumbnail` rendition, used as a low-resolution placeholder.
  pub fn thumbnail_url(&self) -> Option<&str> {
    self.formats.get("thumbnail").map(|f| f.url.as_str())
  }

  /// Caption shown in the viewer: name, then alternative text.
  pub fn caption(&self) -> &str {
    self
      .name
      .as_deref()
      .or(self.alternative_text.as_deref())
      .unwrap_or_default()
  }
}

/// A video attached to an event, with an optional poster image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
  pub url:       String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub thumbnail: Option<ImageRef>,
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// Whether an event has already taken place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
  Past,
  Upcoming,
}

impl EventStatus {
  /// `Past` strictly before `now`, `Upcoming` otherwise.
  pub fn at(date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
    if date < now { Self::Past } else { Self::Upcoming }
  }
}

/// A concert, rehearsal or other public event with its media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
  pub id:          u64,
  /// Stable identifier shared by all locale variants of the event.
  #[serde(rename = "documentId")]
  pub document_id: String,
  #[serde(rename = "name")]
  pub title:       String,
  /// Rich text, HTML.
  #[serde(default)]
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub location:    Option<String>,
  pub date:        DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cover:       Option<ImageRef>,
  #[serde(default)]
  pub images:      Vec<ImageRef>,
  #[serde(default, rename = "eventVideos")]
  pub videos:      Vec<VideoRef>,
}

impl EventRecord {
  pub fn status(&self, now: DateTime<Utc>) -> EventStatus {
    EventStatus::at(self.date, now)
  }

  /// Cover URL for cards, falling back through the cover's renditions.
  pub fn cover_url(&self) -> &str {
    self
      .cover
      .as_ref()
      .map(ImageRef::preferred_url)
      .unwrap_or_default()
  }
}
