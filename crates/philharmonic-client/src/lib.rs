//! Async HTTP client for the Philharmonic content API.
//!
//! [`ContentClient`] implements [`ContentSource`], so controllers and views can
//! use it interchangeably with any other source. Every failure is mapped to
//! one of the three API variants of [`philharmonic_core::Error`]:
//!
//! - the server could not be reached: `NetworkUnavailable`;
//! - the server answered with an error envelope: `RemoteRejected`;
//! - anything that is not the expected JSON: `ResponseMalformed`.

pub mod wire;

use std::time::Duration;

use philharmonic_core::{
  Error, Result,
  event::EventRecord,
  locale::Locale,
  qs,
  query::{Page, PageRequest, Populate},
  source::ContentSource,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Connection settings for the content API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

impl ClientConfig {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self { base_url: base_url.into(), timeout: Duration::from_secs(30) }
  }
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct ContentClient {
  client: Client,
  config: ClientConfig,
}

fn transport(e: reqwest::Error) -> Error {
  if e.is_decode() {
    Error::ResponseMalformed(e.to_string())
  } else {
    Error::NetworkUnavailable(e.to_string())
  }
}

impl ContentClient {
  pub fn new(config: ClientConfig) -> reqwest::Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  pub fn base_url(&self) -> &str { self.config.base_url.trim_end_matches('/') }

  fn url(&self, path: &str) -> String { format!("{}/api{}", self.base_url(), path) }

  /// `GET /api{path}` with `params` in bracket notation. `Ok(None)` on 404.
  async fn get<T: DeserializeOwned>(&self, path: &str, params: &Value) -> Result<Option<T>> {
    let pairs = qs::flatten(params);
    tracing::debug!(path, params = pairs.len(), "GET");
    let resp = self
      .client
      .get(self.url(path))
      .query(&pairs)
      .send()
      .await
      .map_err(transport)?;

    let status = resp.status();
    let body = resp.bytes().await.map_err(transport)?;

    if status == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !status.is_success() {
      return Err(match wire::rejection_message(&body) {
        Some(message) => Error::RemoteRejected(message),
        None => Error::ResponseMalformed(format!("GET {path} → {status}: invalid server response")),
      });
    }
    serde_json::from_slice(&body)
      .map(Some)
      .map_err(|e| Error::ResponseMalformed(format!("GET {path}: {e}")))
  }

  /// Like [`get`](Self::get) for endpoints where 404 is not an expected answer.
  async fn get_required<T: DeserializeOwned>(&self, path: &str, params: &Value) -> Result<T> {
    self
      .get(path, params)
      .await?
      .ok_or_else(|| Error::RemoteRejected(format!("GET {path}: Not Found")))
  }
}

impl ContentSource for ContentClient {
  /// `GET /api/events`
  async fn fetch_page(&self, request: &PageRequest) -> Result<Page<EventRecord>> {
    let envelope: wire::ListEnvelope = self.get_required("/events", &request.to_tree()).await?;
    envelope.try_into()
  }

  /// `GET /api/events/{documentId}` with every relation populated.
  async fn fetch_event(&self, document_id: &str, locale: Locale) -> Result<Option<EventRecord>> {
    let params = json!({
      "populate": Populate::all().to_tree(),
      "locale": locale.code(),
    });
    let path = format!("/events/{document_id}");
    match self.get::<wire::SingleEnvelope>(&path, &params).await? {
      Some(envelope) => envelope.into_event(),
      None => Ok(None),
    }
  }

  /// `GET /api/events/years`
  async fn event_years(&self, locale: Locale) -> Result<Vec<i32>> {
    let params = json!({ "locale": locale.code() });
    let years: wire::Years = self.get_required("/events/years", &params).await?;
    Ok(years.years)
  }

  /// `GET /api/events/months?year=`
  async fn event_months(&self, year: i32, locale: Locale) -> Result<Vec<u32>> {
    let params = json!({ "year": year, "locale": locale.code() });
    let months: wire::Months = self.get_required("/events/months", &params).await?;
    Ok(months.months)
  }

  /// `GET /api/events/upcoming-years`
  async fn upcoming_years(&self, locale: Locale) -> Result<Vec<i32>> {
    let params = json!({ "locale": locale.code() });
    let years: wire::Years = self.get_required("/events/upcoming-years", &params).await?;
    Ok(years.years)
  }

  /// `GET /api/events/by-month?year=&month=`
  async fn events_by_month(
    &self,
    year: i32,
    month: u32,
    locale: Locale,
  ) -> Result<Vec<EventRecord>> {
    let params = json!({ "year": year, "month": month, "locale": locale.code() });
    let raw: Vec<Value> = self.get_required("/events/by-month", &params).await?;
    wire::events(raw)
  }
}

#[cfg(test)]
mod tests;
