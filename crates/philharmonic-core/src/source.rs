//! The `ContentSource` trait: read access to the event catalog.
//!
//! Implemented by the HTTP client (`philharmonic-client`) and by test doubles.
//! Controllers and views depend on this abstraction, never on a transport.

use std::future::Future;

use crate::{
  Result,
  event::EventRecord,
  locale::Locale,
  notify::{Notice, Notifier},
  query::{Page, PageRequest},
};

/// Read-only access to events and the lookup endpoints derived from them.
///
/// Failures are always one of the API variants of [`crate::Error`]; none of
/// them is fatal to the caller.
pub trait ContentSource: Send + Sync {
  /// One page of a filtered, sorted listing.
  fn fetch_page(
    &self,
    request: &PageRequest,
  ) -> impl Future<Output = Result<Page<EventRecord>>> + Send;

  /// A single event with all media populated. `None` when the id is unknown.
  fn fetch_event(
    &self,
    document_id: &str,
    locale: Locale,
  ) -> impl Future<Output = Result<Option<EventRecord>>> + Send;

  /// Years that have at least one event, newest first.
  fn event_years(
    &self,
    locale: Locale,
  ) -> impl Future<Output = Result<Vec<i32>>> + Send + '_;

  /// 1-based months of `year` that have events, ascending.
  fn event_months(
    &self,
    year: i32,
    locale: Locale,
  ) -> impl Future<Output = Result<Vec<u32>>> + Send + '_;

  /// Years with events at or after now, ascending.
  fn upcoming_years(
    &self,
    locale: Locale,
  ) -> impl Future<Output = Result<Vec<i32>>> + Send + '_;

  /// Every event in one calendar month, newest first, images populated.
  fn events_by_month(
    &self,
    year: i32,
    month: u32,
    locale: Locale,
  ) -> impl Future<Output = Result<Vec<EventRecord>>> + Send + '_;
}

impl<S: ContentSource + ?Sized> ContentSource for std::sync::Arc<S> {
  fn fetch_page(
    &self,
    request: &PageRequest,
  ) -> impl Future<Output = Result<Page<EventRecord>>> + Send {
    (**self).fetch_page(request)
  }

  fn fetch_event(
    &self,
    document_id: &str,
    locale: Locale,
  ) -> impl Future<Output = Result<Option<EventRecord>>> + Send {
    (**self).fetch_event(document_id, locale)
  }

  fn event_years(
    &self,
    locale: Locale,
  ) -> impl Future<Output = Result<Vec<i32>>> + Send + '_ {
    (**self).event_years(locale)
  }

  fn event_months(
    &self,
    year: i32,
    locale: Locale,
  ) -> impl Future<Output = Result<Vec<u32>>> + Send + '_ {
    (**self).event_months(year, locale)
  }

  fn upcoming_years(
    &self,
    locale: Locale,
  ) -> impl Future<Output = Result<Vec<i32>>> + Send + '_ {
    (**self).upcoming_years(locale)
  }

  fn events_by_month(
    &self,
    year: i32,
    month: u32,
    locale: Locale,
  ) -> impl Future<Output = Result<Vec<EventRecord>>> + Send + '_ {
    (**self).events_by_month(year, month, locale)
  }
}

// ─── Notifying decorator ─────────────────────────────────────────────────────

/// Wraps a source and reports every API failure to a [`Notifier`] before
/// returning it unchanged.
#[derive(Debug, Clone)]
pub struct NotifyingSource<S, N> {
  inner:    S,
  notifier: N,
}

impl<S, N> NotifyingSource<S, N> {
  pub fn new(inner: S, notifier: N) -> Self { Self { inner, notifier } }

  pub fn inner(&self) -> &S { &self.inner }
}

impl<S: ContentSource, N: Notifier> NotifyingSource<S, N> {
  fn report<T>(&self, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
      tracing::warn!(error = %e, "content request failed");
      if e.is_api_failure() {
        self.notifier.notify(Notice::for_api_error(e));
      }
    }
    result
  }
}

impl<S: ContentSource, N: Notifier> ContentSource for NotifyingSource<S, N> {
  async fn fetch_page(&self, request: &PageRequest) -> Result<Page<EventRecord>> {
    self.report(self.inner.fetch_page(request).await)
  }

  async fn fetch_event(
    &self,
    document_id: &str,
    locale: Locale,
  ) -> Result<Option<EventRecord>> {
    self.report(self.inner.fetch_event(document_id, locale).await)
  }

  async fn event_years(&self, locale: Locale) -> Result<Vec<i32>> {
    self.report(self.inner.event_years(locale).await)
  }

  async fn event_months(&self, year: i32, locale: Locale) -> Result<Vec<u32>> {
    self.report(self.inner.event_months(year, locale).await)
  }

  async fn upcoming_years(&self, locale: Locale) -> Result<Vec<i32>> {
    self.report(self.inner.upcoming_years(locale).await)
  }

  async fn events_by_month(
    &self,
    year: i32,
    month: u32,
    locale: Locale,
  ) -> Result<Vec<EventRecord>> {
    self.report(self.inner.events_by_month(year, month, locale).await)
  }
}
