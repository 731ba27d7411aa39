//! Transient, deduplicated notices.
//!
//! Request tasks and the UI loop share one [`Toasts`] queue, so it guards its
//! state with a mutex. Time is passed in explicitly by the `*_at` methods.

use std::{
  sync::Mutex,
  time::{Duration, Instant},
};

use crate::{Error, locale::Translator};

/// A notice with the same key inside this window is dropped.
pub const DEDUPE_WINDOW: Duration = Duration::from_secs(2);
/// How long a notice stays visible.
pub const NOTICE_TTL: Duration = Duration::from_secs(4);

/// Key under which content API failures are reported.
pub const API_ERROR_KEY: &str = "api_error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeText {
  /// A translation key, rendered in the active locale.
  Label(&'static str),
  Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub key:  String,
  pub text: NoticeText,
}

impl Notice {
  pub fn new(key: impl Into<String>, text: NoticeText) -> Self {
    Self { key: key.into(), text }
  }

  /// The notice shown for a failed content request.
  pub fn for_api_error(error: &Error) -> Self {
    let text = match error {
      Error::NetworkUnavailable(_) => NoticeText::Label("errors.noConnection"),
      Error::RemoteRejected(message) if !message.is_empty() => {
        NoticeText::Raw(message.clone())
      }
      _ => NoticeText::Label("errors.generic"),
    };
    Self::new(API_ERROR_KEY, text)
  }

  pub fn render(&self, t: &Translator) -> String {
    match &self.text {
      NoticeText::Label(key) => t.t(key),
      NoticeText::Raw(s) => s.clone(),
    }
  }
}

/// Something that can show a notice to the user.
pub trait Notifier: Send + Sync {
  fn notify(&self, notice: Notice);
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
  fn notify(&self, notice: Notice) { (**self).notify(notice) }
}

#[derive(Debug)]
struct Shown {
  notice: Notice,
  at:     Instant,
}

/// The notification queue rendered by the terminal browser.
#[derive(Debug, Default)]
pub struct Toasts {
  shown: Mutex<Vec<Shown>>,
}

impl Toasts {
  pub fn new() -> Self { Self::default() }

  /// Queue `notice` unless one with the same key was shown within
  /// [`DEDUPE_WINDOW`]. Returns whether it was queued.
  pub fn push_at(&self, notice: Notice, now: Instant) -> bool {
    let mut shown = match self.shown.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    let duplicate = shown.iter().any(|s| {
      s.notice.key == notice.key && now.saturating_duration_since(s.at) < DEDUPE_WINDOW
    });
    if duplicate {
      tracing::debug!(key = %notice.key, "dropping duplicate notice");
      return false;
    }
    shown.push(Shown { notice, at: now });
    true
  }

  /// Notices still visible at `now`; expired ones are discarded.
  pub fn active_at(&self, now: Instant) -> Vec<Notice> {
    let mut shown = match self.shown.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    shown.retain(|s| now.saturating_duration_since(s.at) < NOTICE_TTL);
    shown.iter().map(|s| s.notice.clone()).collect()
  }

  pub fn active(&self) -> Vec<Notice> { self.active_at(Instant::now()) }
}

impl Notifier for Toasts {
  fn notify(&self, notice: Notice) {
    self.push_at(notice, Instant::now());
  }
}
