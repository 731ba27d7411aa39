//! Locale selection and translation lookup.
//!
//! There is no ambient translator: a [`Translator`] is built once at start-up
//! and handed to whatever needs locale-aware text. The string catalog itself is
//! an opaque [`Catalog`]; [`BuiltinCatalog`] only covers the month names and
//! the handful of labels the terminal browser shows.

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A content locale. Every content query is filtered by one.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
  #[default]
  En,
  /// Albanian.
  Sq,
  /// Macedonian.
  Mk,
}

impl Locale {
  pub const ALL: [Locale; 3] = [Locale::En, Locale::Sq, Locale::Mk];

  pub fn code(self) -> &'static str {
    match self {
      Self::En => "en",
      Self::Sq => "sq",
      Self::Mk => "mk",
    }
  }

  /// The next locale in the selector's cycling order.
  pub fn next(self) -> Self {
    match self {
      Self::En => Self::Sq,
      Self::Sq => Self::Mk,
      Self::Mk => Self::En,
    }
  }
}

impl fmt::Display for Locale {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

impl FromStr for Locale {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "en" => Ok(Self::En),
      // `al` is the code the site's language picker historically stored.
      "sq" | "al" => Ok(Self::Sq),
      "mk" => Ok(Self::Mk),
      other => Err(Error::UnknownLocale(other.to_owned())),
    }
  }
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// A source of translated strings.
pub trait Catalog: Send + Sync {
  fn lookup(&self, locale: Locale, key: &str) -> Option<String>;
}

/// Locale-aware string lookup with English and then key fallback.
#[derive(Clone)]
pub struct Translator {
  locale:  Locale,
  catalog: Arc<dyn Catalog>,
}

impl Translator {
  pub fn new(locale: Locale, catalog: Arc<dyn Catalog>) -> Self {
    Self { locale, catalog }
  }

  /// A translator over [`BuiltinCatalog`].
  pub fn builtin(locale: Locale) -> Self {
    Self::new(locale, Arc::new(BuiltinCatalog))
  }

  pub fn locale(&self) -> Locale { self.locale }

  pub fn set_locale(&mut self, locale: Locale) { self.locale = locale; }

  pub fn t(&self, key: &str) -> String {
    self
      .catalog
      .lookup(self.locale, key)
      .or_else(|| self.catalog.lookup(Locale::En, key))
      .unwrap_or_else(|| key.to_owned())
  }

  /// Full month name for a 1-based month number.
  pub fn month(&self, month: u32) -> String {
    self.t(&format!("months.{month}"))
  }
}

impl fmt::Debug for Translator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Translator")
      .field("locale", &self.locale)
      .finish_non_exhaustive()
  }
}

// ─── Built-in strings ────────────────────────────────────────────────────────

/// Month names and terminal-browser labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

const MONTHS_EN: [&str; 12] = [
  "January", "February", "March", "April", "May", "June", "July", "August",
  "September", "October", "November", "December",
];
const MONTHS_SQ: [&str; 12] = [
  "Janar", "Shkurt", "Mars", "Prill", "Maj", "Qershor", "Korrik", "Gusht",
  "Shtator", "Tetor", "Nëntor", "Dhjetor",
];
const MONTHS_MK: [&str; 12] = [
  "Јануари", "Февруари", "Март", "Април", "Мај", "Јуни", "Јули", "Август",
  "Септември", "Октомври", "Ноември", "Декември",
];

const LABELS_EN: &[(&str, &str)] = &[
  ("nav.home", "Home"),
  ("nav.events", "Events"),
  ("nav.gallery", "Gallery"),
  ("nav.past", "Past Events"),
  ("nav.reports", "Reports"),
  ("nav.event", "Event"),
  ("common.loading", "Loading…"),
  ("detail.notFound", "Event not found"),
  ("events.noEvents", "No events this month"),
  ("events.loadMore", "Load more"),
  ("events.loadingMore", "Loading more…"),
  ("events.unknownLocation", "Location to be announced"),
  ("gallery.allMonths", "All months"),
  ("gallery.noImages", "No images for this event"),
  ("gallery.noEvents", "No events found"),
  ("gallery.pictures", "pictures"),
  ("errors.generic", "Something went wrong."),
  ("errors.noConnection", "Network error. Check your internet."),
  ("errors.fatal", "Something went wrong. Press r to reload."),
];
const LABELS_SQ: &[(&str, &str)] = &[
  ("nav.home", "Kreu"),
  ("nav.events", "Ngjarjet"),
  ("nav.gallery", "Galeria"),
  ("nav.past", "Ngjarjet e kaluara"),
  ("nav.reports", "Raportet"),
  ("nav.event", "Ngjarja"),
  ("events.noEvents", "Nuk ka ngjarje këtë muaj"),
  ("events.loadMore", "Shfaq më shumë"),
  ("gallery.allMonths", "Të gjithë muajt"),
  ("errors.generic", "Diçka shkoi keq."),
];
const LABELS_MK: &[(&str, &str)] = &[
  ("nav.home", "Почетна"),
  ("nav.events", "Настани"),
  ("nav.gallery", "Галерија"),
  ("nav.past", "Минати настани"),
  ("nav.reports", "Извештаи"),
  ("nav.event", "Настан"),
  ("events.noEvents", "Нема настани овој месец"),
  ("events.loadMore", "Вчитај повеќе"),
  ("gallery.allMonths", "Сите месеци"),
  ("errors.generic", "Нешто тргна наопаку."),
];

impl Catalog for BuiltinCatalog {
  fn lookup(&self, locale: Locale, key: &str) -> Option<String> {
    if let Some(n) = key.strip_prefix("months.") {
      let idx = n.parse::<usize>().ok()?.checked_sub(1)?;
      let months = match locale {
        Locale::En => &MONTHS_EN,
        Locale::Sq => &MONTHS_SQ,
        Locale::Mk => &MONTHS_MK,
      };
      return months.get(idx).map(|m| (*m).to_owned());
    }
    let labels = match locale {
      Locale::En => LABELS_EN,
      Locale::Sq => LABELS_SQ,
      Locale::Mk => LABELS_MK,
    };
    labels
      .iter()
      .find(|(k, _)| *k == key)
      .map(|(_, v)| (*v).to_owned())
  }
}
