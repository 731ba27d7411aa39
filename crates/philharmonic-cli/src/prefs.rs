//! Persisted browser state: the last selected locale.

use std::path::{Path, PathBuf};

use philharmonic_core::locale::Locale;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefs {
  #[serde(default)]
  pub locale: Option<Locale>,
}

/// `<config dir>/philharmonic/state.toml`.
pub fn default_path() -> PathBuf {
  dirs::config_dir()
    .unwrap_or_else(|| PathBuf::from("."))
    .join("philharmonic")
    .join("state.toml")
}

impl Prefs {
  /// A missing or unreadable file yields the defaults.
  pub fn load(path: &Path) -> Self {
    let raw = match std::fs::read_to_string(path) {
      Ok(raw) => raw,
      Err(e) => {
        tracing::debug!(path = %path.display(), error = %e, "no saved state");
        return Self::default();
      }
    };
    toml::from_str(&raw).unwrap_or_else(|e| {
      tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable state file");
      Self::default()
    })
  }

  /// Failures are logged, never surfaced.
  pub fn save(&self, path: &Path) {
    if let Some(dir) = path.parent() {
      if let Err(e) = std::fs::create_dir_all(dir) {
        tracing::warn!(error = %e, "failed to create state directory");
        return;
      }
    }
    match toml::to_string(self) {
      Ok(raw) => {
        if let Err(e) = std::fs::write(path, raw) {
          tracing::warn!(error = %e, "failed to save state");
        }
      }
      Err(e) => tracing::warn!(error = %e, "failed to serialise state"),
    }
  }
}
