//! The Philharmonic content server.
//!
//! Serves a JSON event catalog through the REST contract the client and the
//! terminal browser consume. Mount [`router`] at the root; every endpoint lives
//! under `/api`.

pub mod catalog;
pub mod error;
pub mod events;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use catalog::{Catalog, StoredEvent};
pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, layered from `content.toml` and
/// `PHILHARMONIC_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:         String,
  #[serde(default = "default_port")]
  pub port:         u16,
  #[serde(default = "default_catalog_path")]
  pub catalog_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 1337 }

fn default_catalog_path() -> PathBuf { PathBuf::from("catalog.json") }

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState {
  pub catalog: Arc<Catalog>,
}

impl AppState {
  pub fn new(catalog: Catalog) -> Self { Self { catalog: Arc::new(catalog) } }
}

// ─── Router ──────────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
  let api = Router::new()
    .route("/events",                get(events::list))
    .route("/events/years",          get(events::years))
    .route("/events/months",         get(events::months))
    .route("/events/upcoming-years", get(events::upcoming_years))
    .route("/events/by-month",       get(events::by_month))
    .route("/events/{document_id}",  get(events::get_one))
    .with_state(state);
  Router::new()
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests;
