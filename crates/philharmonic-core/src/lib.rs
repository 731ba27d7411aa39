//! Core types and controllers for the Philharmonic content catalog.
//!
//! This crate is deliberately free of HTTP and terminal dependencies. It holds
//! the event data model, the query model shared by client and server, and the
//! state machines the views are built from: the incremental collection loader,
//! the grouping accordion, visibility triggers, chunked reveals and the media
//! viewer.

pub mod accordion;
pub mod error;
pub mod event;
pub mod loader;
pub mod locale;
pub mod media;
pub mod notify;
pub mod qs;
pub mod query;
pub mod report;
pub mod reveal;
pub mod scope;
pub mod source;
pub mod trigger;
pub mod viewer;

pub use error::{Error, Result};
pub use loader::{CollectionLoader, Completion, LoadGate, LoaderPhase, PageTicket};

#[cfg(test)]
mod testing;
