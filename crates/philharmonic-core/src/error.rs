//! Error types for `philharmonic-core`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// The content service could not be reached (connection refused, DNS,
  /// timeout).
  #[error("network unavailable: {0}")]
  NetworkUnavailable(String),

  /// The content service answered with a validation or business error.
  #[error("request rejected: {0}")]
  RemoteRejected(String),

  /// The response body was not JSON or did not have the expected shape.
  #[error("malformed response: {0}")]
  ResponseMalformed(String),

  #[error("invalid query: {0}")]
  InvalidQuery(String),

  #[error("unknown locale: {0:?}")]
  UnknownLocale(String),

  #[error("cannot open viewer without slides")]
  EmptySlides,

  #[error("slide index {index} out of range for {len} slides")]
  SlideOutOfRange { index: usize, len: usize },

  #[error("group {0} is outside the current scope")]
  GroupOutOfScope(String),
}

impl Error {
  /// `true` for the failures that originate at the content API boundary.
  pub fn is_api_failure(&self) -> bool {
    matches!(
      self,
      Self::NetworkUnavailable(_)
        | Self::RemoteRejected(_)
        | Self::ResponseMalformed(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
