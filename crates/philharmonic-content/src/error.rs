//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Errors are rendered in the content API's envelope:
//! `{ "data": null, "error": { "status", "name", "message", "details" } }`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// A query that failed validation. Each entry becomes one
  /// `details.errors[].message`.
  #[error("validation failed: {}", .0.join(", "))]
  Validation(Vec<String>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl From<philharmonic_core::Error> for ApiError {
  fn from(e: philharmonic_core::Error) -> Self {
    use philharmonic_core::Error as E;
    match e {
      E::InvalidQuery(m) => ApiError::Validation(vec![m]),
      E::UnknownLocale(code) => ApiError::Validation(vec![format!("unknown locale {code}")]),
      other => ApiError::Internal(other.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, name, message, details) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, "NotFoundError", m.clone(), json!({})),
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, "BadRequestError", m.clone(), json!({}))
      }
      ApiError::Validation(messages) => {
        let errors: Vec<_> = messages.iter().map(|m| json!({ "message": m })).collect();
        (
          StatusCode::BAD_REQUEST,
          "ValidationError",
          "Invalid query".to_owned(),
          json!({ "errors": errors }),
        )
      }
      ApiError::Internal(m) => {
        tracing::error!(error = %m, "request failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "InternalServerError",
          "Internal Server Error".to_owned(),
          json!({}),
        )
      }
    };
    let body = json!({
      "data": null,
      "error": {
        "status": status.as_u16(),
        "name": name,
        "message": message,
        "details": details,
      },
    });
    (status, Json(body)).into_response()
  }
}
