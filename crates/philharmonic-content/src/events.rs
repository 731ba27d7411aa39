//! Handlers for `/events` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/events` | Bracket-notation `filters`, `sort`, `populate`, `pagination`, `locale` |
//! | `GET`  | `/events/{documentId}` | 404 if not found in the locale |
//! | `GET`  | `/events/years` | `{ "years": [...] }`, newest first |
//! | `GET`  | `/events/months` | `?year=` required; `{ "months": [...] }` |
//! | `GET`  | `/events/upcoming-years` | `{ "years": [...] }`, ascending |
//! | `GET`  | `/events/by-month` | `?year=&month=` required; bare array, images populated |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use philharmonic_core::{
  event::{EventRecord, EventStatus},
  locale::Locale,
  qs,
  query::{Populate, PageRequest, Relation, iso},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, error::ApiError};

/// Render a record in wire form with only the requested relations and its
/// current status.
pub fn render(
  record: &EventRecord,
  populate: &Populate,
  now: DateTime<Utc>,
) -> Result<Value, ApiError> {
  let mut value = serde_json::to_value(record)
    .map_err(|e| ApiError::Internal(format!("rendering event {}: {e}", record.id)))?;
  if let Value::Object(map) = &mut value {
    for relation in Relation::ALL {
      if !populate.contains(relation) {
        map.remove(relation.wire_name());
      }
    }
    map.insert("date".into(), Value::String(iso(record.date)));
    let status = match EventStatus::at(record.date, now) {
      EventStatus::Past => "past",
      EventStatus::Upcoming => "upcoming",
    };
    map.insert("status".into(), Value::String(status.into()));
  }
  Ok(value)
}

fn parse_tree(pairs: Vec<(String, String)>) -> Result<Value, ApiError> {
  Ok(qs::unflatten(pairs)?)
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /events`
pub async fn list(
  State(state): State<AppState>,
  Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, ApiError> {
  let request = PageRequest::from_tree(&parse_tree(pairs)?)?;
  let page = state.catalog.list(&request);
  let now = Utc::now();
  let data = page
    .items
    .iter()
    .map(|e| render(e, &request.query.populate, now))
    .collect::<Result<Vec<_>, _>>()?;
  tracing::debug!(
    locale = %request.query.locale,
    page = page.page_number,
    returned = data.len(),
    total = page.total,
    "listed events"
  );
  Ok(Json(json!({
    "data": data,
    "meta": {
      "pagination": {
        "page": page.page_number,
        "pageSize": request.cursor.page_size(),
        "pageCount": page.page_count,
        "total": page.total,
      },
    },
  })))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /events/{documentId}`
pub async fn get_one(
  State(state): State<AppState>,
  Path(document_id): Path<String>,
  Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, ApiError> {
  let tree = parse_tree(pairs)?;
  let locale = locale_param(tree.get("locale").and_then(Value::as_str))?;
  let populate = tree
    .get("populate")
    .map(Populate::from_tree)
    .transpose()?
    .unwrap_or_default();
  let event = state
    .catalog
    .find(&document_id, locale)
    .ok_or_else(|| ApiError::NotFound("Not Found".into()))?;
  Ok(Json(json!({ "data": render(event, &populate, Utc::now())? })))
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LookupParams {
  pub year:   Option<String>,
  pub month:  Option<String>,
  pub locale: Option<String>,
}

fn locale_param(raw: Option<&str>) -> Result<Locale, ApiError> {
  raw.map_or(Ok(Locale::default()), |code| Ok(code.parse()?))
}

/// A positive integer parameter; missing, zero and garbage are all rejected
/// with `message`.
fn required<T: std::str::FromStr + PartialEq + Default>(
  raw: Option<&str>,
  message: &str,
) -> Result<T, ApiError> {
  raw
    .and_then(|s| s.trim().parse::<T>().ok())
    .filter(|v| *v != T::default())
    .ok_or_else(|| ApiError::BadRequest(message.into()))
}

/// `GET /events/years`
pub async fn years(
  State(state): State<AppState>,
  Query(params): Query<LookupParams>,
) -> Result<Json<Value>, ApiError> {
  let locale = locale_param(params.locale.as_deref())?;
  Ok(Json(json!({ "years": state.catalog.years(locale) })))
}

/// `GET /events/months?year=`
pub async fn months(
  State(state): State<AppState>,
  Query(params): Query<LookupParams>,
) -> Result<Json<Value>, ApiError> {
  let locale = locale_param(params.locale.as_deref())?;
  let year: i32 = required(params.year.as_deref(), "Missing year param")?;
  Ok(Json(json!({ "months": state.catalog.months(year, locale) })))
}

/// `GET /events/upcoming-years`
pub async fn upcoming_years(
  State(state): State<AppState>,
  Query(params): Query<LookupParams>,
) -> Result<Json<Value>, ApiError> {
  let locale = locale_param(params.locale.as_deref())?;
  Ok(Json(json!({ "years": state.catalog.upcoming_years(locale, Utc::now()) })))
}

/// `GET /events/by-month?year=&month=`
pub async fn by_month(
  State(state): State<AppState>,
  Query(params): Query<LookupParams>,
) -> Result<Json<Value>, ApiError> {
  let locale = locale_param(params.locale.as_deref())?;
  let year: i32 = required(params.year.as_deref(), "Missing year or month")?;
  let month: u32 = required(params.month.as_deref(), "Missing year or month")?;
  if month > 12 {
    return Err(ApiError::BadRequest(format!("no such month {month}")));
  }
  let populate = Populate::of([Relation::Images]);
  let now = Utc::now();
  let events = state
    .catalog
    .by_month(year, month, locale)
    .into_iter()
    .map(|e| render(e, &populate, now))
    .collect::<Result<Vec<_>, _>>()?;
  Ok(Json(Value::Array(events)))
}
