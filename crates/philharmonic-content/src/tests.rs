//! Router tests against a small in-memory catalog.

use axum::{
  body::Body,
  http::{Request, StatusCode},
};
use chrono::{TimeZone, Utc};
use philharmonic_core::{event::{EventRecord, ImageRef}, locale::Locale};
use serde_json::Value;
use tower::ServiceExt as _;

use crate::{AppState, Catalog, StoredEvent, router};

fn stored(id: u64, doc: &str, locale: Locale, y: i32, m: u32, d: u32) -> StoredEvent {
  StoredEvent {
    locale,
    record: EventRecord {
      id,
      document_id: doc.into(),
      title: format!("Concert {id}"),
      description: "<p>Programme</p>".into(),
      location: Some("Skopje".into()),
      date: Utc.with_ymd_and_hms(y, m, d, 19, 0, 0).unwrap(),
      cover: Some(ImageRef::new("/uploads/cover.jpg")),
      images: vec![ImageRef::new("/uploads/a.jpg"), ImageRef::new("/uploads/b.jpg")],
      videos: vec![],
    },
  }
}

fn state() -> AppState {
  AppState::new(Catalog::new(vec![
    stored(1, "spring", Locale::En, 2023, 3, 10),
    stored(2, "summer", Locale::En, 2023, 7, 1),
    stored(3, "autumn", Locale::En, 2023, 7, 20),
    stored(4, "gala", Locale::En, 2999, 1, 5),
    stored(5, "spring", Locale::Mk, 2023, 3, 10),
  ]))
}

async fn get(uri: &str) -> (StatusCode, Value) {
  let uri = uri.replace('[', "%5B").replace(']', "%5D");
  let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
  let resp = router(state()).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap())
}

fn ids(data: &Value) -> Vec<u64> {
  data
    .as_array()
    .unwrap()
    .iter()
    .map(|e| e["id"].as_u64().unwrap())
    .collect()
}

// ── List ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_paginates_and_reports_page_count() {
  let (status, body) =
    get("/api/events?sort=date:asc&pagination[page]=2&pagination[pageSize]=2&locale=en").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(ids(&body["data"]), vec![3, 4]);
  let pagination = &body["meta"]["pagination"];
  assert_eq!(pagination["page"], 2);
  assert_eq!(pagination["pageCount"], 2);
  assert_eq!(pagination["total"], 4);
}

#[tokio::test]
async fn list_applies_filter_trees() {
  let uri = "/api/events?locale=en&sort=date:desc\
    &filters[$and][0][date][$gte]=2023-07-01T00:00:00.000Z\
    &filters[$and][1][date][$lte]=2023-07-31T23:59:59.999Z";
  let (status, body) = get(uri).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(ids(&body["data"]), vec![3, 2]);
}

#[tokio::test]
async fn list_only_includes_populated_relations() {
  let (_, bare) = get("/api/events?locale=en&pagination[pageSize]=1").await;
  let first = &bare["data"][0];
  assert!(first.get("images").is_none());
  assert!(first.get("cover").is_none());
  assert_eq!(first["status"], "past");

  let (_, populated) =
    get("/api/events?locale=en&pagination[pageSize]=1&populate[images][fields][0]=url").await;
  assert_eq!(populated["data"][0]["images"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn list_rejects_unknown_filter_keys() {
  let (status, body) = get("/api/events?filters[title][$eq]=x").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["data"], Value::Null);
  assert_eq!(body["error"]["name"], "ValidationError");
  assert_eq!(body["error"]["details"]["errors"][0]["message"], "invalid key title");
}

#[tokio::test]
async fn empty_result_has_zero_pages() {
  let (_, body) = get("/api/events?locale=sq").await;
  assert_eq!(ids(&body["data"]), Vec::<u64>::new());
  assert_eq!(body["meta"]["pagination"]["pageCount"], 0);
}

// ── Get one ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_one_is_locale_aware() {
  let (status, body) = get("/api/events/spring?locale=mk&populate=*").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["id"], 5);
  assert_eq!(body["data"]["date"], "2023-03-10T19:00:00.000Z");
  assert!(body["data"]["cover"].is_object());

  let (status, body) = get("/api/events/gala?locale=mk").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"]["status"], 404);
}

// ── Lookups ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn years_are_newest_first() {
  let (_, body) = get("/api/events/years?locale=en").await;
  assert_eq!(body["years"], serde_json::json!([2999, 2023]));
}

#[tokio::test]
async fn months_require_a_year() {
  let (_, body) = get("/api/events/months?year=2023&locale=en").await;
  assert_eq!(body["months"], serde_json::json!([3, 7]));

  let (status, body) = get("/api/events/months?locale=en").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"]["message"], "Missing year param");
}

#[tokio::test]
async fn upcoming_years_skip_the_past() {
  let (_, body) = get("/api/events/upcoming-years?locale=en").await;
  assert_eq!(body["years"], serde_json::json!([2999]));
}

#[tokio::test]
async fn by_month_is_a_bare_newest_first_array_with_images() {
  let (status, body) = get("/api/events/by-month?year=2023&month=7&locale=en").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(ids(&body), vec![3, 2]);
  assert!(body[0]["images"].is_array());

  let (status, _) = get("/api/events/by-month?year=2023").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Catalog file ─────────────────────────────────────────────────────────────

#[test]
fn example_catalog_parses() {
  let catalog = Catalog::from_json(include_bytes!("../catalog.example.json")).unwrap();
  assert_eq!(catalog.len(), 6);
  assert_eq!(catalog.years(Locale::En), vec![2027, 2025]);
  assert!(catalog.find("k2v9x1newyear", Locale::Sq).is_some());
}

// ── Rendering ────────────────────────────────────────────────────────────────

#[test]
fn render_keeps_requested_relations_and_adds_status() {
  use philharmonic_core::query::{Populate, Relation};

  let event = stored(7, "late", Locale::En, 2023, 3, 10).record;
  let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
  let value = crate::events::render(&event, &Populate::of([Relation::Images]), now).unwrap();
  assert_eq!(value["status"], "past");
  assert_eq!(value["date"], "2023-03-10T19:00:00.000Z");
  assert!(value["images"].is_array());
  assert!(value.get("cover").is_none());
}

#[test]
fn internal_errors_become_a_server_error_body() {
  use axum::response::IntoResponse as _;

  let resp = crate::error::ApiError::Internal("rendering event 7: boom".into()).into_response();
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
