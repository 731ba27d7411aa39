//! Integration tests against the content server on an ephemeral port.

use chrono::{TimeZone, Utc};
use philharmonic_content::{AppState, Catalog, StoredEvent};
use philharmonic_core::{
  CollectionLoader, Completion, Error,
  event::{EventRecord, ImageRef},
  locale::Locale,
  query::{EventQuery, PageCursor, PageRequest, SortKey},
  scope,
  source::ContentSource,
};
use tokio::net::TcpListener;

use crate::{ClientConfig, ContentClient};

fn stored(id: u64, locale: Locale, y: i32, m: u32, d: u32) -> StoredEvent {
  StoredEvent {
    locale,
    record: EventRecord {
      id,
      document_id: format!("doc{id}"),
      title: format!("Concert {id}"),
      description: String::new(),
      location: None,
      date: Utc.with_ymd_and_hms(y, m, d, 19, 0, 0).unwrap(),
      cover: Some(ImageRef::new("/uploads/cover.jpg")),
      images: vec![ImageRef::new("/uploads/1.jpg")],
      videos: vec![],
    },
  }
}

async fn serve() -> ContentClient {
  let catalog = Catalog::new(vec![
    stored(1, Locale::En, 2022, 5, 1),
    stored(2, Locale::En, 2022, 5, 20),
    stored(3, Locale::En, 2022, 9, 3),
    stored(4, Locale::En, 2023, 1, 8),
    stored(5, Locale::En, 2023, 2, 14),
    stored(6, Locale::Sq, 2023, 2, 14),
  ]);
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let address = listener.local_addr().unwrap();
  let app = philharmonic_content::router(AppState::new(catalog));
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  ContentClient::new(ClientConfig::new(format!("http://{address}/"))).unwrap()
}

#[tokio::test]
async fn fetches_pages_through_the_query_string() {
  let client = serve().await;
  let query = scope::gallery(2022, None, Locale::En).unwrap();
  let page = client
    .fetch_page(&PageRequest::new(query, PageCursor::first(2)))
    .await
    .unwrap();
  let ids: Vec<u64> = page.items.iter().map(|e| e.id).collect();
  assert_eq!(ids, vec![3, 2]);
  assert_eq!(page.page_count, 2);
  assert!(page.has_more());
  assert_eq!(page.items[0].images.len(), 1);
  assert!(page.items[0].cover.is_none());
}

#[tokio::test]
async fn loader_drains_a_collection_over_http() {
  let client = serve().await;
  let query = EventQuery::new(Locale::En).sort(SortKey::date_asc());
  let mut loader = CollectionLoader::new(query, 2);
  while loader.has_more() {
    loader.load_next(&client).await.unwrap();
  }
  let ids: Vec<u64> = loader.items().iter().map(|e| e.id).collect();
  assert_eq!(ids, vec![1, 2, 3, 4, 5]);
  assert_eq!(loader.load_next(&client).await.unwrap(), Completion::Skipped);
}

#[tokio::test]
async fn fetches_single_events_by_document_id() {
  let client = serve().await;
  let event = client.fetch_event("doc6", Locale::Sq).await.unwrap().unwrap();
  assert_eq!(event.id, 6);
  assert!(event.cover.is_some());
  assert!(client.fetch_event("doc6", Locale::En).await.unwrap().is_none());
}

#[tokio::test]
async fn lookup_endpoints() {
  let client = serve().await;
  assert_eq!(client.event_years(Locale::En).await.unwrap(), vec![2023, 2022]);
  assert_eq!(client.event_months(2022, Locale::En).await.unwrap(), vec![5, 9]);
  assert!(client.upcoming_years(Locale::En).await.unwrap().is_empty());
  let may = client.events_by_month(2022, 5, Locale::En).await.unwrap();
  assert_eq!(may.iter().map(|e| e.id).collect::<Vec<_>>(), vec![2, 1]);
}

#[tokio::test]
async fn validation_errors_are_rejections() {
  let client = serve().await;
  let err = client.event_months(0, Locale::En).await.unwrap_err();
  assert_eq!(err, Error::RemoteRejected("Missing year param".into()));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let address = listener.local_addr().unwrap();
  drop(listener);
  let client = ContentClient::new(ClientConfig::new(format!("http://{address}"))).unwrap();
  let err = client.event_years(Locale::En).await.unwrap_err();
  assert!(matches!(err, Error::NetworkUnavailable(_)), "{err:?}");
}
