//! Requests issued by the views and the responses that come back.
//!
//! Views never await anything. They hand out [`Request`]s; the dispatcher runs
//! each on its own tokio task and sends a [`Msg`] back to the UI loop, which
//! applies it to the view that asked.

use std::sync::Arc;

use philharmonic_core::{
  PageTicket, Result,
  accordion::{GroupTicket, MonthKey},
  event::EventRecord,
  locale::Locale,
  query::Page,
  source::ContentSource,
};
use tokio::sync::mpsc::UnboundedSender;

/// The single-loader collections a response can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
  HomeUpcoming,
  HomePast,
  Gallery,
  Past,
}

/// Which view asked for the year list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearsFor {
  Events,
  Gallery,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
  Page { feed: Feed, ticket: PageTicket },
  Group(GroupTicket<MonthKey>),
  Years { view: YearsFor, locale: Locale },
  Months { year: i32, locale: Locale },
  Event { document_id: String, locale: Locale },
}

#[derive(Debug)]
pub enum Msg {
  Page {
    feed:   Feed,
    ticket: PageTicket,
    result: Result<Page<EventRecord>>,
  },
  Group {
    ticket: GroupTicket<MonthKey>,
    result: Result<Page<EventRecord>>,
  },
  Years {
    view:   YearsFor,
    locale: Locale,
    result: Result<Vec<i32>>,
  },
  Months {
    year:   i32,
    locale: Locale,
    result: Result<Vec<u32>>,
  },
  Event {
    document_id: String,
    locale:      Locale,
    result:      Result<Option<EventRecord>>,
  },
}

/// Runs one request to completion.
pub async fn run<S: ContentSource + ?Sized>(source: &S, request: Request) -> Msg {
  match request {
    Request::Page { feed, ticket } => {
      let result = source.fetch_page(ticket.request()).await;
      Msg::Page { feed, ticket, result }
    }
    Request::Group(ticket) => {
      let result = source.fetch_page(ticket.ticket.request()).await;
      Msg::Group { ticket, result }
    }
    Request::Years { view, locale } => {
      let result = source.event_years(locale).await;
      Msg::Years { view, locale, result }
    }
    Request::Months { year, locale } => {
      let result = source.event_months(year, locale).await;
      Msg::Months { year, locale, result }
    }
    Request::Event { document_id, locale } => {
      let result = source.fetch_event(&document_id, locale).await;
      Msg::Event { document_id, locale, result }
    }
  }
}

/// Where the app sends its requests.
pub type Dispatch = Box<dyn Fn(Request)>;

/// Spawn every request on the runtime and post the result to `tx`.
pub fn spawner<S>(source: Arc<S>, tx: UnboundedSender<Msg>) -> Dispatch
where
  S: ContentSource + 'static,
{
  Box::new(move |request| {
    let source = Arc::clone(&source);
    let tx = tx.clone();
    tokio::spawn(async move {
      let msg = run(source.as_ref(), request).await;
      if tx.send(msg).is_err() {
        tracing::debug!("ui loop gone, dropping response");
      }
    });
  })
}
