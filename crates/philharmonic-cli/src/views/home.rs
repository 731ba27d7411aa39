//! Home: a teaser of upcoming events next to the most recent past ones.

use chrono::{DateTime, Utc};
use crossterm::event::KeyCode;
use philharmonic_core::{
  CollectionLoader, Completion, PageTicket, Result,
  event::EventRecord,
  locale::Locale,
  query::Page,
  scope::{self, HOME_TEASER_SIZE},
};

use super::Action;
use crate::fetch::{Feed, Request};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
  Upcoming,
  Past,
}

#[derive(Debug, Clone)]
pub struct HomeView {
  upcoming: CollectionLoader,
  past:     CollectionLoader,
  column:   Column,
  selected: usize,
}

impl HomeView {
  pub fn new(now: DateTime<Utc>, locale: Locale) -> Self {
    Self {
      upcoming: CollectionLoader::new(scope::home_upcoming(now, locale), HOME_TEASER_SIZE),
      past:     CollectionLoader::new(scope::home_past(now, locale), HOME_TEASER_SIZE),
      column:   Column::Upcoming,
      selected: 0,
    }
  }

  pub fn upcoming(&self) -> &CollectionLoader { &self.upcoming }

  pub fn past(&self) -> &CollectionLoader { &self.past }

  pub fn column(&self) -> Column { self.column }

  pub fn selected(&self) -> usize { self.selected }

  /// Each teaser is a single page; nothing more is ever requested.
  pub fn start(&mut self) -> Vec<Action> {
    let upcoming = self.upcoming.begin_next().map(|ticket| Request::Page {
      feed: Feed::HomeUpcoming,
      ticket,
    });
    let past = self
      .past
      .begin_next()
      .map(|ticket| Request::Page { feed: Feed::HomePast, ticket });
    upcoming.into_iter().chain(past).map(Action::Fetch).collect()
  }

  pub fn reset(&mut self, now: DateTime<Utc>, locale: Locale) -> Vec<Action> {
    self.upcoming.reset(scope::home_upcoming(now, locale));
    self.past.reset(scope::home_past(now, locale));
    self.selected = 0;
    self.start()
  }

  pub fn complete(
    &mut self,
    feed: Feed,
    ticket: PageTicket,
    result: Result<Page<EventRecord>>,
  ) -> Result<Completion> {
    match feed {
      Feed::HomeUpcoming => self.upcoming.complete(ticket, result),
      _ => self.past.complete(ticket, result),
    }
  }

  fn items(&self) -> &[EventRecord] {
    match self.column {
      Column::Upcoming => self.upcoming.items(),
      Column::Past => self.past.items(),
    }
  }

  pub fn handle_key(&mut self, code: KeyCode) -> Vec<Action> {
    match code {
      KeyCode::Left | KeyCode::Right | KeyCode::Char('h') | KeyCode::Char('l') => {
        self.column = match self.column {
          Column::Upcoming => Column::Past,
          Column::Past => Column::Upcoming,
        };
        self.selected = self.selected.min(self.items().len().saturating_sub(1));
      }
      KeyCode::Down | KeyCode::Char('j') => {
        if self.selected + 1 < self.items().len() {
          self.selected += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
      KeyCode::Enter => {
        if let Some(event) = self.items().get(self.selected) {
          return vec![Action::ShowEvent(event.document_id.clone())];
        }
      }
      _ => {}
    }
    Vec::new()
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use philharmonic_core::query::Direction;

  use super::*;
  use crate::views::tests::{event, page};

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap() }

  fn tickets(actions: Vec<Action>) -> Vec<(Feed, PageTicket)> {
    actions
      .into_iter()
      .map(|a| match a {
        Action::Fetch(Request::Page { feed, ticket }) => (feed, ticket),
        other => panic!("unexpected {other:?}"),
      })
      .collect()
  }

  #[test]
  fn start_requests_both_teasers_once() {
    let mut home = HomeView::new(now(), Locale::En);
    let issued = tickets(home.start());
    assert_eq!(issued.len(), 2);
    assert_eq!(issued[0].0, Feed::HomeUpcoming);
    assert_eq!(issued[0].1.request().cursor.page_size(), HOME_TEASER_SIZE);
    assert_eq!(issued[1].1.request().query.sort[0].direction, Direction::Desc);
    assert!(home.start().is_empty());
  }

  #[test]
  fn enter_opens_the_selected_teaser() {
    let mut home = HomeView::new(now(), Locale::En);
    let issued = tickets(home.start());
    let (feed, ticket) = issued[1].clone();
    home
      .complete(feed, ticket, Ok(page(vec![event(1, "first"), event(2, "second")], 1)))
      .unwrap();

    home.handle_key(KeyCode::Right);
    assert_eq!(home.column(), Column::Past);
    home.handle_key(KeyCode::Down);
    home.handle_key(KeyCode::Down);
    assert_eq!(home.handle_key(KeyCode::Enter), vec![Action::ShowEvent("second".into())]);
  }

  #[test]
  fn reset_discards_responses_for_the_old_locale() {
    let mut home = HomeView::new(now(), Locale::En);
    let old = tickets(home.start());
    let fresh = tickets(home.reset(now(), Locale::Sq));
    assert_eq!(fresh[0].1.request().query.locale, Locale::Sq);

    let (feed, ticket) = old[0].clone();
    let stale = home.complete(feed, ticket, Ok(page(vec![event(9, "old")], 1)));
    assert_eq!(stale, Ok(Completion::Stale));
    assert!(home.upcoming().items().is_empty());
  }
}
