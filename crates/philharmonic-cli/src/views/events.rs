//! Events: upcoming events of a year, one accordion section per month.
//!
//! Only one month is open at a time. A month loads its first page when first
//! opened and further pages on an explicit "load more"; its items survive
//! being collapsed. Changing the year or the locale moves the accordion to a
//! new scope, which drops every month and invalidates their requests.

use chrono::{DateTime, Datelike, Utc};
use crossterm::event::KeyCode;
use philharmonic_core::{
  Completion, LoaderPhase, Result,
  accordion::{Accordion, ExpandPolicy, GroupTicket, MonthKey},
  event::EventRecord,
  locale::Locale,
  query::{EventQuery, Page},
  scope::{self, EVENTS_PAGE_SIZE},
};

use super::{Action, Scroll};
use crate::fetch::{Request, YearsFor};

pub type Planner = Box<dyn Fn(&MonthKey) -> Result<EventQuery>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
  Month(u32),
  Event(u32, usize),
  /// The month is open and its first page is on the way.
  Loading(u32),
  Empty(u32),
  LoadMore(u32),
}

pub struct EventsView {
  now:       DateTime<Utc>,
  locale:    Locale,
  years:     Option<Vec<i32>>,
  year:      i32,
  accordion: Accordion<MonthKey, Planner>,
  scroll:    Scroll,
}

fn planner(now: DateTime<Utc>) -> Planner {
  Box::new(move |key: &MonthKey| scope::upcoming_in_month(now, key.year, key.month, key.locale))
}

impl EventsView {
  pub fn new(now: DateTime<Utc>, locale: Locale) -> Self {
    let year = now.year();
    Self {
      now,
      locale,
      years: None,
      year,
      accordion: Accordion::new(
        (locale, year),
        planner(now),
        ExpandPolicy::Exclusive,
        EVENTS_PAGE_SIZE,
      ),
      scroll: Scroll::default(),
    }
  }

  pub fn year(&self) -> i32 { self.year }

  /// Selectable years, once known.
  pub fn years(&self) -> Option<&[i32]> { self.years.as_deref() }

  pub fn scroll(&self) -> &Scroll { &self.scroll }

  pub fn set_height(&mut self, height: u32) { self.scroll.set_height(height); }

  pub fn start(&mut self) -> Vec<Action> {
    vec![Action::Fetch(Request::Years { view: YearsFor::Events, locale: self.locale })]
  }

  pub fn reset(&mut self, locale: Locale) -> Vec<Action> {
    self.locale = locale;
    self.years = None;
    self.accordion.set_scope((locale, self.year));
    self.scroll.reset();
    self.start()
  }

  fn key(&self, month: u32) -> MonthKey { MonthKey { locale: self.locale, year: self.year, month } }

  fn select_year(&mut self, year: i32) {
    self.year = year;
    self.accordion.set_scope((self.locale, year));
    self.scroll.reset();
  }

  /// Keeps current and future years; the first becomes the selection.
  pub fn complete_years(&mut self, locale: Locale, result: Result<Vec<i32>>) -> Result<()> {
    if locale != self.locale {
      return Ok(());
    }
    let options = scope::upcoming_year_options(self.now, &result?);
    if let Some(&first) = options.first() {
      self.select_year(first);
    }
    self.years = Some(options);
    Ok(())
  }

  pub fn complete(
    &mut self,
    ticket: GroupTicket<MonthKey>,
    result: Result<Page<EventRecord>>,
  ) -> Result<Completion> {
    self.accordion.complete(ticket, result)
  }

  pub fn months(&self) -> Vec<u32> { scope::upcoming_months(self.now, self.year) }

  pub fn is_expanded(&self, month: u32) -> bool { self.accordion.is_expanded(&self.key(month)) }

  pub fn items(&self, month: u32) -> &[EventRecord] {
    self
      .accordion
      .group(&self.key(month))
      .map(|g| g.items())
      .unwrap_or_default()
  }

  pub fn phase(&self, month: u32) -> Option<LoaderPhase> {
    self.accordion.group(&self.key(month)).map(|g| g.phase())
  }

  pub fn rows(&self) -> Vec<Row> {
    let mut rows = Vec::new();
    for month in self.months() {
      rows.push(Row::Month(month));
      if !self.is_expanded(month) {
        continue;
      }
      let Some(group) = self.accordion.group(&self.key(month)) else {
        continue;
      };
      let count = group.items().len();
      rows.extend((0..count).map(|i| Row::Event(month, i)));
      match (count, group.phase()) {
        (0, LoaderPhase::Exhausted) => rows.push(Row::Empty(month)),
        (0, _) => rows.push(Row::Loading(month)),
        (_, LoaderPhase::Exhausted) => {}
        _ => rows.push(Row::LoadMore(month)),
      }
    }
    rows
  }

  fn toggle(&mut self, month: u32) -> Result<Vec<Action>> {
    let ticket = self.accordion.toggle(self.key(month))?;
    let rows = self.rows();
    // Collapsing a sibling above moves this month's header.
    if let Some(at) = rows.iter().position(|r| *r == Row::Month(month)) {
      self.scroll.reset();
      self.scroll.shift(at);
    }
    Ok(ticket.map(|t| Action::Fetch(Request::Group(t))).into_iter().collect())
  }

  fn load_more(&mut self, month: u32) -> Result<Vec<Action>> {
    let ticket = self.accordion.load_more(&self.key(month))?;
    Ok(ticket.map(|t| Action::Fetch(Request::Group(t))).into_iter().collect())
  }

  fn month_at_cursor(&self) -> Option<u32> {
    match self.rows().get(self.scroll.selected())? {
      Row::Month(m) | Row::Event(m, _) | Row::Loading(m) | Row::Empty(m) | Row::LoadMore(m) => {
        Some(*m)
      }
    }
  }

  pub fn handle_key(&mut self, code: KeyCode) -> Result<Vec<Action>> {
    match code {
      KeyCode::Char('y') => {
        if let Some(years) = self.years.as_deref().filter(|y| !y.is_empty()) {
          let next = match years.iter().position(|y| *y == self.year) {
            Some(at) => years[(at + 1) % years.len()],
            None => years[0],
          };
          self.select_year(next);
        }
      }
      KeyCode::Char('m') => {
        if let Some(month) = self.month_at_cursor() {
          return self.load_more(month);
        }
      }
      KeyCode::Enter | KeyCode::Char(' ') => {
        match self.rows().get(self.scroll.selected()).copied() {
          Some(Row::Month(m)) => return self.toggle(m),
          Some(Row::LoadMore(m)) => return self.load_more(m),
          Some(Row::Event(m, i)) => {
            if let Some(event) = self.items(m).get(i) {
              return Ok(vec![Action::ShowEvent(event.document_id.clone())]);
            }
          }
          _ => {}
        }
      }
      _ => {
        let len = self.rows().len();
        self.scroll.handle(code, len);
      }
    }
    Ok(Vec::new())
  }
}
