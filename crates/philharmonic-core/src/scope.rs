//! The queries each view issues.
//!
//! Month and year ranges are in UTC and inclusive: from the first millisecond
//! of the period to its last.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

use crate::{
  Error, Result,
  locale::Locale,
  query::{Comparison, EventQuery, Filter, Populate, Relation, SortKey},
};

pub const EVENTS_PAGE_SIZE: u32 = 4;
pub const GALLERY_PAGE_SIZE: u32 = 4;
pub const PAST_PAGE_SIZE: u32 = 2;
pub const HOME_TEASER_SIZE: u32 = 3;

fn start_of(year: i32, month: u32) -> Result<DateTime<Utc>> {
  NaiveDate::from_ymd_opt(year, month, 1)
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|d| Utc.from_utc_datetime(&d))
    .ok_or_else(|| Error::InvalidQuery(format!("no such month {year}-{month:02}")))
}

/// First and last millisecond of a calendar month.
pub fn month_range(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
  let start = start_of(year, month)?;
  let next = if month == 12 { start_of(year + 1, 1)? } else { start_of(year, month + 1)? };
  Ok((start, next - Duration::milliseconds(1)))
}

/// First and last millisecond of a calendar year.
pub fn year_range(year: i32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
  let start = start_of(year, 1)?;
  Ok((start, start_of(year + 1, 1)? - Duration::milliseconds(1)))
}

fn within(start: DateTime<Utc>, end: DateTime<Utc>) -> [Filter; 2] {
  [Filter::date(Comparison::Gte, start), Filter::date(Comparison::Lte, end)]
}

/// Events view: upcoming events in one month, soonest first.
pub fn upcoming_in_month(
  now: DateTime<Utc>,
  year: i32,
  month: u32,
  locale: Locale,
) -> Result<EventQuery> {
  let (start, end) = month_range(year, month)?;
  let [from, to] = within(start, end);
  Ok(
    EventQuery::new(locale)
      .filter(Filter::all(vec![Filter::date(Comparison::Gte, now), from, to]))
      .sort(SortKey::date_asc())
      .populate(Populate::of([Relation::Cover])),
  )
}

/// Gallery: every event of a year, or of one month of it, newest first.
pub fn gallery(year: i32, month: Option<u32>, locale: Locale) -> Result<EventQuery> {
  let (start, end) = match month {
    Some(m) => month_range(year, m)?,
    None => year_range(year)?,
  };
  let [from, to] = within(start, end);
  Ok(
    EventQuery::new(locale)
      .filter(Filter::all(vec![Filter::locale_eq(locale), from, to]))
      .sort(SortKey::date_desc())
      .populate(Populate::of([Relation::Images])),
  )
}

/// Past Events: everything before `now`, most recent first.
pub fn past(now: DateTime<Utc>, locale: Locale) -> EventQuery {
  EventQuery::new(locale)
    .filter(Filter::date(Comparison::Lt, now))
    .sort(SortKey::date_desc())
    .populate(Populate::of([Relation::Cover]))
}

pub fn home_upcoming(now: DateTime<Utc>, locale: Locale) -> EventQuery {
  EventQuery::new(locale)
    .filter(Filter::date(Comparison::Gte, now))
    .sort(SortKey::date_asc())
    .populate(Populate::of([Relation::Cover]))
}

pub fn home_past(now: DateTime<Utc>, locale: Locale) -> EventQuery {
  past(now, locale)
}

/// Years offered by the Events view: current and future years, ascending.
pub fn upcoming_year_options(now: DateTime<Utc>, years: &[i32]) -> Vec<i32> {
  let mut out: Vec<i32> = years.iter().copied().filter(|y| *y >= now.year()).collect();
  out.sort_unstable();
  out.dedup();
  out
}

/// Months listed for `year` in the Events view: the rest of the current year,
/// all of a future one, none of a past one.
pub fn upcoming_months(now: DateTime<Utc>, year: i32) -> Vec<u32> {
  match year.cmp(&now.year()) {
    std::cmp::Ordering::Less => Vec::new(),
    std::cmp::Ordering::Equal => (now.month()..=12).collect(),
    std::cmp::Ordering::Greater => (1..=12).collect(),
  }
}
