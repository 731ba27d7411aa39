//! The query model: filters, sorting, population and pagination.
//!
//! Queries are typed on both ends and travel as a JSON parameter tree
//! (see [`crate::qs`] for the query-string form). [`PageRequest::to_tree`] and
//! [`PageRequest::from_tree`] are inverse to each other for every request the
//! views build.

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};

use crate::{Error, Result, locale::Locale};

/// Page size used when a request does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 25;
/// Largest page size the catalog will serve.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Render a timestamp the way the content API writes them.
pub fn iso(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_iso(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|d| d.with_timezone(&Utc))
    .map_err(|e| Error::InvalidQuery(format!("bad timestamp {s:?}: {e}")))
}

// ─── Filters ─────────────────────────────────────────────────────────────────

/// A comparison operator in the filter tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
  Eq,
  Ne,
  Lt,
  Lte,
  Gt,
  Gte,
}

impl Comparison {
  pub fn operator(self) -> &'static str {
    match self {
      Self::Eq => "$eq",
      Self::Ne => "$ne",
      Self::Lt => "$lt",
      Self::Lte => "$lte",
      Self::Gt => "$gt",
      Self::Gte => "$gte",
    }
  }

  pub fn parse(op: &str) -> Option<Self> {
    Some(match op {
      "$eq" => Self::Eq,
      "$ne" => Self::Ne,
      "$lt" => Self::Lt,
      "$lte" => Self::Lte,
      "$gt" => Self::Gt,
      "$gte" => Self::Gte,
      _ => return None,
    })
  }

  /// Evaluate `lhs <op> rhs`.
  pub fn holds<T: Ord>(self, lhs: &T, rhs: &T) -> bool {
    match self {
      Self::Eq => lhs == rhs,
      Self::Ne => lhs != rhs,
      Self::Lt => lhs < rhs,
      Self::Lte => lhs <= rhs,
      Self::Gt => lhs > rhs,
      Self::Gte => lhs >= rhs,
    }
  }
}

/// A predicate over event fields. Only `date` and `locale` are filterable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
  And(Vec<Filter>),
  Date(Comparison, DateTime<Utc>),
  Locale(Comparison, Locale),
}

impl Filter {
  pub fn date(op: Comparison, at: DateTime<Utc>) -> Self { Self::Date(op, at) }

  pub fn locale_eq(locale: Locale) -> Self { Self::Locale(Comparison::Eq, locale) }

  /// `$and` of `clauses`, collapsed when there is only one.
  pub fn all(mut clauses: Vec<Filter>) -> Self {
    if clauses.len() == 1 {
      clauses.remove(0)
    } else {
      Self::And(clauses)
    }
  }

  pub fn matches(&self, date: DateTime<Utc>, locale: Locale) -> bool {
    match self {
      Self::And(clauses) => clauses.iter().all(|c| c.matches(date, locale)),
      Self::Date(op, at) => op.holds(&date, at),
      Self::Locale(op, l) => op.holds(&locale.code(), &l.code()),
    }
  }

  pub fn to_tree(&self) -> Value {
    match self {
      Self::And(clauses) => {
        json!({ "$and": clauses.iter().map(Filter::to_tree).collect::<Vec<_>>() })
      }
      Self::Date(op, at) => json!({ "date": { op.operator(): iso(*at) } }),
      Self::Locale(op, l) => json!({ "locale": { op.operator(): l.code() } }),
    }
  }

  /// Parse a filter tree. Sibling keys in one object are an implicit `$and`.
  pub fn from_tree(tree: &Value) -> Result<Self> {
    let map = tree
      .as_object()
      .ok_or_else(|| Error::InvalidQuery("filters must be an object".into()))?;
    let mut clauses = Vec::new();
    for (key, value) in map {
      match key.as_str() {
        "$and" => {
          let items = value
            .as_array()
            .ok_or_else(|| Error::InvalidQuery("$and expects a list".into()))?;
          let inner = items.iter().map(Filter::from_tree).collect::<Result<_>>()?;
          clauses.push(Self::And(inner));
        }
        "date" => {
          for (op, rhs) in operators(key, value)? {
            clauses.push(Self::Date(op, parse_iso(rhs)?));
          }
        }
        "locale" => {
          for (op, rhs) in operators(key, value)? {
            clauses.push(Self::Locale(op, rhs.parse()?));
          }
        }
        other => {
          return Err(Error::InvalidQuery(format!("invalid key {other}")));
        }
      }
    }
    Ok(Self::all(clauses))
  }
}

/// Read `{ "$op": "value", ... }` for `field`. A bare string means `$eq`.
fn operators<'a>(field: &str, value: &'a Value) -> Result<Vec<(Comparison, &'a str)>> {
  match value {
    Value::String(s) => Ok(vec![(Comparison::Eq, s.as_str())]),
    Value::Object(ops) => ops
      .iter()
      .map(|(op, rhs)| {
        let cmp = Comparison::parse(op).ok_or_else(|| {
          Error::InvalidQuery(format!("unsupported operator {op} on {field}"))
        })?;
        let rhs = rhs.as_str().ok_or_else(|| {
          Error::InvalidQuery(format!("{field}[{op}] expects a string"))
        })?;
        Ok((cmp, rhs))
      })
      .collect(),
    _ => Err(Error::InvalidQuery(format!("invalid filter on {field}"))),
  }
}

// ─── Sorting ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
  #[default]
  Asc,
  Desc,
}

impl Direction {
  pub fn flipped(self) -> Self {
    match self {
      Self::Asc => Self::Desc,
      Self::Desc => Self::Asc,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
  Date,
  Title,
}

impl SortField {
  fn wire_name(self) -> &'static str {
    match self {
      Self::Date => "date",
      Self::Title => "name",
    }
  }
}

/// One `field:direction` sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
  pub field:     SortField,
  pub direction: Direction,
}

impl SortKey {
  pub fn date_asc() -> Self {
    Self { field: SortField::Date, direction: Direction::Asc }
  }

  pub fn date_desc() -> Self {
    Self { field: SortField::Date, direction: Direction::Desc }
  }

  pub fn encode(&self) -> String {
    let dir = match self.direction {
      Direction::Asc => "asc",
      Direction::Desc => "desc",
    };
    format!("{}:{dir}", self.field.wire_name())
  }

  pub fn parse(s: &str) -> Result<Self> {
    let (field, dir) = s.split_once(':').unwrap_or((s, "asc"));
    let field = match field {
      "date" => SortField::Date,
      "name" => SortField::Title,
      other => return Err(Error::InvalidQuery(format!("cannot sort by {other}"))),
    };
    let direction = match dir.to_ascii_lowercase().as_str() {
      "asc" => Direction::Asc,
      "desc" => Direction::Desc,
      other => return Err(Error::InvalidQuery(format!("bad sort direction {other}"))),
    };
    Ok(Self { field, direction })
  }
}

// ─── Population ──────────────────────────────────────────────────────────────

/// A media relation that is only returned when asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Relation {
  Cover,
  Images,
  Videos,
}

impl Relation {
  pub const ALL: [Relation; 3] = [Relation::Cover, Relation::Images, Relation::Videos];

  pub fn wire_name(self) -> &'static str {
    match self {
      Self::Cover => "cover",
      Self::Images => "images",
      Self::Videos => "eventVideos",
    }
  }

  pub fn parse(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|r| r.wire_name() == name)
  }

  fn selector(self) -> Value {
    match self {
      Self::Cover | Self::Images => {
        json!({ "fields": ["url", "alternativeText", "formats", "name"] })
      }
      Self::Videos => json!({
        "fields": ["url"],
        "populate": { "thumbnail": { "fields": ["url", "alternativeText", "name"] } },
      }),
    }
  }
}

/// The set of relations to include in a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Populate(BTreeSet<Relation>);

impl Populate {
  pub fn none() -> Self { Self::default() }

  pub fn all() -> Self { Self(Relation::ALL.into_iter().collect()) }

  pub fn of(relations: impl IntoIterator<Item = Relation>) -> Self {
    Self(relations.into_iter().collect())
  }

  pub fn contains(&self, relation: Relation) -> bool { self.0.contains(&relation) }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn to_tree(&self) -> Value {
    let map: Map<String, Value> = self
      .0
      .iter()
      .map(|r| (r.wire_name().to_owned(), r.selector()))
      .collect();
    Value::Object(map)
  }

  /// Accepts `*`, a comma list, a list of names, or an object keyed by
  /// relation (field selectors are not interpreted).
  pub fn from_tree(tree: &Value) -> Result<Self> {
    let names: Vec<&str> = match tree {
      Value::String(s) if s == "*" => return Ok(Self::all()),
      Value::String(s) => s.split(',').map(str::trim).collect(),
      Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
      Value::Object(map) => map.keys().map(String::as_str).collect(),
      _ => return Err(Error::InvalidQuery("invalid populate".into())),
    };
    names
      .into_iter()
      .map(|n| {
        Relation::parse(n)
          .ok_or_else(|| Error::InvalidQuery(format!("invalid populate key {n}")))
      })
      .collect::<Result<_>>()
      .map(Self)
  }
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// What to ask for, independent of which page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
  pub filter:   Option<Filter>,
  pub sort:     Vec<SortKey>,
  pub populate: Populate,
  pub locale:   Locale,
}

impl EventQuery {
  pub fn new(locale: Locale) -> Self {
    Self {
      filter: None,
      sort: Vec::new(),
      populate: Populate::none(),
      locale,
    }
  }

  pub fn filter(mut self, filter: Filter) -> Self {
    self.filter = Some(filter);
    self
  }

  pub fn sort(mut self, key: SortKey) -> Self {
    self.sort.push(key);
    self
  }

  pub fn populate(mut self, populate: Populate) -> Self {
    self.populate = populate;
    self
  }
}

/// Position of a loader in a paginated collection. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
  page_number: u32,
  page_size:   u32,
}

impl PageCursor {
  /// The first page. A zero page size is raised to 1.
  pub fn first(page_size: u32) -> Self {
    Self { page_number: 1, page_size: page_size.max(1) }
  }

  pub fn page_number(&self) -> u32 { self.page_number }

  pub fn page_size(&self) -> u32 { self.page_size }

  pub fn advanced(self) -> Self {
    Self { page_number: self.page_number.saturating_add(1), ..self }
  }
}

/// One page of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
  pub query:  EventQuery,
  pub cursor: PageCursor,
}

impl PageRequest {
  pub fn new(query: EventQuery, cursor: PageCursor) -> Self {
    Self { query, cursor }
  }

  /// The parameter tree sent to `GET /events`.
  pub fn to_tree(&self) -> Value {
    let mut tree = Map::new();
    if let Some(filter) = &self.query.filter {
      tree.insert("filters".into(), filter.to_tree());
    }
    match self.query.sort.as_slice() {
      [] => {}
      [only] => {
        tree.insert("sort".into(), Value::String(only.encode()));
      }
      many => {
        tree.insert(
          "sort".into(),
          Value::Array(many.iter().map(|k| Value::String(k.encode())).collect()),
        );
      }
    }
    if !self.query.populate.is_empty() {
      tree.insert("populate".into(), self.query.populate.to_tree());
    }
    tree.insert(
      "pagination".into(),
      json!({
        "page": self.cursor.page_number,
        "pageSize": self.cursor.page_size,
      }),
    );
    tree.insert("locale".into(), Value::String(self.query.locale.code().into()));
    Value::Object(tree)
  }

  /// Parse a parameter tree. Missing pagination means page 1 of
  /// [`DEFAULT_PAGE_SIZE`]; page sizes are capped at [`MAX_PAGE_SIZE`].
  pub fn from_tree(tree: &Value) -> Result<Self> {
    let locale = match tree.get("locale").and_then(Value::as_str) {
      Some(code) => code.parse()?,
      None => Locale::default(),
    };
    let filter = tree.get("filters").map(Filter::from_tree).transpose()?;
    let sort = match tree.get("sort") {
      None => Vec::new(),
      Some(Value::String(s)) => {
        s.split(',').map(|k| SortKey::parse(k.trim())).collect::<Result<_>>()?
      }
      Some(Value::Array(items)) => items
        .iter()
        .map(|v| {
          v.as_str()
            .ok_or_else(|| Error::InvalidQuery("sort keys must be strings".into()))
            .and_then(SortKey::parse)
        })
        .collect::<Result<_>>()?,
      Some(_) => return Err(Error::InvalidQuery("invalid sort".into())),
    };
    let populate = tree
      .get("populate")
      .map(Populate::from_tree)
      .transpose()?
      .unwrap_or_default();

    let pagination = tree.get("pagination");
    let page = number_param(pagination, "page")?.unwrap_or(1);
    let page_size = number_param(pagination, "pageSize")?.unwrap_or(DEFAULT_PAGE_SIZE);
    if page == 0 {
      return Err(Error::InvalidQuery("pagination[page] must be at least 1".into()));
    }
    if page_size == 0 {
      return Err(Error::InvalidQuery("pagination[pageSize] must be at least 1".into()));
    }

    Ok(Self {
      query:  EventQuery { filter, sort, populate, locale },
      cursor: PageCursor {
        page_number: page,
        page_size:   page_size.min(MAX_PAGE_SIZE),
      },
    })
  }
}

fn number_param(parent: Option<&Value>, key: &str) -> Result<Option<u32>> {
  let Some(value) = parent.and_then(|p| p.get(key)) else {
    return Ok(None);
  };
  let parsed = match value {
    Value::String(s) => s.parse::<u32>().ok(),
    Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
    _ => None,
  };
  parsed
    .map(Some)
    .ok_or_else(|| Error::InvalidQuery(format!("pagination[{key}] must be a positive integer")))
}

/// One page of results together with the pagination the server reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
  pub items:       Vec<T>,
  pub page_number: u32,
  pub page_count:  u32,
  pub total:       u64,
}

impl<T> Page<T> {
  /// Whether another page can follow this one.
  pub fn has_more(&self) -> bool {
    !self.items.is_empty() && self.page_number < self.page_count
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::qs;

  fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
  }

  #[test]
  fn request_survives_the_query_string() {
    let query = EventQuery::new(Locale::Mk)
      .filter(Filter::all(vec![
        Filter::date(Comparison::Gte, at(2025, 3, 1)),
        Filter::date(Comparison::Lte, at(2025, 3, 31)),
      ]))
      .sort(SortKey::date_asc())
      .populate(Populate::of([Relation::Cover]));
    let request = PageRequest::new(query, PageCursor::first(4).advanced());

    let pairs = qs::flatten(&request.to_tree());
    assert!(pairs.contains(&("pagination[page]".into(), "2".into())));
    assert!(pairs.contains(&("sort".into(), "date:asc".into())));
    assert!(pairs.contains(&(
      "filters[$and][0][date][$gte]".into(),
      "2025-03-01T00:00:00.000Z".into()
    )));

    let parsed = PageRequest::from_tree(&qs::unflatten(pairs).unwrap()).unwrap();
    assert_eq!(parsed, request);
  }

  #[test]
  fn sibling_keys_are_an_implicit_and() {
    let tree = serde_json::json!({
      "locale": { "$eq": "en" },
      "date": { "$gte": "2024-01-01T00:00:00.000Z", "$lte": "2024-12-31T23:59:59.999Z" },
    });
    let filter = Filter::from_tree(&tree).unwrap();
    assert!(filter.matches(at(2024, 6, 1), Locale::En));
    assert!(!filter.matches(at(2024, 6, 1), Locale::Sq));
    assert!(!filter.matches(at(2025, 1, 1), Locale::En));
  }

  #[test]
  fn rejects_unknown_fields_and_operators() {
    let bad_field = serde_json::json!({ "title": { "$eq": "x" } });
    assert!(matches!(Filter::from_tree(&bad_field), Err(Error::InvalidQuery(_))));
    let bad_op = serde_json::json!({ "date": { "$between": "x" } });
    assert!(Filter::from_tree(&bad_op).is_err());
  }

  #[test]
  fn pagination_defaults_and_caps() {
    let parsed = PageRequest::from_tree(&serde_json::json!({})).unwrap();
    assert_eq!(parsed.cursor.page_number(), 1);
    assert_eq!(parsed.cursor.page_size(), DEFAULT_PAGE_SIZE);

    let big = serde_json::json!({ "pagination": { "pageSize": "500" } });
    let parsed = PageRequest::from_tree(&big).unwrap();
    assert_eq!(parsed.cursor.page_size(), MAX_PAGE_SIZE);

    let zero = serde_json::json!({ "pagination": { "page": "0" } });
    assert!(PageRequest::from_tree(&zero).is_err());
  }

  #[test]
  fn empty_page_never_has_more() {
    let page: Page<u8> = Page { items: vec![], page_number: 1, page_count: 3, total: 0 };
    assert!(!page.has_more());
  }
}
