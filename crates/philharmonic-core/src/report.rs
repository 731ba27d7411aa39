//! The published reports table: filtering and column sorting.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::query::Direction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
  pub id:          u32,
  pub year:        i32,
  pub kind:        String,
  pub file:        String,
  /// Human-readable, e.g. `2.1 MB`. Sorted as text.
  pub size:        String,
  pub updated:     NaiveDate,
  pub uploaded_by: String,
}

/// The reports published by the orchestra.
pub fn builtin_reports() -> Vec<Report> {
  let row = |id, year, kind: &str, file: &str, size: &str, updated: (i32, u32, u32), by: &str| {
    Report {
      id,
      year,
      kind: kind.into(),
      file: file.into(),
      size: size.into(),
      updated: NaiveDate::from_ymd_opt(updated.0, updated.1, updated.2).unwrap_or(NaiveDate::MIN),
      uploaded_by: by.into(),
    }
  };
  vec![
    row(1, 2024, "Financial", "report2024.pdf", "2.1 MB", (2024, 10, 20), "Finance Dept"),
    row(2, 2023, "Activity", "activity2023.pdf", "1.6 MB", (2023, 11, 2), "HR Team"),
    row(3, 2023, "Annual", "annual2023.pdf", "2.8 MB", (2023, 12, 5), "Admin Office"),
    row(4, 2022, "Financial", "finance2022.pdf", "1.9 MB", (2022, 8, 15), "Finance Dept"),
    row(5, 2021, "Audit", "audit2021.pdf", "2.4 MB", (2021, 7, 30), "External Auditor"),
  ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
  Year,
  Kind,
  File,
  Size,
  Updated,
  UploadedBy,
}

impl Column {
  pub const ALL: [Column; 6] = [
    Column::Year,
    Column::Kind,
    Column::File,
    Column::Size,
    Column::Updated,
    Column::UploadedBy,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Self::Year => "Year",
      Self::Kind => "Type",
      Self::File => "File",
      Self::Size => "Size",
      Self::Updated => "Last Updated",
      Self::UploadedBy => "Uploaded By",
    }
  }

  fn compare(self, a: &Report, b: &Report) -> Ordering {
    match self {
      Self::Year => a.year.cmp(&b.year),
      Self::Kind => a.kind.cmp(&b.kind),
      Self::File => a.file.cmp(&b.file),
      Self::Size => a.size.cmp(&b.size),
      Self::Updated => a.updated.cmp(&b.updated),
      Self::UploadedBy => a.uploaded_by.cmp(&b.uploaded_by),
    }
  }
}

/// A select filter: everything, or one exact value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Choice<T> {
  #[default]
  All,
  Only(T),
}

impl<T: PartialEq> Choice<T> {
  fn admits(&self, value: &T) -> bool {
    match self {
      Self::All => true,
      Self::Only(v) => v == value,
    }
  }
}

#[derive(Debug, Clone)]
pub struct ReportTable {
  reports: Vec<Report>,
  pub year:   Choice<i32>,
  pub kind:   Choice<String>,
  pub search: String,
  sort:       (Column, Direction),
}

impl ReportTable {
  pub fn new(reports: Vec<Report>) -> Self {
    Self {
      reports,
      year: Choice::All,
      kind: Choice::All,
      search: String::new(),
      sort: (Column::Year, Direction::Desc),
    }
  }

  pub fn sort(&self) -> (Column, Direction) { self.sort }

  /// Clicking the active column while ascending flips it; anything else
  /// sorts ascending by `column`.
  pub fn sort_by(&mut self, column: Column) {
    let direction = match self.sort {
      (active, Direction::Asc) if active == column => Direction::Desc,
      _ => Direction::Asc,
    };
    self.sort = (column, direction);
  }

  /// Distinct years in first-seen order. `All` is implied first.
  pub fn year_options(&self) -> Vec<i32> {
    let mut out = Vec::new();
    for r in &self.reports {
      if !out.contains(&r.year) {
        out.push(r.year);
      }
    }
    out
  }

  pub fn kind_options(&self) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for r in &self.reports {
      if !out.contains(&r.kind) {
        out.push(r.kind.clone());
      }
    }
    out
  }

  pub fn rows(&self) -> Vec<&Report> {
    let needle = self.search.to_lowercase();
    let mut rows: Vec<&Report> = self
      .reports
      .iter()
      .filter(|r| self.year.admits(&r.year) && self.kind.admits(&r.kind))
      .filter(|r| {
        [&r.kind, &r.file, &r.uploaded_by]
          .iter()
          .any(|field| field.to_lowercase().contains(&needle))
      })
      .collect();
    let (column, direction) = self.sort;
    rows.sort_by(|a, b| {
      let ord = column.compare(a, b);
      if direction == Direction::Desc { ord.reverse() } else { ord }
    });
    rows
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ids(table: &ReportTable) -> Vec<u32> { table.rows().iter().map(|r| r.id).collect() }

  #[test]
  fn defaults_to_newest_year_first() {
    let table = ReportTable::new(builtin_reports());
    assert_eq!(ids(&table), vec![1, 2, 3, 4, 5]);
    assert_eq!(table.year_options(), vec![2024, 2023, 2022, 2021]);
    assert_eq!(table.kind_options(), vec!["Financial", "Activity", "Annual", "Audit"]);
  }

  #[test]
  fn filters_combine_with_search() {
    let mut table = ReportTable::new(builtin_reports());
    table.search = "FINANCE".into();
    assert_eq!(ids(&table), vec![1, 4]);
    table.year = Choice::Only(2022);
    assert_eq!(ids(&table), vec![4]);
    table.year = Choice::All;
    table.kind = Choice::Only("Audit".into());
    assert!(table.rows().is_empty());
  }

  #[test]
  fn sort_toggles_on_the_active_column() {
    let mut table = ReportTable::new(builtin_reports());
    // Year is active but descending, so it starts over ascending.
    table.sort_by(Column::Year);
    assert_eq!(table.sort(), (Column::Year, Direction::Asc));
    table.sort_by(Column::Year);
    assert_eq!(table.sort(), (Column::Year, Direction::Desc));
    table.sort_by(Column::File);
    assert_eq!(table.sort(), (Column::File, Direction::Asc));
    assert_eq!(ids(&table)[0], 2);
  }
}
