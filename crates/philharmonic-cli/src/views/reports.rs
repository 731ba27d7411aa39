//! Reports: the built-in table of published documents.

use crossterm::event::KeyCode;
use philharmonic_core::report::{Choice, Column, ReportTable, builtin_reports};

use super::Scroll;

/// Step a select filter through `All` and then each option in turn.
fn cycle<T: Clone + PartialEq>(current: &Choice<T>, options: &[T]) -> Choice<T> {
  let next = match current {
    Choice::All => options.first(),
    Choice::Only(v) => options.iter().skip_while(|o| *o != v).nth(1),
  };
  next.cloned().map_or(Choice::All, Choice::Only)
}

#[derive(Debug, Clone)]
pub struct ReportsView {
  table:     ReportTable,
  column:    usize,
  searching: bool,
  scroll:    Scroll,
}

impl Default for ReportsView {
  fn default() -> Self { Self::new(ReportTable::new(builtin_reports())) }
}

impl ReportsView {
  pub fn new(table: ReportTable) -> Self {
    Self { table, column: 0, searching: false, scroll: Scroll::default() }
  }

  pub fn table(&self) -> &ReportTable { &self.table }

  /// The column `s` sorts by.
  pub fn column(&self) -> Column { Column::ALL[self.column] }

  pub fn is_searching(&self) -> bool { self.searching }

  pub fn scroll(&self) -> &Scroll { &self.scroll }

  pub fn set_height(&mut self, height: u32) { self.scroll.set_height(height); }

  pub fn captures_keys(&self) -> bool { self.searching }

  pub fn handle_key(&mut self, code: KeyCode) {
    if self.searching {
      match code {
        KeyCode::Esc => {
          self.table.search.clear();
          self.searching = false;
        }
        KeyCode::Enter => self.searching = false,
        KeyCode::Backspace => {
          self.table.search.pop();
        }
        KeyCode::Char(c) => self.table.search.push(c),
        _ => return,
      }
      self.scroll.reset();
      return;
    }

    match code {
      KeyCode::Char('/') => {
        self.searching = true;
        self.table.search.clear();
        self.scroll.reset();
      }
      KeyCode::Char('y') => {
        self.table.year = cycle(&self.table.year, &self.table.year_options());
        self.scroll.reset();
      }
      KeyCode::Char('t') => {
        self.table.kind = cycle(&self.table.kind, &self.table.kind_options());
        self.scroll.reset();
      }
      KeyCode::Left | KeyCode::Char('h') => {
        self.column = (self.column + Column::ALL.len() - 1) % Column::ALL.len();
      }
      KeyCode::Right | KeyCode::Char('l') => self.column = (self.column + 1) % Column::ALL.len(),
      KeyCode::Char('s') | KeyCode::Enter => self.table.sort_by(self.column()),
      _ => {
        let len = self.table.rows().len();
        self.scroll.handle(code, len);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use philharmonic_core::query::Direction;

  use super::*;

  fn ids(view: &ReportsView) -> Vec<u32> { view.table().rows().iter().map(|r| r.id).collect() }

  #[test]
  fn year_and_type_filters_cycle_back_to_all() {
    let mut view = ReportsView::default();
    let years = view.table().year_options();
    for year in &years {
      view.handle_key(KeyCode::Char('y'));
      assert_eq!(view.table().year, Choice::Only(*year));
      assert!(view.table().rows().iter().all(|r| r.year == *year));
    }
    view.handle_key(KeyCode::Char('y'));
    assert_eq!(view.table().year, Choice::All);

    view.handle_key(KeyCode::Char('t'));
    assert_eq!(view.table().kind, Choice::Only(view.table().kind_options()[0].clone()));
  }

  #[test]
  fn search_mode_captures_typing() {
    let mut view = ReportsView::default();
    view.handle_key(KeyCode::Char('/'));
    assert!(view.captures_keys());
    for c in "audit".chars() {
      view.handle_key(KeyCode::Char(c));
    }
    view.handle_key(KeyCode::Enter);
    assert!(!view.is_searching());
    assert_eq!(view.table().search, "audit");
    assert_eq!(ids(&view), vec![5]);

    view.handle_key(KeyCode::Char('/'));
    view.handle_key(KeyCode::Char('x'));
    view.handle_key(KeyCode::Esc);
    assert!(view.table().search.is_empty());
    assert_eq!(ids(&view).len(), 5);
  }

  #[test]
  fn sorting_follows_the_selected_column() {
    let mut view = ReportsView::default();
    view.handle_key(KeyCode::Right);
    assert_eq!(view.column(), Column::Kind);
    view.handle_key(KeyCode::Char('s'));
    assert_eq!(view.table().sort(), (Column::Kind, Direction::Asc));
    view.handle_key(KeyCode::Char('s'));
    assert_eq!(view.table().sort(), (Column::Kind, Direction::Desc));
    view.handle_key(KeyCode::Left);
    view.handle_key(KeyCode::Left);
    assert_eq!(view.column(), Column::UploadedBy);
  }
}
