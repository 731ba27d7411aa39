//! The reports table.

use philharmonic_core::{
  query::Direction,
  report::{Choice, Column},
};
use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  widgets::{Cell, Row, Table, TableState},
};

use super::{cursor_style, pane};
use crate::app::App;

fn choice<T: ToString>(c: &Choice<T>) -> String {
  match c {
    Choice::All => "all".into(),
    Choice::Only(v) => v.to_string(),
  }
}

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let view = &app.reports;
  let table = view.table();
  let (sorted, direction) = table.sort();

  let header = Row::new(Column::ALL.iter().map(|&column| {
    let arrow = match (column == sorted, direction) {
      (false, _) => "",
      (true, Direction::Asc) => " ▲",
      (true, Direction::Desc) => " ▼",
    };
    let mut style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    if column == view.column() {
      style = style.add_modifier(Modifier::UNDERLINED);
    }
    Cell::from(format!("{}{arrow}", column.label())).style(style)
  }));

  let rows: Vec<Row> = table
    .rows()
    .into_iter()
    .map(|r| {
      Row::new(vec![
        r.year.to_string(),
        r.kind.clone(),
        r.file.clone(),
        r.size.clone(),
        r.updated.format("%Y-%m-%d").to_string(),
        r.uploaded_by.clone(),
      ])
    })
    .collect();

  let search = if view.is_searching() {
    format!("/{}_", table.search)
  } else if table.search.is_empty() {
    String::new()
  } else {
    format!("/{}", table.search)
  };
  let title = format!(
    " {} · {} · {} {search} ",
    app.translator.t("nav.reports"),
    choice(&table.year),
    choice(&table.kind),
  );

  let widths = [
    Constraint::Length(6),
    Constraint::Length(14),
    Constraint::Min(20),
    Constraint::Length(9),
    Constraint::Length(14),
    Constraint::Length(20),
  ];
  let selected = (!rows.is_empty()).then_some(view.scroll().selected());
  let mut state = TableState::default()
    .with_offset(view.scroll().offset())
    .with_selected(selected);
  f.render_stateful_widget(
    Table::new(rows, widths)
      .header(header)
      .block(pane(title))
      .row_highlight_style(cursor_style()),
    area,
    &mut state,
  );
}
