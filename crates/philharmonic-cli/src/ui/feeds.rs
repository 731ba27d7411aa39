//! Home teasers and the past events list.

use philharmonic_core::{CollectionLoader, LoaderPhase, locale::Translator};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  widgets::{List, ListItem, ListState},
};

use super::{cursor_style, dim, draw_list, event_line, pane};
use crate::{app::App, views::home::Column};

/// The row shown under a list while its loader is busy or done.
fn tail(loader: &CollectionLoader, t: &Translator) -> Option<ListItem<'static>> {
  match (loader.items().is_empty(), loader.phase()) {
    (_, LoaderPhase::Fetching) => Some(ListItem::new(dim(t.t("common.loading")))),
    (true, LoaderPhase::Exhausted) => Some(ListItem::new(dim(t.t("gallery.noEvents")))),
    _ => None,
  }
}

pub fn draw_home(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
    .split(area);
  let home = &app.home;
  let t = &app.translator;

  let panes = [
    (Column::Upcoming, home.upcoming(), t.t("nav.events")),
    (Column::Past, home.past(), t.t("nav.past")),
  ];
  for ((column, loader, title), rect) in panes.into_iter().zip(cols.iter()) {
    let mut items: Vec<ListItem> =
      loader.items().iter().map(|e| ListItem::new(event_line(e, t))).collect();
    items.extend(tail(loader, t));

    let focused = home.column() == column;
    let mut state = ListState::default()
      .with_selected((focused && !loader.items().is_empty()).then_some(home.selected()));
    f.render_stateful_widget(
      List::new(items).block(pane(format!(" {title} "))).highlight_style(cursor_style()),
      *rect,
      &mut state,
    );
  }
}

pub fn draw_past(f: &mut Frame, area: Rect, app: &App) {
  let past = &app.past;
  let t = &app.translator;
  let loader = past.loader();

  let mut items: Vec<ListItem> =
    loader.items().iter().map(|e| ListItem::new(event_line(e, t))).collect();
  items.extend(tail(loader, t));

  let title = format!(" {} ({}) ", t.t("nav.past"), loader.items().len());
  draw_list(f, area, title, items, past.scroll());
}
