//! The month accordion of upcoming events.

use philharmonic_core::LoaderPhase;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Modifier, Style},
  text::{Line, Span},
  widgets::ListItem,
};

use super::{dim, draw_list, event_line};
use crate::{app::App, views::events::Row};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let view = &app.events;
  let t = &app.translator;

  let items: Vec<ListItem> = view
    .rows()
    .into_iter()
    .map(|row| match row {
      Row::Month(m) => {
        let marker = if view.is_expanded(m) { "▾" } else { "▸" };
        ListItem::new(Line::from(Span::styled(
          format!("{marker} {}", t.month(m)),
          Style::default().add_modifier(Modifier::BOLD),
        )))
      }
      Row::Event(m, i) => match view.items(m).get(i) {
        Some(event) => {
          let mut line = event_line(event, t);
          line.spans.insert(0, Span::raw("   "));
          ListItem::new(line)
        }
        None => ListItem::new(""),
      },
      Row::Loading(_) => ListItem::new(dim(format!("   {}", t.t("common.loading")))),
      Row::Empty(_) => ListItem::new(dim(format!("   {}", t.t("events.noEvents")))),
      Row::LoadMore(m) => {
        let label = if view.phase(m) == Some(LoaderPhase::Fetching) {
          t.t("events.loadingMore")
        } else {
          t.t("events.loadMore")
        };
        ListItem::new(dim(format!("   + {label}")))
      }
    })
    .collect();

  let years = match view.years() {
    Some(years) => years.iter().map(i32::to_string).collect::<Vec<_>>().join(" "),
    None => "…".into(),
  };
  let title = format!(" {} {}  [{years}] ", t.t("nav.events"), view.year());
  draw_list(f, area, title, items, view.scroll());
}
