//! Gallery panels and their images.

use philharmonic_core::LoaderPhase;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::ListItem,
};

use super::{dim, draw_list, draw_viewer, image_label};
use crate::{app::App, views::gallery::Row};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let view = &app.gallery;
  let t = &app.translator;
  let events = view.loader().items();

  let mut items: Vec<ListItem> = view
    .rows()
    .into_iter()
    .map(|row| match row {
      Row::Event(i) => {
        let event = &events[i];
        let marker = if view.is_expanded(event.id) { "▾" } else { "▸" };
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{marker} {}  ", event.date.format("%Y-%m-%d")),
            Style::default().fg(Color::Cyan),
          ),
          Span::styled(event.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
          dim(format!("  {} {}", event.images.len(), t.t("gallery.pictures"))),
        ]))
      }
      Row::Image(i, j) => {
        let label = events[i].images.get(j).map(image_label).unwrap_or_default();
        ListItem::new(format!("    ▪ {label}"))
      }
      Row::NoImages(_) => ListItem::new(dim(format!("    {}", t.t("gallery.noImages")))),
      Row::More(i) => {
        let left = view
          .panel(events[i].id)
          .map(|p| p.reveal.total().saturating_sub(p.reveal.visible()))
          .unwrap_or_default();
        ListItem::new(dim(format!("    … +{left}")))
      }
    })
    .collect();
  match (events.is_empty(), view.loader().phase()) {
    (_, LoaderPhase::Fetching) => items.push(ListItem::new(dim(t.t("common.loading")))),
    (true, LoaderPhase::Exhausted) => items.push(ListItem::new(dim(t.t("gallery.noEvents")))),
    _ => {}
  }

  let month = match view.month() {
    Some(m) => t.month(m),
    None => t.t("gallery.allMonths"),
  };
  let title = format!(" {} {} · {month} ", t.t("nav.gallery"), view.year());
  draw_list(f, area, title, items, view.scroll());

  if view.viewer().is_open() {
    draw_viewer(f, area, view.viewer(), t);
  }
}
