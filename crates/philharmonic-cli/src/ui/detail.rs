//! One event: its images on the left, the rest on the right.

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{ListItem, Paragraph, Wrap},
};
use scraper::{ElementRef, Html, Node};

use super::{dim, draw_list, draw_viewer, image_label, pane, placeholder};
use crate::{app::App, views::detail::Loaded};

/// Elements whose edges separate words.
const BLOCKS: &[&str] = &[
  "address", "blockquote", "br", "dd", "div", "dt", "figcaption", "h1", "h2", "h3", "h4", "h5",
  "h6", "hr", "li", "ol", "p", "pre", "td", "th", "tr", "ul",
];

fn collect_text(element: ElementRef<'_>, out: &mut String) {
  for child in element.children() {
    match child.value() {
      Node::Text(text) => out.push_str(text),
      Node::Element(el) if matches!(el.name(), "script" | "style") => {}
      Node::Element(el) => {
        let Some(inner) = ElementRef::wrap(child) else { continue };
        let block = BLOCKS.contains(&el.name());
        if block {
          out.push(' ');
        }
        collect_text(inner, out);
        if block {
          out.push(' ');
        }
      }
      _ => {}
    }
  }
}

/// Rich text with the markup dropped and entities decoded.
fn plain_text(html: &str) -> String {
  let fragment = Html::parse_fragment(html);
  let mut out = String::with_capacity(html.len());
  collect_text(fragment.root_element(), &mut out);
  out.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let view = &app.detail;
  let t = &app.translator;
  let title = format!(" {} ", t.t("nav.event"));

  let event = match view.state() {
    Loaded::Found(_) => view.event(),
    Loaded::Idle | Loaded::Loading => {
      return placeholder(f, area, title, t.t("common.loading"));
    }
    Loaded::Missing => return placeholder(f, area, title, t.t("detail.notFound")),
    Loaded::Failed => {
      return placeholder(f, area, title, format!("{}  (r)", t.t("errors.generic")));
    }
  };
  let Some(event) = event else { return };

  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
    .split(area);

  let reveal = view.reveal();
  let mut items: Vec<ListItem> = event
    .images
    .iter()
    .take(reveal.visible())
    .map(|img| ListItem::new(format!("▪ {}", image_label(img))))
    .collect();
  if reveal.total() == 0 {
    items.push(ListItem::new(dim(t.t("gallery.noImages"))));
  } else if !reveal.is_complete() {
    items.push(ListItem::new(dim(format!("… +{}", reveal.total() - reveal.visible()))));
  }
  let images = format!(" {}/{} {} ", reveal.visible(), reveal.total(), t.t("gallery.pictures"));
  draw_list(f, cols[0], images, items, view.scroll());

  let location = event
    .location
    .clone()
    .unwrap_or_else(|| t.t("events.unknownLocation"));
  let mut lines = vec![
    Line::from(Span::styled(
      event.title.clone(),
      Style::default().add_modifier(Modifier::BOLD),
    )),
    Line::from(Span::styled(
      event.date.with_timezone(&Local).format("%A %Y-%m-%d %H:%M").to_string(),
      Style::default().fg(Color::Cyan),
    )),
    Line::from(dim(location)),
    Line::from(""),
    Line::from(plain_text(&event.description)),
  ];
  if !event.videos.is_empty() {
    lines.push(Line::from(""));
    for video in &event.videos {
      lines.push(Line::from(dim(format!("▶ {}", app.media.resolve(&video.url)))));
    }
  }
  f.render_widget(
    Paragraph::new(lines)
      .block(pane(format!(" {} ", event.title)))
      .wrap(Wrap { trim: true }),
    cols[1],
  );

  if view.viewer().is_open() {
    draw_viewer(f, area, view.viewer(), t);
  }
}
