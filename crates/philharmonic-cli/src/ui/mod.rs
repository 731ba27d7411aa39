//! TUI rendering: header, one body per screen, status bar.

mod detail;
mod events;
mod feeds;
mod gallery;
mod reports;

use std::time::Instant;

use chrono::Local;
use philharmonic_core::{
  event::{EventRecord, ImageRef},
  locale::Translator,
  viewer::MediaViewer,
};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Flex, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::{
  app::{App, Screen},
  views::Scroll,
};

/// Rows left for a screen's list on a terminal `rows` high.
pub fn list_height(rows: u16) -> u32 {
  // Header, status bar and the body's top and bottom border.
  u32::from(rows.saturating_sub(4))
}

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  if app.failure.is_some() {
    draw_failure(f, rows[1], app);
  } else {
    draw_body(f, rows[1], app);
  }
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let current = if app.screen == Screen::Detail { app.back } else { app.screen };
  let mut spans = vec![Span::styled(
    " philharmonic ",
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
  )];
  for screen in Screen::TABS {
    let style = if screen == current {
      Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
      Style::default().fg(Color::Gray)
    };
    spans.push(Span::raw(" "));
    spans.push(Span::styled(format!(" {} ", app.translator.t(screen.label())), style));
  }
  if app.screen == Screen::Detail {
    spans.push(Span::styled(
      format!("  › {}", app.translator.t(Screen::Detail.label())),
      Style::default().fg(Color::Yellow),
    ));
  }

  let right = Span::styled(
    format!("[{}]  {} ", app.locale(), Local::now().format("%Y-%m-%d")),
    Style::default().fg(Color::Gray),
  );
  let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
  let pad = usize::from(area.width).saturating_sub(used + right.content.chars().count());
  spans.push(Span::raw(" ".repeat(pad)));
  spans.push(right);

  f.render_widget(
    Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray)),
    area,
  );
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  match app.screen {
    Screen::Home => feeds::draw_home(f, area, app),
    Screen::Events => events::draw(f, area, app),
    Screen::Gallery => gallery::draw(f, area, app),
    Screen::Past => feeds::draw_past(f, area, app),
    Screen::Reports => reports::draw(f, area, app),
    Screen::Detail => detail::draw(f, area, app),
  }
}

fn draw_failure(f: &mut Frame, area: Rect, app: &App) {
  let block = pane(String::from(" ! ")).border_style(Style::default().fg(Color::Red));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let mut lines = vec![Line::from(Span::styled(
    app.translator.t("errors.fatal"),
    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
  ))];
  if let Some(detail) = &app.failure {
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(detail.clone(), Style::default().fg(Color::DarkGray))));
  }
  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let viewer_open = app.gallery.viewer().is_open() || app.detail.viewer().is_open();
  let (mode_label, hints) = match app.screen {
    _ if app.failure.is_some() => ("ERROR", "r reload  q quit"),
    Screen::Reports if app.reports.is_searching() => {
      ("SEARCH", "Type to filter  Enter keep  Esc clear")
    }
    Screen::Gallery | Screen::Detail if viewer_open => {
      ("VIEWER", "←→/hl navigate  o open in browser  Esc close")
    }
    Screen::Home => ("HOME", "←→ column  ↑↓ move  Enter open  Tab next  L language  q quit"),
    Screen::Events => {
      ("EVENTS", "↑↓ move  Enter open/close  m load more  y year  Tab next  L language")
    }
    Screen::Gallery => ("GALLERY", "↑↓ move  Enter expand/view  y year  m month  Tab next"),
    Screen::Past => ("PAST", "↑↓/PgDn/End move  Enter open  Tab next  L language  q quit"),
    Screen::Reports => ("REPORTS", "/ search  y year  t type  ←→ column  s sort  Tab next"),
    Screen::Detail => ("EVENT", "↑↓ move  Enter view image  v video  Esc back"),
  };

  let notice = app
    .toasts
    .active()
    .first()
    .map(|n| n.render(&app.translator));
  let message = match &notice {
    Some(text) => Span::styled(format!("  {text}"), Style::default().fg(Color::Yellow)),
    None => Span::styled(format!("  {hints}"), Style::default().fg(Color::DarkGray)),
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
  );
  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, message])).style(Style::default().bg(Color::Black)),
    area,
  );
}

// ─── Shared pieces ────────────────────────────────────────────────────────────

fn pane(title: String) -> Block<'static> {
  Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray))
}

fn cursor_style() -> Style {
  Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD)
}

fn dim(text: impl Into<String>) -> Span<'static> {
  Span::styled(text.into(), Style::default().fg(Color::DarkGray))
}

/// Date, title and location of one event.
fn event_line(event: &EventRecord, t: &Translator) -> Line<'static> {
  let location = event
    .location
    .clone()
    .filter(|l| !l.trim().is_empty())
    .unwrap_or_else(|| t.t("events.unknownLocation"));
  Line::from(vec![
    Span::styled(
      event.date.with_timezone(&Local).format("%Y-%m-%d %H:%M  ").to_string(),
      Style::default().fg(Color::Cyan),
    ),
    Span::raw(event.title.clone()),
    dim(format!("  {location}")),
  ])
}

/// Caption, or the file name when there is none.
fn image_label(image: &ImageRef) -> String {
  let caption = image.caption();
  if !caption.is_empty() {
    return caption.to_string();
  }
  let url = image.preferred_url();
  url.rsplit('/').next().unwrap_or(url).to_string()
}

/// A scrolled list inside a titled pane, with the cursor row highlighted.
fn draw_list(f: &mut Frame, area: Rect, title: String, items: Vec<ListItem>, scroll: &Scroll) {
  let mut state = ListState::default()
    .with_offset(scroll.offset())
    .with_selected((!items.is_empty()).then_some(scroll.selected()));
  f.render_stateful_widget(
    List::new(items).block(pane(title)).highlight_style(cursor_style()),
    area,
    &mut state,
  );
}

fn placeholder(f: &mut Frame, area: Rect, title: String, text: String) {
  let block = pane(title);
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(text).style(Style::default().fg(Color::DarkGray)), inner);
}

/// Centered overlay for an open media viewer.
fn draw_viewer(f: &mut Frame, area: Rect, viewer: &MediaViewer, t: &Translator) {
  let [column] = Layout::horizontal([Constraint::Percentage(80)]).flex(Flex::Center).areas(area);
  let [popup] = Layout::vertical([Constraint::Length(8)]).flex(Flex::Center).areas(column);

  let (n, total) = viewer.position().unwrap_or((0, 0));
  let block = Block::default()
    .title(format!(" {n} / {total} "))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));

  let mut lines = Vec::new();
  if let Some(slide) = viewer.current() {
    let caption = if slide.caption.is_empty() { "—".to_string() } else { slide.caption.clone() };
    lines.push(Line::from(Span::styled(caption, Style::default().add_modifier(Modifier::BOLD))));
    lines.push(Line::from(dim(slide.url.clone())));
  }
  if viewer.is_settling(Instant::now()) {
    lines.push(Line::from(Span::styled(
      t.t("common.loading"),
      Style::default().fg(Color::Yellow),
    )));
  }

  f.render_widget(Clear, popup);
  f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), popup);
}
