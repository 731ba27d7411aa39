//! Gallery: events of a year (or one month of it) with their pictures.
//!
//! The event list grows through a visibility trigger on the row after the
//! last event. Each event is a panel that expands on its own; an expanded
//! panel reveals its images in chunks through a second trigger bound to its
//! "more" row. Images open in a circular viewer.

use std::collections::BTreeMap;

use crossterm::event::KeyCode;
use philharmonic_core::{
  CollectionLoader, Completion, PageTicket, Result,
  accordion::{ExpandPolicy, Expansion},
  event::EventRecord,
  locale::Locale,
  media::MediaResolver,
  notify::{Notice, NoticeText},
  query::Page,
  reveal::Reveal,
  scope::{self, GALLERY_PAGE_SIZE},
  trigger::{GALLERY_MARGIN, VisibilityTrigger},
  viewer::{MediaViewer, NavMode, Slide, ViewerKey},
};

use super::{Action, Scroll, row};
use crate::fetch::{Feed, Request, YearsFor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
  Event(usize),
  Image(usize, usize),
  NoImages(usize),
  /// Images of the event still waiting to be revealed.
  More(usize),
}

#[derive(Debug, Clone)]
pub struct Panel {
  pub reveal: Reveal,
  trigger:    VisibilityTrigger,
}

#[derive(Debug, Clone)]
pub struct GalleryView {
  locale:   Locale,
  year:     i32,
  month:    Option<u32>,
  years:    Vec<i32>,
  months:   Vec<u32>,
  loader:   CollectionLoader,
  expanded: Expansion<u64>,
  panels:   BTreeMap<u64, Panel>,
  scroll:   Scroll,
  trigger:  VisibilityTrigger,
  viewer:   MediaViewer,
}

impl GalleryView {
  pub fn new(year: i32, locale: Locale) -> Result<Self> {
    Ok(Self {
      locale,
      year,
      month: None,
      years: Vec::new(),
      months: Vec::new(),
      loader: CollectionLoader::new(scope::gallery(year, None, locale)?, GALLERY_PAGE_SIZE),
      expanded: Expansion::new(ExpandPolicy::Independent),
      panels: BTreeMap::new(),
      scroll: Scroll::default(),
      trigger: VisibilityTrigger::new(GALLERY_MARGIN),
      viewer: MediaViewer::new(NavMode::Circular),
    })
  }

  pub fn year(&self) -> i32 { self.year }

  pub fn month(&self) -> Option<u32> { self.month }

  pub fn years(&self) -> &[i32] { &self.years }

  pub fn months(&self) -> &[u32] { &self.months }

  pub fn loader(&self) -> &CollectionLoader { &self.loader }

  pub fn scroll(&self) -> &Scroll { &self.scroll }

  pub fn viewer(&self) -> &MediaViewer { &self.viewer }

  pub fn panel(&self, event_id: u64) -> Option<&Panel> { self.panels.get(&event_id) }

  pub fn is_expanded(&self, event_id: u64) -> bool { self.expanded.is_expanded(&event_id) }

  pub fn set_height(&mut self, height: u32) { self.scroll.set_height(height); }

  pub fn start(&mut self) -> Vec<Action> {
    let mut actions = vec![
      Action::Fetch(Request::Years { view: YearsFor::Gallery, locale: self.locale }),
      Action::Fetch(Request::Months { year: self.year, locale: self.locale }),
    ];
    actions.extend(self.fetch());
    actions
  }

  pub fn reset(&mut self, locale: Locale) -> Result<Vec<Action>> {
    self.locale = locale;
    self.years.clear();
    self.months.clear();
    self.month = None;
    self.reload()?;
    Ok(self.start())
  }

  /// Start the event list over for the current year and month.
  fn reload(&mut self) -> Result<()> {
    let query = scope::gallery(self.year, self.month, self.locale)?;
    self.loader.reset(query);
    self.expanded.collapse_all();
    self.panels.clear();
    self.viewer.close();
    self.scroll.reset();
    Ok(())
  }

  fn fetch(&mut self) -> Vec<Action> {
    self
      .loader
      .begin_next()
      .map(|ticket| Action::Fetch(Request::Page { feed: Feed::Gallery, ticket }))
      .into_iter()
      .collect()
  }

  pub fn complete_years(&mut self, locale: Locale, result: Result<Vec<i32>>) -> Result<()> {
    if locale != self.locale {
      return Ok(());
    }
    let mut years = result?;
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    self.years = years;
    Ok(())
  }

  pub fn complete_months(
    &mut self,
    year: i32,
    locale: Locale,
    result: Result<Vec<u32>>,
  ) -> Result<()> {
    if (year, locale) != (self.year, self.locale) {
      return Ok(());
    }
    self.months = result?;
    Ok(())
  }

  pub fn complete(
    &mut self,
    ticket: PageTicket,
    result: Result<Page<EventRecord>>,
  ) -> Result<Vec<Action>> {
    match self.loader.complete(ticket, result)? {
      Completion::Appended { .. } => Ok(self.poll()),
      _ => Ok(Vec::new()),
    }
  }

  /// The list as drawn: every event, and below each expanded one its
  /// revealed images.
  pub fn rows(&self) -> Vec<Row> {
    let mut rows = Vec::new();
    for (i, event) in self.loader.items().iter().enumerate() {
      rows.push(Row::Event(i));
      if !self.expanded.is_expanded(&event.id) {
        continue;
      }
      let Some(panel) = self.panels.get(&event.id) else {
        continue;
      };
      if panel.reveal.total() == 0 {
        rows.push(Row::NoImages(i));
        continue;
      }
      rows.extend((0..panel.reveal.visible()).map(|j| Row::Image(i, j)));
      if !panel.reveal.is_complete() {
        rows.push(Row::More(i));
      }
    }
    rows
  }

  /// Re-bind every trigger to the current rows and act on those in range.
  /// Rows revealed above the cursor push it down, so it stays on its entry.
  pub fn poll(&mut self) -> Vec<Action> {
    let viewport = self.scroll.viewport();
    let mut inserted = 0;
    for (at, r) in self.rows().into_iter().enumerate() {
      let Row::More(i) = r else { continue };
      let id = self.loader.items()[i].id;
      if let Some(panel) = self.panels.get_mut(&id) {
        panel.trigger.bind(row(at + inserted));
        if panel.trigger.check(viewport, &panel.reveal) {
          let shown = panel.reveal.reveal_more();
          // The "more" row goes away once everything is shown.
          let grown = if panel.reveal.is_complete() {
            panel.trigger.unbind();
            shown.saturating_sub(1)
          } else {
            shown
          };
          if at < self.scroll.selected() {
            self.scroll.shift(grown);
          }
          inserted += grown;
          tracing::debug!(event = id, shown, "revealed more images");
        }
      }
    }

    self.trigger.bind(row(self.rows().len()));
    if self.trigger.check(viewport, &self.loader) { self.fetch() } else { Vec::new() }
  }

  fn toggle_panel(&mut self, index: usize) {
    let event = &self.loader.items()[index];
    let id = event.id;
    let total = event.images.len();
    self.panels.entry(id).or_insert_with(|| Panel {
      reveal:  Reveal::gallery(total),
      trigger: VisibilityTrigger::new(GALLERY_MARGIN),
    });
    self.expanded.toggle(&id);
  }

  fn open_viewer(&mut self, index: usize, image: usize, media: &MediaResolver) -> Result<()> {
    let slides = self.loader.items()[index]
      .images
      .iter()
      .map(|img| Slide::new(media.image(img), img.caption()))
      .collect();
    self.viewer.open(slides, image)
  }

  fn cycle_year(&mut self) -> Result<Vec<Action>> {
    let Some(&first) = self.years.first() else {
      return Ok(Vec::new());
    };
    let next = match self.years.iter().position(|y| *y == self.year) {
      Some(at) => self.years[(at + 1) % self.years.len()],
      None => first,
    };
    self.year = next;
    self.month = None;
    self.months.clear();
    self.reload()?;
    let mut actions =
      vec![Action::Fetch(Request::Months { year: self.year, locale: self.locale })];
    actions.extend(self.fetch());
    Ok(actions)
  }

  fn cycle_month(&mut self) -> Result<Vec<Action>> {
    self.month = match self.month {
      None => self.months.first().copied(),
      Some(m) => self.months.iter().skip_while(|x| **x != m).nth(1).copied(),
    };
    self.reload()?;
    Ok(self.fetch())
  }

  fn viewer_key(&mut self, code: KeyCode) -> Vec<Action> {
    match code {
      KeyCode::Esc | KeyCode::Char('q') => self.viewer.handle_key(ViewerKey::Escape),
      KeyCode::Left | KeyCode::Char('h') => self.viewer.handle_key(ViewerKey::Left),
      KeyCode::Right | KeyCode::Char('l') => self.viewer.handle_key(ViewerKey::Right),
      KeyCode::Char('o') => {
        if let Some(slide) = self.viewer.current() {
          return vec![Action::Launch(slide.url.clone())];
        }
      }
      _ => {}
    }
    Vec::new()
  }

  pub fn handle_key(&mut self, code: KeyCode, media: &MediaResolver) -> Result<Vec<Action>> {
    if self.viewer.is_open() {
      return Ok(self.viewer_key(code));
    }
    match code {
      KeyCode::Char('y') => return self.cycle_year(),
      KeyCode::Char('m') => return self.cycle_month(),
      KeyCode::Enter => {
        let rows = self.rows();
        match rows.get(self.scroll.selected()).copied() {
          Some(Row::Event(i)) => self.toggle_panel(i),
          Some(Row::Image(i, j)) => self.open_viewer(i, j, media)?,
          Some(Row::More(i)) => {
            let id = self.loader.items()[i].id;
            if let Some(panel) = self.panels.get_mut(&id) {
              panel.reveal.reveal_more();
            }
          }
          Some(Row::NoImages(_)) => {
            return Ok(vec![Action::Notify(Notice::new(
              "gallery",
              NoticeText::Label("gallery.noImages"),
            ))]);
          }
          None => {}
        }
        return Ok(self.poll());
      }
      _ => {}
    }
    let len = self.rows().len();
    if self.scroll.handle(code, len) {
      return Ok(self.poll());
    }
    Ok(Vec::new())
  }
}

#[cfg(test)]
mod tests {
  use philharmonic_core::{
    query::{Filter, Relation},
    reveal::GALLERY_INITIAL,
  };

  use super::*;
  use crate::views::tests::{event, page, with_images};

  fn media() -> MediaResolver { MediaResolver::new("http://cms.local") }

  fn page_ticket(actions: &[Action]) -> PageTicket {
    actions
      .iter()
      .find_map(|a| match a {
        Action::Fetch(Request::Page { feed: Feed::Gallery, ticket }) => Some(ticket.clone()),
        _ => None,
      })
      .expect("a gallery page request")
  }

  fn key(view: &mut GalleryView, code: KeyCode) -> Vec<Action> {
    view.handle_key(code, &media()).unwrap()
  }

  #[test]
  fn start_asks_for_options_and_the_first_page() {
    let mut view = GalleryView::new(2025, Locale::Sq).unwrap();
    let actions = view.start();
    assert_eq!(
      actions[..2],
      [
        Action::Fetch(Request::Years { view: YearsFor::Gallery, locale: Locale::Sq }),
        Action::Fetch(Request::Months { year: 2025, locale: Locale::Sq }),
      ]
    );
    let ticket = page_ticket(&actions);
    let query = &ticket.request().query;
    assert!(query.populate.contains(Relation::Images));
    let Some(Filter::And(clauses)) = &query.filter else { panic!("{:?}", query.filter) };
    assert!(clauses.contains(&Filter::locale_eq(Locale::Sq)));
  }

  #[test]
  fn choosing_a_month_restarts_the_list() {
    let mut view = GalleryView::new(2025, Locale::En).unwrap();
    view.set_height(20);
    let first = page_ticket(&view.start());
    view.complete_months(2025, Locale::En, Ok(vec![3, 7])).unwrap();

    let restarted = page_ticket(&key(&mut view, KeyCode::Char('m')));
    assert_eq!(view.month(), Some(3));
    assert_eq!(view.complete(first, Ok(page(vec![event(1, "a")], 1))), Ok(vec![]));
    assert!(view.loader().items().is_empty());

    view.complete(restarted, Ok(page(vec![event(2, "b")], 1))).unwrap();
    assert_eq!(view.loader().items()[0].id, 2);

    key(&mut view, KeyCode::Char('m'));
    assert_eq!(view.month(), Some(7));
    key(&mut view, KeyCode::Char('m'));
    assert_eq!(view.month(), None);
  }

  #[test]
  fn options_for_an_old_locale_or_year_are_ignored() {
    let mut view = GalleryView::new(2025, Locale::En).unwrap();
    view.complete_years(Locale::Mk, Ok(vec![2020])).unwrap();
    view.complete_months(2024, Locale::En, Ok(vec![1])).unwrap();
    assert!(view.years().is_empty());
    assert!(view.months().is_empty());

    view.complete_years(Locale::En, Ok(vec![2023, 2025, 2024])).unwrap();
    assert_eq!(view.years(), &[2025, 2024, 2023]);
    key(&mut view, KeyCode::Char('y'));
    assert_eq!(view.year(), 2024);
  }

  #[test]
  fn panels_reveal_images_in_chunks() {
    let mut view = GalleryView::new(2025, Locale::En).unwrap();
    view.set_height(3);
    let first = page_ticket(&view.start());
    let events = vec![with_images(event(1, "a"), 20), event(2, "b")];
    view.complete(first, Ok(page(events, 1))).unwrap();

    key(&mut view, KeyCode::Enter);
    let rows = view.rows();
    assert_eq!(rows.len(), 1 + GALLERY_INITIAL + 1 + 1);
    assert_eq!(rows[GALLERY_INITIAL + 1], Row::More(0));

    // Scrolling towards the "more" row reveals the next chunk.
    for _ in 0..8 {
      key(&mut view, KeyCode::Down);
    }
    assert_eq!(view.panel(1).unwrap().reveal.visible(), 16);

    // Revealing the rest above the cursor keeps it on the second event.
    key(&mut view, KeyCode::End);
    assert_eq!(view.panel(1).unwrap().reveal.visible(), 20);
    assert_eq!(view.rows()[view.scroll().selected()], Row::Event(1));
  }

  #[test]
  fn events_without_images_say_so() {
    let mut view = GalleryView::new(2025, Locale::En).unwrap();
    view.set_height(5);
    let first = page_ticket(&view.start());
    view.complete(first, Ok(page(vec![event(1, "a")], 1))).unwrap();

    key(&mut view, KeyCode::Enter);
    assert_eq!(view.rows(), vec![Row::Event(0), Row::NoImages(0)]);
    key(&mut view, KeyCode::Down);
    let notice = key(&mut view, KeyCode::Enter);
    assert!(matches!(&notice[..], [Action::Notify(n)] if n.key == "gallery"));
  }

  #[test]
  fn images_open_a_circular_viewer() {
    let mut view = GalleryView::new(2025, Locale::En).unwrap();
    view.set_height(10);
    let first = page_ticket(&view.start());
    view.complete(first, Ok(page(vec![with_images(event(1, "a"), 3)], 1))).unwrap();

    key(&mut view, KeyCode::Enter);
    key(&mut view, KeyCode::Down);
    key(&mut view, KeyCode::Enter);
    assert_eq!(view.viewer().position(), Some((1, 3)));
    key(&mut view, KeyCode::Left);
    assert_eq!(view.viewer().position(), Some((3, 3)));

    let launched = key(&mut view, KeyCode::Char('o'));
    assert_eq!(launched, vec![Action::Launch("http://cms.local/uploads/1-2.jpg".into())]);
    key(&mut view, KeyCode::Esc);
    assert!(!view.viewer().is_open());
  }
}
