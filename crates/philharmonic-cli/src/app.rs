//! Application state and event dispatcher.
//!
//! The app owns one instance of every view and carries out the [`Action`]s
//! they return. Responses arrive as [`Msg`]s from the request tasks and are
//! routed back to the view that asked.

use std::{collections::HashSet, path::PathBuf, sync::Arc};

use chrono::{DateTime, Datelike, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use philharmonic_core::{
  locale::{Locale, Translator},
  media::MediaResolver,
  notify::{Notifier, Toasts},
};

use crate::{
  fetch::{Dispatch, Feed, Msg, YearsFor},
  prefs::Prefs,
  views::{
    Action, detail::DetailView, events::EventsView, gallery::GalleryView, home::HomeView,
    past::PastView, reports::ReportsView,
  },
};

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
  Home,
  Events,
  Gallery,
  Past,
  Reports,
  /// One event, reached from any list.
  Detail,
}

impl Screen {
  /// The screens listed in the header, in tab order.
  pub const TABS: [Screen; 5] =
    [Screen::Home, Screen::Events, Screen::Gallery, Screen::Past, Screen::Reports];

  pub fn label(self) -> &'static str {
    match self {
      Self::Home => "nav.home",
      Self::Events => "nav.events",
      Self::Gallery => "nav.gallery",
      Self::Past => "nav.past",
      Self::Reports => "nav.reports",
      Self::Detail => "nav.event",
    }
  }

  fn step(self, forward: bool) -> Self {
    let at = Self::TABS.iter().position(|s| *s == self).unwrap_or(0);
    let len = Self::TABS.len();
    let next = if forward { (at + 1) % len } else { (at + len - 1) % len };
    Self::TABS[next]
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  /// Where `Esc` leaves the detail screen to.
  pub back: Screen,

  pub translator: Translator,
  pub media:      MediaResolver,
  pub toasts:     Arc<Toasts>,

  pub home:    HomeView,
  pub events:  EventsView,
  pub gallery: GalleryView,
  pub past:    PastView,
  pub detail:  DetailView,
  pub reports: ReportsView,

  /// Set when a view failed to handle a key; replaces the body until reloaded.
  pub failure: Option<String>,

  now:        DateTime<Utc>,
  height:     u32,
  started:    HashSet<Screen>,
  dispatch:   Dispatch,
  state_path: Option<PathBuf>,
}

impl App {
  pub fn new(
    now: DateTime<Utc>,
    locale: Locale,
    media: MediaResolver,
    toasts: Arc<Toasts>,
    dispatch: Dispatch,
  ) -> philharmonic_core::Result<Self> {
    Ok(Self {
      screen: Screen::Home,
      back: Screen::Home,
      translator: Translator::builtin(locale),
      media,
      toasts,
      home: HomeView::new(now, locale),
      events: EventsView::new(now, locale),
      gallery: GalleryView::new(now.year(), locale)?,
      past: PastView::new(now, locale),
      detail: DetailView::new(locale),
      reports: ReportsView::default(),
      failure: None,
      now,
      height: 0,
      started: HashSet::new(),
      dispatch,
      state_path: None,
    })
  }

  /// Save the locale to `path` whenever it changes.
  pub fn with_state_path(mut self, path: PathBuf) -> Self {
    self.state_path = Some(path);
    self
  }

  pub fn locale(&self) -> Locale { self.translator.locale() }

  /// Show the home screen and request its teasers.
  pub fn start(&mut self) { self.visit(Screen::Home); }

  /// Switch to `screen`, starting its view on the first visit.
  fn visit(&mut self, screen: Screen) {
    self.screen = screen;
    if !self.started.insert(screen) {
      return;
    }
    let actions = match screen {
      Screen::Home => self.home.start(),
      Screen::Events => self.events.start(),
      Screen::Gallery => self.gallery.start(),
      Screen::Past => self.past.start(),
      Screen::Reports | Screen::Detail => Vec::new(),
    };
    self.run(actions);
  }

  /// Rows available to the list of the current screen.
  pub fn set_height(&mut self, height: u32) {
    self.height = height;
    self.events.set_height(height);
    self.gallery.set_height(height);
    self.past.set_height(height);
    self.detail.set_height(height);
    self.reports.set_height(height);
  }

  fn run(&mut self, actions: Vec<Action>) {
    for action in actions {
      match action {
        Action::Fetch(request) => (self.dispatch)(request),
        Action::ShowEvent(document_id) => {
          if self.screen != Screen::Detail {
            self.back = self.screen;
          }
          self.screen = Screen::Detail;
          let locale = self.locale();
          let more = self.detail.open(document_id, locale);
          self.run(more);
        }
        Action::Launch(url) => {
          if let Err(e) = open::that_detached(&url) {
            tracing::warn!(%url, error = %e, "failed to launch browser");
          }
        }
        Action::Notify(notice) => self.toasts.notify(notice),
      }
    }
  }

  // ── Locale ────────────────────────────────────────────────────────────────

  /// Move to the next locale and start every visited view over in it.
  ///
  /// Views never visited have nothing in flight and are rebuilt instead.
  fn cycle_locale(&mut self) -> philharmonic_core::Result<()> {
    let locale = self.locale().next();
    self.translator.set_locale(locale);
    tracing::info!(%locale, "locale changed");
    if let Some(path) = &self.state_path {
      Prefs { locale: Some(locale) }.save(path);
    }

    let now = self.now;
    let mut actions = Vec::new();
    if self.started.contains(&Screen::Home) {
      actions.extend(self.home.reset(now, locale));
    } else {
      self.home = HomeView::new(now, locale);
    }
    if self.started.contains(&Screen::Events) {
      actions.extend(self.events.reset(locale));
    } else {
      self.events = EventsView::new(now, locale);
    }
    if self.started.contains(&Screen::Gallery) {
      actions.extend(self.gallery.reset(locale)?);
    } else {
      self.gallery = GalleryView::new(now.year(), locale)?;
    }
    if self.started.contains(&Screen::Past) {
      actions.extend(self.past.reset(now, locale));
    } else {
      self.past = PastView::new(now, locale);
    }
    actions.extend(self.detail.reset(locale));
    self.set_height(self.height);
    self.run(actions);
    Ok(())
  }

  // ── Failure boundary ──────────────────────────────────────────────────────

  fn fail(&mut self, error: &philharmonic_core::Error) {
    tracing::error!(screen = ?self.screen, error = %error, "view failed");
    self.failure = Some(error.to_string());
  }

  /// Start the current screen over from scratch.
  fn reload(&mut self) {
    self.failure = None;
    let locale = self.locale();
    let now = self.now;
    let actions = match self.screen {
      Screen::Home => self.home.reset(now, locale),
      Screen::Events => self.events.reset(locale),
      Screen::Gallery => match self.gallery.reset(locale) {
        Ok(actions) => actions,
        Err(e) => return self.fail(&e),
      },
      Screen::Past => self.past.reset(now, locale),
      Screen::Detail => self.detail.reset(locale),
      Screen::Reports => {
        self.reports = ReportsView::default();
        self.reports.set_height(self.height);
        Vec::new()
      }
    };
    self.run(actions);
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Whether the current view wants every key, globals included.
  fn captures_keys(&self) -> bool {
    match self.screen {
      Screen::Gallery => self.gallery.viewer().is_open(),
      Screen::Detail => self.detail.captures_keys(),
      Screen::Reports => self.reports.captures_keys(),
      _ => false,
    }
  }

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    if self.failure.is_some() {
      match key.code {
        KeyCode::Char('q') => return Ok(false),
        KeyCode::Char('r') => self.reload(),
        _ => {}
      }
      return Ok(true);
    }

    if !self.captures_keys() {
      match key.code {
        KeyCode::Char('q') => return Ok(false),
        KeyCode::Char('L') => {
          if let Err(e) = self.cycle_locale() {
            self.fail(&e);
          }
          return Ok(true);
        }
        KeyCode::Tab | KeyCode::BackTab => {
          let from = if self.screen == Screen::Detail { self.back } else { self.screen };
          self.visit(from.step(key.code == KeyCode::Tab));
          return Ok(true);
        }
        KeyCode::Esc if self.screen == Screen::Detail => {
          self.screen = self.back;
          return Ok(true);
        }
        _ => {}
      }
    }

    let code = key.code;
    let result = match self.screen {
      Screen::Home => Ok(self.home.handle_key(code)),
      Screen::Events => self.events.handle_key(code),
      Screen::Gallery => self.gallery.handle_key(code, &self.media),
      Screen::Past => Ok(self.past.handle_key(code, std::time::Instant::now())),
      Screen::Detail => self.detail.handle_key(code, &self.media),
      Screen::Reports => {
        self.reports.handle_key(code);
        Ok(Vec::new())
      }
    };
    match result {
      Ok(actions) => self.run(actions),
      Err(e) => self.fail(&e),
    }
    Ok(true)
  }

  // ── Responses ─────────────────────────────────────────────────────────────

  /// Apply a finished request. Failures were already reported by the source.
  pub fn handle_msg(&mut self, msg: Msg) {
    let result = match msg {
      Msg::Page { feed, ticket, result } => match feed {
        Feed::HomeUpcoming | Feed::HomePast => {
          self.home.complete(feed, ticket, result).map(|_| Vec::new())
        }
        Feed::Gallery => self.gallery.complete(ticket, result),
        Feed::Past => self.past.complete(ticket, result),
      },
      Msg::Group { ticket, result } => self.events.complete(ticket, result).map(|_| Vec::new()),
      Msg::Years { view: YearsFor::Events, locale, result } => {
        self.events.complete_years(locale, result).map(|()| Vec::new())
      }
      Msg::Years { view: YearsFor::Gallery, locale, result } => {
        self.gallery.complete_years(locale, result).map(|()| Vec::new())
      }
      Msg::Months { year, locale, result } => {
        self.gallery.complete_months(year, locale, result).map(|()| Vec::new())
      }
      Msg::Event { document_id, locale, result } => {
        self.detail.complete(&document_id, locale, result).map(|()| Vec::new())
      }
    };
    match result {
      Ok(actions) => self.run(actions),
      Err(e) => tracing::debug!(error = %e, "response not applied"),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use chrono::TimeZone;
  use philharmonic_core::query::Page;

  use super::*;
  use crate::{fetch::Request, views::tests::event};

  type Log = Rc<RefCell<Vec<Request>>>;

  fn app() -> (App, Log) {
    let log: Log = Rc::default();
    let sink = Rc::clone(&log);
    let dispatch: Dispatch = Box::new(move |r| sink.borrow_mut().push(r));
    let now = Utc.with_ymd_and_hms(2025, 10, 15, 9, 0, 0).unwrap();
    let media = MediaResolver::new("http://cms.local");
    let mut app = App::new(now, Locale::En, media, Arc::new(Toasts::new()), dispatch).unwrap();
    app.set_height(20);
    (app, log)
  }

  fn press(app: &mut App, code: KeyCode) -> bool {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
  }

  fn drain(log: &Log) -> Vec<Request> { log.borrow_mut().drain(..).collect() }

  #[test]
  fn screens_start_once_on_first_visit() {
    let (mut app, log) = app();
    app.start();
    assert_eq!(drain(&log).len(), 2);

    press(&mut app, KeyCode::Tab);
    assert_eq!(app.screen, Screen::Events);
    assert_eq!(drain(&log), vec![Request::Years { view: YearsFor::Events, locale: Locale::En }]);

    press(&mut app, KeyCode::BackTab);
    press(&mut app, KeyCode::Tab);
    assert!(drain(&log).is_empty());
  }

  #[test]
  fn locale_change_restarts_visited_views_and_drops_old_responses() {
    let (mut app, log) = app();
    let path = std::env::temp_dir()
      .join(format!("philharmonic-app-{}", std::process::id()))
      .join("state.toml");
    app = app.with_state_path(path.clone());
    app.start();
    let old = drain(&log);

    press(&mut app, KeyCode::Char('L'));
    assert_eq!(app.locale(), Locale::Sq);
    assert_eq!(Prefs::load(&path).locale, Some(Locale::Sq));
    let fresh = drain(&log);
    assert_eq!(fresh.len(), 2);
    assert!(fresh.iter().all(|r| match r {
      Request::Page { ticket, .. } => ticket.request().query.locale == Locale::Sq,
      _ => false,
    }));

    let Request::Page { feed, ticket } = old[0].clone() else { panic!("{old:?}") };
    let stale = Page { items: vec![event(1, "old")], page_number: 1, page_count: 1, total: 1 };
    app.handle_msg(Msg::Page { feed, ticket, result: Ok(stale) });
    assert!(app.home.upcoming().items().is_empty());

    // Views never visited pick up the new locale when first shown.
    press(&mut app, KeyCode::Tab);
    assert_eq!(drain(&log), vec![Request::Years { view: YearsFor::Events, locale: Locale::Sq }]);
    std::fs::remove_dir_all(path.parent().unwrap()).ok();
  }

  #[test]
  fn opening_an_event_and_going_back() {
    let (mut app, log) = app();
    app.start();
    let Request::Page { feed, ticket } = drain(&log)[0].clone() else { panic!() };
    let teaser = Page { items: vec![event(3, "gala")], page_number: 1, page_count: 1, total: 1 };
    app.handle_msg(Msg::Page { feed, ticket, result: Ok(teaser) });

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.screen, Screen::Detail);
    assert_eq!(
      drain(&log),
      vec![Request::Event { document_id: "gala".into(), locale: Locale::En }]
    );
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.screen, Screen::Home);
  }

  #[test]
  fn a_failing_view_is_replaced_until_reloaded() {
    let (mut app, log) = app();
    app.start();
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Tab);
    assert_eq!(app.screen, Screen::Gallery);
    drain(&log);

    // A month the calendar cannot hold makes the gallery query invalid.
    app.handle_msg(Msg::Months { year: 2025, locale: Locale::En, result: Ok(vec![13]) });
    press(&mut app, KeyCode::Char('m'));
    assert!(app.failure.is_some());
    assert!(press(&mut app, KeyCode::Tab));
    assert_eq!(app.screen, Screen::Gallery);

    press(&mut app, KeyCode::Char('r'));
    assert!(app.failure.is_none());
    assert_eq!(app.gallery.month(), None);
    assert!(drain(&log).iter().any(|r| matches!(r, Request::Page { feed: Feed::Gallery, .. })));
  }

  #[test]
  fn quitting_respects_captured_input() {
    let (mut app, _log) = app();
    app.start();
    for _ in 0..4 {
      press(&mut app, KeyCode::Tab);
    }
    assert_eq!(app.screen, Screen::Reports);
    press(&mut app, KeyCode::Char('/'));
    assert!(press(&mut app, KeyCode::Char('q')));
    assert_eq!(app.reports.table().search, "q");

    press(&mut app, KeyCode::Esc);
    assert!(!press(&mut app, KeyCode::Char('q')));

    let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert!(!app.handle_key(ctrl_c).unwrap());
  }
}
