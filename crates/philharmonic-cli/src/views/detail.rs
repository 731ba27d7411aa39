//! Event detail: one event with all of its media.

use crossterm::event::KeyCode;
use philharmonic_core::{
  Result,
  event::EventRecord,
  locale::Locale,
  media::MediaResolver,
  notify::{Notice, NoticeText},
  reveal::Reveal,
  trigger::{GALLERY_MARGIN, VisibilityTrigger},
  viewer::{MediaViewer, NavMode, Slide, ViewerKey},
};

use super::{Action, Scroll, row};
use crate::fetch::Request;

#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
  Idle,
  Loading,
  Found(Box<EventRecord>),
  Missing,
  Failed,
}

#[derive(Debug, Clone)]
pub struct DetailView {
  document_id: Option<String>,
  locale:      Locale,
  state:       Loaded,
  reveal:      Reveal,
  trigger:     VisibilityTrigger,
  scroll:      Scroll,
  viewer:      MediaViewer,
}

impl DetailView {
  pub fn new(locale: Locale) -> Self {
    Self {
      document_id: None,
      locale,
      state: Loaded::Idle,
      reveal: Reveal::detail(0),
      trigger: VisibilityTrigger::new(GALLERY_MARGIN),
      scroll: Scroll::default(),
      viewer: MediaViewer::new(NavMode::Clamped),
    }
  }

  pub fn state(&self) -> &Loaded { &self.state }

  pub fn reveal(&self) -> &Reveal { &self.reveal }

  pub fn scroll(&self) -> &Scroll { &self.scroll }

  pub fn viewer(&self) -> &MediaViewer { &self.viewer }

  pub fn set_height(&mut self, height: u32) { self.scroll.set_height(height); }

  pub fn event(&self) -> Option<&EventRecord> {
    match &self.state {
      Loaded::Found(event) => Some(event.as_ref()),
      _ => None,
    }
  }

  /// Show `document_id`, replacing whatever was shown before.
  pub fn open(&mut self, document_id: String, locale: Locale) -> Vec<Action> {
    self.document_id = Some(document_id);
    self.locale = locale;
    self.reload()
  }

  /// Fetch the current event again, in `locale`.
  pub fn reset(&mut self, locale: Locale) -> Vec<Action> {
    self.locale = locale;
    self.reload()
  }

  fn reload(&mut self) -> Vec<Action> {
    let Some(document_id) = self.document_id.clone() else {
      return Vec::new();
    };
    self.state = Loaded::Loading;
    self.reveal.reset(0);
    self.trigger.unbind();
    self.scroll.reset();
    self.viewer.close();
    vec![Action::Fetch(Request::Event { document_id, locale: self.locale })]
  }

  /// Responses for another document or locale are ignored.
  pub fn complete(
    &mut self,
    document_id: &str,
    locale: Locale,
    result: Result<Option<EventRecord>>,
  ) -> Result<()> {
    if self.document_id.as_deref() != Some(document_id) || locale != self.locale {
      return Ok(());
    }
    match result {
      Ok(Some(event)) => {
        self.reveal.reset(event.images.len());
        self.state = Loaded::Found(Box::new(event));
        self.poll();
        Ok(())
      }
      Ok(None) => {
        self.state = Loaded::Missing;
        Ok(())
      }
      Err(e) => {
        self.state = Loaded::Failed;
        Err(e)
      }
    }
  }

  /// Reveal the next chunk when the row after the last shown image is near.
  pub fn poll(&mut self) {
    if self.reveal.is_complete() {
      self.trigger.unbind();
      return;
    }
    self.trigger.bind(row(self.reveal.visible()));
    if self.trigger.check(self.scroll.viewport(), &self.reveal) {
      self.reveal.reveal_more();
    }
  }

  fn open_viewer(&mut self, media: &MediaResolver) -> Result<()> {
    let Some(event) = self.event() else {
      return Ok(());
    };
    let slides = event
      .images
      .iter()
      .map(|img| Slide::new(media.image(img), img.caption()))
      .collect();
    let index = self.scroll.selected();
    self.viewer.open(slides, index)
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

  /// Whether every key should go to this view, such as while the viewer is up.
  pub fn captures_keys(&self) -> bool { self.viewer.is_open() }

  pub fn handle_key(&mut self, code: KeyCode, media: &MediaResolver) -> Result<Vec<Action>> {
    if self.viewer.is_open() {
      return Ok(self.viewer_key(code));
    }
    match code {
      KeyCode::Char('r') if self.state == Loaded::Failed => return Ok(self.reload()),
      KeyCode::Enter if self.reveal.total() == 0 => {
        return Ok(vec![Action::Notify(Notice::new(
          "detail",
          NoticeText::Label("gallery.noImages"),
        ))]);
      }
      KeyCode::Enter => self.open_viewer(media)?,
      KeyCode::Char('v') => {
        if let Some(video) = self.event().and_then(|e| e.videos.first()) {
          return Ok(vec![Action::Launch(media.resolve(&video.url))]);
        }
      }
      _ => {
        if self.scroll.handle(code, self.reveal.visible()) {
          self.poll();
        }
      }
    }
    Ok(Vec::new())
  }
}
