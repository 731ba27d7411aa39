//! `philharmonic`: terminal browser for the orchestra's events and media.
//!
//! # Usage
//!
//! ```
//! philharmonic --url http://localhost:1337 --locale mk
//! philharmonic --config ~/.config/philharmonic/config.toml
//! ```

mod app;
mod fetch;
mod prefs;
mod ui;
mod views;

use std::{io, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use app::App;
use chrono::Utc;
use clap::Parser;
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use philharmonic_client::{ClientConfig, ContentClient};
use philharmonic_core::{
  locale::Locale, media::MediaResolver, notify::Toasts, source::NotifyingSource,
};
use prefs::Prefs;
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_URL: &str = "http://localhost:1337";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "philharmonic", about = "Terminal browser for Philharmonic events")]
struct Args {
  /// Path to a TOML config file (url, media_url, locale, log_file).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the content API (default: http://localhost:1337).
  #[arg(long, env = "PHILHARMONIC_URL")]
  url: Option<String>,

  /// Language to start in: en, sq or mk.
  #[arg(long)]
  locale: Option<Locale>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:       String,
  /// Base for relative upload URLs; the API URL when empty.
  #[serde(default)]
  media_url: String,
  #[serde(default)]
  locale:    Option<Locale>,
  #[serde(default)]
  log_file:  Option<PathBuf>,
}

// ─── Logging ──────────────────────────────────────────────────────────────────

/// Log to a file, since stdout belongs to the terminal UI. The guard must
/// outlive the program for buffered lines to be flushed.
fn init_logging(log_file: Option<&PathBuf>) -> Result<WorkerGuard> {
  let appender = match log_file {
    Some(path) => {
      let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).map(PathBuf::from);
      let dir = dir.unwrap_or_else(|| PathBuf::from("."));
      let name = path.file_name().context("log_file has no file name")?;
      std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
      tracing_appender::rolling::never(dir, name)
    }
    None => {
      let dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("philharmonic")
        .join("logs");
      std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
      tracing_appender::rolling::daily(dir, "philharmonic.log")
    }
  };
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with(
      fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true),
    )
    .init();
  Ok(guard)
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let _guard = init_logging(file_cfg.log_file.as_ref())?;

  // CLI flags override config file, which overrides defaults.
  let base_url = args
    .url
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string());
  let media_url = if file_cfg.media_url.is_empty() {
    base_url.clone()
  } else {
    file_cfg.media_url.clone()
  };

  // The last language picked in the browser wins over the config file.
  let state_path = prefs::default_path();
  let locale = args
    .locale
    .or(Prefs::load(&state_path).locale)
    .or(file_cfg.locale)
    .unwrap_or_default();
  tracing::info!(%base_url, %locale, "starting");

  let client = ContentClient::new(ClientConfig::new(base_url)).context("building HTTP client")?;
  let toasts = Arc::new(Toasts::new());
  let source = Arc::new(NotifyingSource::new(client, Arc::clone(&toasts)));
  let (tx, rx) = mpsc::unbounded_channel();

  let mut app = App::new(
    Utc::now(),
    locale,
    MediaResolver::new(media_url),
    toasts,
    fetch::spawner(source, tx),
  )
  .context("building views")?
  .with_state_path(state_path);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  app.start();
  let run_result = run_event_loop(&mut terminal, &mut app, rx).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  if let Err(e) = &run_result {
    tracing::error!(error = %e, "event loop failed");
  }
  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
  mut rx: UnboundedReceiver<fetch::Msg>,
) -> Result<()> {
  loop {
    while let Ok(msg) = rx.try_recv() {
      app.handle_msg(msg);
    }

    let size = terminal.size().context("reading terminal size")?;
    app.set_height(ui::list_height(size.height));
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    match maybe_event {
      Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
        if !app.handle_key(key)? {
          break;
        }
      }
      // Resizes are picked up by the next frame.
      _ => {}
    }
  }

  Ok(())
}
