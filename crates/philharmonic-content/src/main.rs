//! content-server binary.
//!
//! Reads `content.toml` (or the path given with `--config`), overlays
//! `PHILHARMONIC_*` environment variables, loads the event catalog and serves
//! the content API over HTTP.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use philharmonic_content::{AppState, Catalog, ServerConfig};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Philharmonic content server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "content.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("PHILHARMONIC"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let catalog = Catalog::load(&server_cfg.catalog_path).with_context(|| {
    format!("failed to load catalog from {:?}", server_cfg.catalog_path)
  })?;
  tracing::info!(events = catalog.len(), "catalog loaded");

  let app = philharmonic_content::router(AppState::new(catalog));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
