//! `artisan`: guild roster mirror.
//!
//! # Usage
//!
//! ```
//! artisan serve                 # JSON API on host:port
//! artisan sync                  # one full roster sync, report to stdout
//! artisan bootstrap             # fill the profession and recipe catalog
//! artisan --config guild.toml sync
//! ```

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use artisan_api::ApiState;
use artisan_blizzard::BlizzardClient;
use artisan_store_sqlite::SqliteStore;
use artisan_sync::SyncEngine;

use crate::settings::AppConfig;

type Engine = SyncEngine<BlizzardClient, SqliteStore>;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "artisan", version, about = "Guild roster and profession mirror")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API.
  Serve,
  /// Run one full roster sync and print its report.
  Sync,
  /// Populate the profession and recipe catalog if empty.
  Bootstrap,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

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
  let cfg = AppConfig::load(&cli.config)?;

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  let store = Arc::new(store);

  let client = BlizzardClient::new(cfg.blizzard_config())
    .context("failed to build game-data client")?;
  let engine = Arc::new(SyncEngine::new(Arc::new(client), store.clone(), cfg.sync_config()));

  match cli.command {
    Command::Serve => serve(&cfg, store, engine).await,
    Command::Sync => sync(&engine).await,
    Command::Bootstrap => bootstrap(&engine).await,
  }
}

async fn serve(cfg: &AppConfig, store: Arc<SqliteStore>, engine: Arc<Engine>) -> anyhow::Result<()> {
  let app = Router::new()
    .nest("/api", artisan_api::api_router(ApiState::new(store, engine)))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", cfg.host, cfg.port);
  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

async fn sync(engine: &Engine) -> anyhow::Result<()> {
  let report = engine
    .sync_roster_with_progress(|settled, total| info!(settled, total, "sync progress"))
    .await
    .context("roster sync failed")?;

  println!("{}", serde_json::to_string_pretty(&report)?);
  Ok(())
}

async fn bootstrap(engine: &Engine) -> anyhow::Result<()> {
  let report = engine.bootstrap_catalog().await.context("catalog bootstrap failed")?;
  info!(
    professions = report.professions_added,
    recipes = report.recipes_added,
    "catalog bootstrap finished"
  );
  println!("{}", serde_json::to_string_pretty(&report)?);
  Ok(())
}
