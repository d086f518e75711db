//! recall-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, restores the remote backup once, and serves the memory API
//! over HTTP while backing up on a fixed cadence.

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use recall_engine::{MemoryService, backup::spawn_periodic_backup};
use recall_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Recall caller-memory server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Skip importing the remote backup at startup.
  #[arg(long)]
  no_restore: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  // Open SQLite store.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let model = server_cfg.model_client()?;
  if model.is_none() {
    tracing::warn!("no model configured; conversations will not be summarized");
  }
  let blob = server_cfg.backup.blob_store()?;

  let service = Arc::new(MemoryService::new(
    store,
    model,
    blob,
    server_cfg.memory.clone(),
  ));

  // Restore before serving so the first caller sees their memory.
  if cli.no_restore {
    tracing::info!("startup restore disabled");
  } else {
    match service.sync_from_remote().await {
      Ok(outcome) => tracing::debug!(?outcome, "startup restore finished"),
      Err(e) => tracing::error!(error = %e, "startup restore failed; continuing with local data"),
    }
  }

  let backup_task = spawn_periodic_backup(service.clone(), server_cfg.memory.backup_interval());

  let app = recall_api::api_router(service.clone()).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  backup_task.abort();
  if let Err(e) = service.sync_to_remote().await {
    tracing::warn!(error = %e, "final backup failed");
  }

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}
