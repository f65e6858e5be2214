//! `macrodash` binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! observation store and either serves the JSON API or runs a one-off
//! command against the store.
//!
//! ```text
//! macrodash serve
//! macrodash ingest --series Mortgage30 --file rows.json
//! macrodash query --series NMDB_QuarterlyRate --start 2024-01-01
//! macrodash latest Mortgage30 Treasury10Y
//! ```

mod settings;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use macrodash_api::{AppState, ComponentRegistry};
use macrodash_core::{Engine, observation::IncomingRow, payload::DateRange};
use macrodash_store_sqlite::SqliteStore;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(
  author,
  version,
  about = "Period-aware time-series store and dashboard API"
)]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API (the default).
  Serve,

  /// Upsert a JSON array of rows into one series.
  Ingest {
    #[arg(long)]
    series: String,
    /// File holding `[{"period_start": ..., "value": ...}, ...]`.
    #[arg(long)]
    file:   PathBuf,
  },

  /// Print the chart payload for a series.
  Query {
    #[arg(long)]
    series: String,
    #[arg(long)]
    start:  Option<NaiveDate>,
    #[arg(long)]
    end:    Option<NaiveDate>,
  },

  /// Print the latest value of each named series (all series if none given).
  Latest { names: Vec<String> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so command output on stdout stays parseable.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;
  let engine = open_engine(&cfg).await?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(&cfg, engine).await,
    Command::Ingest { series, file } => ingest(&engine, &series, &file).await,
    Command::Query { series, start, end } => {
      let all = DateRange::all();
      let range =
        DateRange::new(start.unwrap_or(all.start), end.unwrap_or(all.end));
      print_json(&engine.query_range(&series, range).await?)
    }
    Command::Latest { names } => {
      let names = if names.is_empty() {
        engine.registry().iter().map(|s| s.name.clone()).collect()
      } else {
        names
      };
      print_json(&engine.latest_values(&names).await?)
    }
  }
}

async fn open_engine(
  cfg: &ServerConfig,
) -> anyhow::Result<Engine<SqliteStore>> {
  let registry = cfg.registry()?;
  let store_path = cfg.store_path();

  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  tracing::debug!(path = ?store_path, series = registry.len(), "store opened");
  Ok(Engine::new(registry, store))
}

async fn serve(
  cfg: &ServerConfig,
  engine: Engine<SqliteStore>,
) -> anyhow::Result<()> {
  let components = ComponentRegistry::builtin();
  let layout = cfg.layout();
  components
    .validate(&layout)
    .context("invalid [[components]] configuration")?;
  for spec in &layout {
    for name in &spec.series {
      engine
        .registry()
        .require(name)
        .with_context(|| format!("component {:?}", spec.alias))?;
    }
  }

  let state = AppState::new(engine, components, layout);
  let app = macrodash_api::api_router(state).layer(TraceLayer::new_for_http());
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn ingest(
  engine: &Engine<SqliteStore>,
  series_name: &str,
  file: &Path,
) -> anyhow::Result<()> {
  let series = engine.registry().require(series_name)?;
  let raw = tokio::fs::read_to_string(file)
    .await
    .with_context(|| format!("failed to read {file:?}"))?;
  let incoming: Vec<IncomingRow> = serde_json::from_str(&raw)
    .with_context(|| format!("failed to parse rows in {file:?}"))?;

  let fetched_at = Utc::now();
  let rows: Vec<_> = incoming
    .into_iter()
    .map(|r| r.resolve(series, fetched_at))
    .collect();

  let report = engine.upsert(series_name, &rows).await?;
  tracing::info!(
    series = %series_name,
    inserted = report.inserted,
    revised = report.revised,
    skipped = report.skipped,
    "upsert applied"
  );
  print_json(&report)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
