//! Runtime configuration, deserialised from `config.toml` and `MACRODASH_*`
//! environment variables.
//!
//! ```toml
//! host       = "0.0.0.0"
//! port       = 8080
//! store_path = "~/.local/share/macrodash/macrodash.db"
//!
//! [[series]]
//! name        = "Mortgage30"
//! title       = "30-Year Fixed Mortgage Rate"
//! unit        = "%"
//! source      = "FRED"
//! code        = "MORTGAGE30US"
//! frequency   = "W"
//!
//! [[components]]
//! alias  = "overview_table"
//! kind   = "overview_table"
//! title  = "Market Overview"
//! series = ["Mortgage30"]
//! ```
//!
//! An empty `series` list means the built-in registry; an empty `components`
//! list means the default dashboard.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use macrodash_api::{ComponentSpec, dashboard};
use macrodash_core::{registry::SeriesRegistry, series::Series};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub series:     Vec<Series>,
  #[serde(default)]
  pub components: Vec<ComponentSpec>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("data/macrodash.db") }

impl ServerConfig {
  /// Load from `path` (which may be missing) layered under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_file_source(config::File::from(path).required(false))
  }

  fn from_file_source<F>(file: F) -> anyhow::Result<Self>
  where
    F: config::Source + Send + Sync + 'static,
  {
    config::Config::builder()
      .add_source(file)
      .add_source(config::Environment::with_prefix("MACRODASH"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// Store path with a leading `~` expanded.
  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn registry(&self) -> anyhow::Result<SeriesRegistry> {
    if self.series.is_empty() {
      return Ok(SeriesRegistry::builtin());
    }
    SeriesRegistry::new(self.series.iter().cloned())
      .context("invalid [[series]] configuration")
  }

  pub fn layout(&self) -> Vec<ComponentSpec> {
    if self.components.is_empty() {
      dashboard::default_layout()
    } else {
      self.components.clone()
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use config::{File, FileFormat};
  use macrodash_core::series::{Frequency, Periodicity};

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    ServerConfig::from_file_source(File::from_str(toml, FileFormat::Toml))
      .unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.store_path, PathBuf::from("data/macrodash.db"));
    assert_eq!(cfg.registry().unwrap().len(), 3);
    assert_eq!(cfg.layout(), dashboard::default_layout());
  }

  #[test]
  fn series_and_components_are_read_from_toml() {
    let cfg = parse(
      r#"
        port = 9000

        [[series]]
        name        = "nmdb_rate"
        title       = "NMDB average rate"
        frequency   = "Q"
        periodicity = "periodic"

        [[components]]
        alias  = "table"
        kind   = "overview_table"
        title  = "Rates"
        order  = 3
        series = ["nmdb_rate"]
      "#,
    );
    assert_eq!(cfg.port, 9000);

    let registry = cfg.registry().unwrap();
    let nmdb = registry.require("nmdb_rate").unwrap();
    assert_eq!(nmdb.frequency, Frequency::Quarterly);
    assert_eq!(nmdb.periodicity, Periodicity::Periodic);

    let layout = cfg.layout();
    assert_eq!(layout.len(), 1);
    assert_eq!(layout[0].order, 3);
    assert_eq!(layout[0].page, "Overview");
    assert!(layout[0].enabled);
  }

  #[test]
  fn duplicate_series_names_are_rejected() {
    let cfg = parse(
      r#"
        [[series]]
        name      = "a"
        title     = "A"
        frequency = "D"

        [[series]]
        name      = "a"
        title     = "A again"
        frequency = "W"
      "#,
    );
    assert!(cfg.registry().is_err());
  }

  #[test]
  fn tilde_is_expanded_against_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    let expanded = expand_tilde(Path::new("~/macrodash.db"));
    assert_eq!(expanded, PathBuf::from(home).join("macrodash.db"));
    assert_eq!(
      expand_tilde(Path::new("/tmp/x.db")),
      PathBuf::from("/tmp/x.db")
    );
  }
}
