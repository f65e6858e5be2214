//! Dashboard composition.
//!
//! A [`ComponentRegistry`] maps a component kind (e.g. `"spread_chart"`) to
//! the constructor that turns series payloads into renderable data. It is an
//! ordinary value built at startup and passed in through [`AppState`]; there
//! is no global registration. The layout is a list of [`ComponentSpec`]s,
//! usually taken from configuration.
//!
//! Constructors only see payloads, never the store.

use std::collections::{BTreeMap, BTreeSet};

use axum::{Json, extract::State};
use macrodash_core::{
  Engine,
  payload::{LatestValue, SeriesPayload},
  store::ObservationStore,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  AppState,
  error::ApiError,
  overlay::{self, Overlay},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ComponentError {
  #[error("component kind {0:?} is registered twice")]
  DuplicateKind(String),

  #[error("component {alias:?} uses unknown kind {kind:?}")]
  UnknownKind { alias: String, kind: String },

  #[error("component {alias:?} needs {expected} series, got {got}")]
  SeriesCount {
    alias:    String,
    expected: usize,
    got:      usize,
  },

  #[error("component alias {0:?} is used twice")]
  DuplicateAlias(String),
}

// ─── Layout ──────────────────────────────────────────────────────────────────

/// One placed component on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
  /// Unique name of this placement, e.g. `"lock_in_spread"`.
  pub alias:      String,
  /// Registry key of the constructor, e.g. `"spread_chart"`.
  pub kind:       String,
  pub title:      String,
  #[serde(default = "default_page")]
  pub page:       String,
  /// Position of `page` among pages; the lowest value seen for a page wins.
  #[serde(default = "default_order")]
  pub page_order: i32,
  /// Position within the page.
  #[serde(default = "default_order")]
  pub order:      i32,
  #[serde(default = "default_enabled")]
  pub enabled:    bool,
  /// Series names handed to the constructor, in order.
  pub series:     Vec<String>,
}

fn default_page() -> String { "Overview".to_owned() }

fn default_order() -> i32 { 100 }

fn default_enabled() -> bool { true }

fn placed(
  alias: &str,
  kind: &str,
  title: &str,
  page: (&str, i32),
  order: i32,
  series: &[&str],
) -> ComponentSpec {
  ComponentSpec {
    alias: alias.to_owned(),
    kind: kind.to_owned(),
    title: title.to_owned(),
    page: page.0.to_owned(),
    page_order: page.1,
    order,
    enabled: true,
    series: series.iter().map(|s| (*s).to_owned()).collect(),
  }
}

/// The mortgage dashboard: an overview table and two spread charts.
pub fn default_layout() -> Vec<ComponentSpec> {
  vec![
    placed(
      "overview_table",
      "overview_table",
      "Market Overview",
      ("Overview", 1),
      0,
      &["Mortgage30", "Treasury10Y", "NMDB_QuarterlyRate"],
    ),
    placed(
      "mortgage_treasury_spread",
      "spread_chart",
      "30Y Mortgage vs 10Y Treasury with Spread",
      ("Market Analysis", 2),
      1,
      &["Mortgage30", "Treasury10Y"],
    ),
    placed(
      "lock_in_spread",
      "spread_chart",
      "Current vs Outstanding Mortgage Rates (Spread)",
      ("Market Analysis", 2),
      2,
      &["Mortgage30", "NMDB_QuarterlyRate"],
    ),
  ]
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// Renderable data produced by a constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentData {
  Table { rows: Vec<LatestValue> },
  Overlay(Overlay),
}

pub type Constructor = fn(
  &ComponentSpec,
  Vec<SeriesPayload>,
) -> Result<ComponentData, ComponentError>;

#[derive(Clone, Copy)]
struct ComponentKind {
  build:        Constructor,
  /// `None` accepts any number of series.
  series_count: Option<usize>,
}

#[derive(Clone, Default)]
pub struct ComponentRegistry {
  kinds: BTreeMap<String, ComponentKind>,
}

impl ComponentRegistry {
  pub fn new() -> Self { Self::default() }

  /// A registry holding `overview_table` and `spread_chart`.
  pub fn builtin() -> Self {
    let mut kinds = BTreeMap::new();
    kinds.insert("overview_table".to_owned(), ComponentKind {
      build:        overview_table,
      series_count: None,
    });
    kinds.insert("spread_chart".to_owned(), ComponentKind {
      build:        spread_chart,
      series_count: Some(2),
    });
    Self { kinds }
  }

  pub fn register(
    &mut self,
    kind: &str,
    series_count: Option<usize>,
    build: Constructor,
  ) -> Result<&mut Self, ComponentError> {
    if self.kinds.contains_key(kind) {
      return Err(ComponentError::DuplicateKind(kind.to_owned()));
    }
    self
      .kinds
      .insert(kind.to_owned(), ComponentKind { build, series_count });
    Ok(self)
  }

  pub fn contains(&self, kind: &str) -> bool { self.kinds.contains_key(kind) }

  /// Check a layout up front: known kinds, unique aliases, right arity.
  pub fn validate(
    &self,
    layout: &[ComponentSpec],
  ) -> Result<(), ComponentError> {
    let mut seen = BTreeSet::new();
    for spec in layout {
      if !seen.insert(spec.alias.as_str()) {
        return Err(ComponentError::DuplicateAlias(spec.alias.clone()));
      }
      let kind = self.kind(spec)?;
      check_count(spec, kind.series_count, spec.series.len())?;
    }
    Ok(())
  }

  pub fn build(
    &self,
    spec: &ComponentSpec,
    payloads: Vec<SeriesPayload>,
  ) -> Result<ComponentData, ComponentError> {
    let kind = self.kind(spec)?;
    check_count(spec, kind.series_count, payloads.len())?;
    (kind.build)(spec, payloads)
  }

  fn kind(
    &self,
    spec: &ComponentSpec,
  ) -> Result<ComponentKind, ComponentError> {
    self
      .kinds
      .get(&spec.kind)
      .copied()
      .ok_or_else(|| ComponentError::UnknownKind {
        alias: spec.alias.clone(),
        kind:  spec.kind.clone(),
      })
  }
}

fn check_count(
  spec: &ComponentSpec,
  expected: Option<usize>,
  got: usize,
) -> Result<(), ComponentError> {
  match expected {
    Some(expected) if expected != got => Err(ComponentError::SeriesCount {
      alias: spec.alias.clone(),
      expected,
      got,
    }),
    _ => Ok(()),
  }
}

// ─── Built-in constructors ───────────────────────────────────────────────────

fn overview_table(
  _spec: &ComponentSpec,
  payloads: Vec<SeriesPayload>,
) -> Result<ComponentData, ComponentError> {
  let rows = payloads.iter().filter_map(LatestValue::from_payload).collect();
  Ok(ComponentData::Table { rows })
}

fn spread_chart(
  spec: &ComponentSpec,
  payloads: Vec<SeriesPayload>,
) -> Result<ComponentData, ComponentError> {
  let got = payloads.len();
  let mut it = payloads.into_iter();
  match (it.next(), it.next(), it.next()) {
    (Some(left), Some(right), None) => {
      Ok(ComponentData::Overlay(overlay::compose(left, right)))
    }
    _ => Err(ComponentError::SeriesCount {
      alias: spec.alias.clone(),
      expected: 2,
      got,
    }),
  }
}

// ─── Composition ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
  pub pages: Vec<Page>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
  pub name:       String,
  pub components: Vec<RenderedComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedComponent {
  pub alias: String,
  pub title: String,
  pub data:  ComponentData,
}

/// Query every series each enabled component needs and build the pages.
pub async fn compose<S>(
  engine: &Engine<S>,
  registry: &ComponentRegistry,
  layout: &[ComponentSpec],
) -> Result<Dashboard, ApiError>
where
  S: ObservationStore,
{
  let mut specs: Vec<&ComponentSpec> =
    layout.iter().filter(|s| s.enabled).collect();
  specs.sort_by_key(|s| s.order);

  let mut page_rank: BTreeMap<&str, i32> = BTreeMap::new();
  for spec in &specs {
    let rank = page_rank.entry(spec.page.as_str()).or_insert(spec.page_order);
    *rank = (*rank).min(spec.page_order);
  }
  let mut page_names: Vec<&str> = page_rank.keys().copied().collect();
  page_names.sort_by_key(|name| (page_rank[name], *name));

  let mut pages = Vec::with_capacity(page_names.len());
  for name in page_names {
    let mut components = Vec::new();
    for spec in specs.iter().filter(|s| s.page == name) {
      let mut payloads = Vec::with_capacity(spec.series.len());
      for series in &spec.series {
        payloads.push(engine.history(series).await?);
      }
      components.push(RenderedComponent {
        alias: spec.alias.clone(),
        title: spec.title.clone(),
        data:  registry.build(spec, payloads)?,
      });
    }
    pages.push(Page { name: name.to_owned(), components });
  }

  Ok(Dashboard { pages })
}

/// `GET /dashboard`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Dashboard>, ApiError>
where
  S: ObservationStore,
{
  let dashboard =
    compose(&state.engine, &state.components, &state.layout).await?;
  Ok(Json(dashboard))
}
