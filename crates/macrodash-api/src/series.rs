//! Handlers for `/series` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/series` | Registry listing |
//! | `GET`  | `/series/{name}` | Optional inclusive `start`, `end` |
//! | `GET`  | `/series/{name}/latest` | 404 if the series has no data |
//! | `POST` | `/series/{name}/observations` | [`IncomingRow`]s in |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{NaiveDate, Utc};
use macrodash_core::{
  observation::{IncomingRow, UpsertReport},
  payload::{DateRange, LatestValue, SeriesPayload},
  series::Series,
  store::ObservationStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /series`
pub async fn list<S>(State(state): State<AppState<S>>) -> Json<Vec<Series>>
where
  S: ObservationStore,
{
  Json(state.engine.registry().iter().cloned().collect())
}

// ─── Payload ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
  pub start: Option<NaiveDate>,
  pub end:   Option<NaiveDate>,
}

impl RangeParams {
  /// Missing bounds are open.
  pub fn range(&self) -> DateRange {
    let all = DateRange::all();
    DateRange::new(self.start.unwrap_or(all.start), self.end.unwrap_or(all.end))
  }
}

/// `GET /series/{name}[?start=YYYY-MM-DD][&end=YYYY-MM-DD]`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
  Query(params): Query<RangeParams>,
) -> Result<Json<SeriesPayload>, ApiError>
where
  S: ObservationStore,
{
  let payload = state.engine.query_range(&name, params.range()).await?;
  Ok(Json(payload))
}

// ─── Latest ──────────────────────────────────────────────────────────────────

/// `GET /series/{name}/latest`
pub async fn latest<S>(
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
) -> Result<Json<LatestValue>, ApiError>
where
  S: ObservationStore,
{
  state
    .engine
    .latest(&name)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("no observations for {name:?}")))
}

// ─── Ingest ──────────────────────────────────────────────────────────────────

/// `POST /series/{name}/observations`
///
/// Rows without `as_of` are stamped with the request time.
pub async fn ingest<S>(
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
  Json(rows): Json<Vec<IncomingRow>>,
) -> Result<Json<UpsertReport>, ApiError>
where
  S: ObservationStore,
{
  let series = state.engine.registry().require(&name)?;
  let fetched_at = Utc::now();
  let rows: Vec<_> = rows
    .into_iter()
    .map(|r| r.resolve(series, fetched_at))
    .collect();

  let report = state.engine.upsert(&name, &rows).await?;
  tracing::info!(
    series = %name,
    inserted = report.inserted,
    revised = report.revised,
    skipped = report.skipped,
    "upsert applied"
  );
  Ok(Json(report))
}
