//! Chart payloads, the only artefact handed to rendering code.
//!
//! Payloads are shaped entirely from stored observations and registry
//! metadata. Renderers draw them as-is and never reach back into the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  observation::Observation,
  series::{Frequency, Series},
};

// ─── Range ───────────────────────────────────────────────────────────────────

/// An inclusive `[start, end]` filter on `period_start`.
///
/// A range with `start > end` is valid and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

impl DateRange {
  pub fn new(start: NaiveDate, end: NaiveDate) -> Self { Self { start, end } }

  /// Every representable date.
  pub fn all() -> Self { Self::new(NaiveDate::MIN, NaiveDate::MAX) }

  /// Dates with four-digit years, the span observations may be stored in.
  pub fn storable() -> Self {
    Self::new(
      NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN),
      NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX),
    )
  }

  /// The dates in both ranges; empty if they do not overlap.
  pub fn intersect(&self, other: DateRange) -> Self {
    Self::new(self.start.max(other.start), self.end.min(other.end))
  }

  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start <= date && date <= self.end
  }

  pub fn is_empty(&self) -> bool { self.start > self.end }
}

// ─── Line shape ──────────────────────────────────────────────────────────────

/// How a renderer should connect consecutive points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineShape {
  /// Straight-line interpolation between readings.
  Linear,
  /// Hold each value until the next period boundary.
  Step,
}

impl LineShape {
  /// Periodic aggregates persist across their period; instantaneous readings
  /// are joined linearly.
  pub fn for_series(series: &Series) -> Self {
    if series.is_periodic() { Self::Step } else { Self::Linear }
  }

  /// The equivalent plotly `line.shape` token.
  pub fn plotly_shape(self) -> &'static str {
    match self {
      Self::Linear => "linear",
      Self::Step => "hv",
    }
  }
}

// ─── Series payload ──────────────────────────────────────────────────────────

/// Index-aligned points for one series plus the hints needed to draw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPayload {
  pub series:      String,
  pub title:       String,
  pub unit:        Option<String>,
  pub frequency:   Frequency,
  pub is_periodic: bool,
  /// Period starts, ascending. Missing periods produce no point.
  pub x:           Vec<NaiveDate>,
  pub y:           Vec<f64>,
  pub line_shape:  LineShape,
}

impl SeriesPayload {
  /// Shape observations (already ordered by `period_start`) for `series`.
  pub fn from_observations(
    series: &Series,
    observations: impl IntoIterator<Item = Observation>,
  ) -> Self {
    let (x, y) = observations
      .into_iter()
      .map(|o| (o.period_start, o.value))
      .unzip();

    Self {
      series: series.name.clone(),
      title: series.title.clone(),
      unit: series.unit.clone(),
      frequency: series.frequency,
      is_periodic: series.is_periodic(),
      x,
      y,
      line_shape: LineShape::for_series(series),
    }
  }

  pub fn len(&self) -> usize { self.x.len() }

  pub fn is_empty(&self) -> bool { self.x.is_empty() }

  pub fn last_point(&self) -> Option<(NaiveDate, f64)> {
    Some((*self.x.last()?, *self.y.last()?))
  }
}

// ─── Latest value ────────────────────────────────────────────────────────────

/// The most recent reading of a series, for overview tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestValue {
  pub series: String,
  pub title:  String,
  pub value:  f64,
  /// `period_start` of the reading.
  pub date:   NaiveDate,
  pub unit:   Option<String>,
}

impl LatestValue {
  pub fn from_observation(series: &Series, observation: &Observation) -> Self {
    Self {
      series: series.name.clone(),
      title:  series.title.clone(),
      value:  observation.value,
      date:   observation.period_start,
      unit:   series.unit.clone(),
    }
  }

  /// The last point of an already-shaped payload, if any.
  pub fn from_payload(payload: &SeriesPayload) -> Option<Self> {
    let (date, value) = payload.last_point()?;
    Some(Self {
      series: payload.series.clone(),
      title: payload.title.clone(),
      value,
      date,
      unit: payload.unit.clone(),
    })
  }
}
