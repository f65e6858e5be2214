//! Two-series overlays with a spread panel.
//!
//! Composition happens here, over two independently queried payloads; the
//! core never joins series. The series are aligned on the union of their
//! dates with each side carried forward from its last reading, so a
//! quarterly aggregate is compared against every weekly reading inside the
//! quarter.

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use macrodash_core::{
  payload::{LineShape, SeriesPayload},
  store::ObservationStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, series::RangeParams};

/// Two series drawn together plus their difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
  /// `[left, right]`, unchanged.
  pub top:    Vec<SeriesPayload>,
  /// `left - right` wherever both sides have a value to carry.
  pub spread: SeriesPayload,
}

/// Build an [`Overlay`] from two payloads.
pub fn compose(left: SeriesPayload, right: SeriesPayload) -> Overlay {
  let mut dates: Vec<NaiveDate> =
    left.x.iter().chain(right.x.iter()).copied().collect();
  dates.sort_unstable();
  dates.dedup();

  let mut l = Carry::new(&left);
  let mut r = Carry::new(&right);
  let mut x = Vec::with_capacity(dates.len());
  let mut y = Vec::with_capacity(dates.len());

  for date in dates {
    if let (Some(a), Some(b)) = (l.at(date), r.at(date)) {
      x.push(date);
      y.push(a - b);
    }
  }

  let spread = SeriesPayload {
    series: format!("{}_minus_{}", left.series, right.series),
    title: format!("{} - {}", left.title, right.title),
    unit: left.unit.clone(),
    frequency: left.frequency,
    is_periodic: false,
    x,
    y,
    line_shape: LineShape::Linear,
  };

  Overlay { top: vec![left, right], spread }
}

/// Forward-fill cursor over one payload; dates must be queried ascending.
struct Carry<'a> {
  payload: &'a SeriesPayload,
  next:    usize,
  last:    Option<f64>,
}

impl<'a> Carry<'a> {
  fn new(payload: &'a SeriesPayload) -> Self {
    Self { payload, next: 0, last: None }
  }

  fn at(&mut self, date: NaiveDate) -> Option<f64> {
    while let Some(x) = self.payload.x.get(self.next) {
      if *x > date {
        break;
      }
      self.last = self.payload.y.get(self.next).copied();
      self.next += 1;
    }
    self.last
  }
}

// ─── Handler ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OverlayParams {
  pub left:  String,
  pub right: String,
  pub start: Option<NaiveDate>,
  pub end:   Option<NaiveDate>,
}

/// `GET /overlay?left=<name>&right=<name>[&start=...][&end=...]`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<OverlayParams>,
) -> Result<Json<Overlay>, ApiError>
where
  S: ObservationStore,
{
  let range = RangeParams { start: params.start, end: params.end }.range();
  let left = state.engine.query_range(&params.left, range).await?;
  let right = state.engine.query_range(&params.right, range).await?;
  Ok(Json(compose(left, right)))
}

#[cfg(test)]
mod tests {
  use macrodash_core::series::Frequency;

  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  fn payload(
    name: &str,
    periodic: bool,
    points: &[(NaiveDate, f64)],
  ) -> SeriesPayload {
    let frequency = if periodic {
      Frequency::Quarterly
    } else {
      Frequency::Weekly
    };
    SeriesPayload {
      series:      name.into(),
      title:       name.to_uppercase(),
      unit:        Some("%".into()),
      frequency,
      is_periodic: periodic,
      x:           points.iter().map(|p| p.0).collect(),
      y:           points.iter().map(|p| p.1).collect(),
      line_shape:  if periodic { LineShape::Step } else { LineShape::Linear },
    }
  }

  #[test]
  fn quarterly_value_is_carried_across_weekly_readings() {
    let weekly = payload("m30", false, &[
      (d(2024, 1, 4), 6.62),
      (d(2024, 1, 11), 6.66),
      (d(2024, 4, 4), 6.82),
    ]);
    let quarterly = payload("nmdb", true, &[
      (d(2024, 1, 1), 4.0),
      (d(2024, 4, 1), 4.1),
    ]);

    let overlay = compose(weekly, quarterly);
    let spread = &overlay.spread;

    assert_eq!(spread.series, "m30_minus_nmdb");
    assert_eq!(spread.title, "M30 - NMDB");
    assert_eq!(spread.line_shape, LineShape::Linear);
    // 2024-01-01 has no weekly reading yet, so no spread point.
    assert_eq!(spread.x, [
      d(2024, 1, 4),
      d(2024, 1, 11),
      d(2024, 4, 1),
      d(2024, 4, 4),
    ]);
    let expected = [2.62, 2.66, 2.56, 2.72];
    for (got, want) in spread.y.iter().zip(expected) {
      assert!((got - want).abs() < 1e-9, "{got} vs {want}");
    }
    assert_eq!(overlay.top.len(), 2);
    assert_eq!(overlay.top[1].line_shape, LineShape::Step);
  }

  #[test]
  fn empty_side_yields_empty_spread() {
    let weekly = payload("m30", false, &[(d(2024, 1, 4), 6.62)]);
    let empty = payload("t10", false, &[]);
    let overlay = compose(weekly, empty);
    assert!(overlay.spread.is_empty());
  }
}
