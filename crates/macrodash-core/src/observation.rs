//! Observations and the revision rule that governs how they change.
//!
//! An observation is identified by `(series_name, period_start)`. Writing the
//! same key again is a *revision*: the row is updated in place, never
//! duplicated, and only when the incoming `as_of` is strictly newer than the
//! stored one.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::series::Series;

// ─── Stored row ──────────────────────────────────────────────────────────────

/// A persisted observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
  pub series_name:  String,
  pub period_start: NaiveDate,
  /// Equal to `period_start` for instantaneous series.
  pub period_end:   NaiveDate,
  pub value:        f64,
  /// Producer-supplied revision marker of the last applied write.
  pub as_of:        DateTime<Utc>,
  /// Store-assigned; when the key was first inserted.
  pub created_at:   DateTime<Utc>,
  /// Store-assigned; when the row was last inserted or revised.
  pub updated_at:   DateTime<Utc>,
}

// ─── Incoming row ────────────────────────────────────────────────────────────

/// A row handed over by a fetcher. `as_of` is normally the fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRow {
  pub period_start: NaiveDate,
  pub period_end:   NaiveDate,
  pub value:        f64,
  pub as_of:        DateTime<Utc>,
}

impl ObservationRow {
  /// A point-in-time reading: `period_end == period_start`.
  pub fn instant(date: NaiveDate, value: f64, as_of: DateTime<Utc>) -> Self {
    Self { period_start: date, period_end: date, value, as_of }
  }

  pub fn period(
    start: NaiveDate,
    end: NaiveDate,
    value: f64,
    as_of: DateTime<Utc>,
  ) -> Self {
    Self { period_start: start, period_end: end, value, as_of }
  }
}

/// A row as producers submit it, before the registry fills in the gaps.
///
/// `period_end` defaults to the series' canonical window end and `as_of` to
/// the fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingRow {
  pub period_start: NaiveDate,
  #[serde(default)]
  pub period_end:   Option<NaiveDate>,
  pub value:        f64,
  #[serde(default)]
  pub as_of:        Option<DateTime<Utc>>,
}

impl IncomingRow {
  pub fn resolve(
    self,
    series: &Series,
    fetched_at: DateTime<Utc>,
  ) -> ObservationRow {
    ObservationRow {
      period_start: self.period_start,
      period_end:   self
        .period_end
        .unwrap_or_else(|| series.default_period_end(self.period_start)),
      value:        self.value,
      as_of:        self.as_of.unwrap_or(fetched_at),
    }
  }
}

// ─── Revision rule ───────────────────────────────────────────────────────────

/// What to do with one incoming row given the stored state of its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
  /// No row exists for the key yet.
  Insert,
  /// The stored row is strictly older; overwrite `value`, `period_end` and
  /// `as_of`.
  Revise,
  /// The stored row is as new or newer. Ties are no-ops.
  Skip,
}

impl UpsertAction {
  /// Decide from the `as_of` currently stored for the key (if any).
  pub fn decide(
    stored_as_of: Option<DateTime<Utc>>,
    incoming_as_of: DateTime<Utc>,
  ) -> Self {
    match stored_as_of {
      None => Self::Insert,
      Some(stored) if stored < incoming_as_of => Self::Revise,
      Some(_) => Self::Skip,
    }
  }
}

/// Per-batch counts returned by an upsert.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct UpsertReport {
  pub inserted: usize,
  pub revised:  usize,
  pub skipped:  usize,
}

impl UpsertReport {
  pub fn record(&mut self, action: UpsertAction) {
    match action {
      UpsertAction::Insert => self.inserted += 1,
      UpsertAction::Revise => self.revised += 1,
      UpsertAction::Skip => self.skipped += 1,
    }
  }

  /// Rows that changed stored state.
  pub fn written(&self) -> usize { self.inserted + self.revised }

  pub fn total(&self) -> usize { self.written() + self.skipped }
}
