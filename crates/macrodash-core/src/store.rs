//! The `ObservationStore` trait.
//!
//! Implemented by storage backends (e.g. `macrodash-store-sqlite`). The
//! [`Engine`](crate::engine::Engine) validates input against the registry and
//! then delegates to this abstraction; backends only persist and retrieve.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  observation::{Observation, ObservationRow, UpsertReport},
  payload::DateRange,
};

/// Abstraction over a durable observation table keyed by
/// `(series_name, period_start)`.
///
/// All methods return `Send` futures so the trait can be used behind a
/// multi-threaded async runtime (e.g. tokio with `axum`).
pub trait ObservationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Merge already-validated `rows` into `series_name` as one transaction.
  ///
  /// Each row is classified with
  /// [`UpsertAction::decide`](crate::observation::UpsertAction::decide)
  /// against the state left by the rows before it, so duplicate keys within
  /// a batch resolve to the newest `as_of`. On error nothing is committed.
  /// A committed batch also records the series' refresh time.
  fn apply_batch<'a>(
    &'a self,
    series_name: &'a str,
    rows: &'a [ObservationRow],
  ) -> impl Future<Output = Result<UpsertReport, Self::Error>> + Send + 'a;

  /// Observations of `series_name` whose `period_start` lies in `range`,
  /// ascending by `period_start`.
  fn observations<'a>(
    &'a self,
    series_name: &'a str,
    range: DateRange,
  ) -> impl Future<Output = Result<Vec<Observation>, Self::Error>> + Send + 'a;

  /// The observation with the greatest `period_start`, if any.
  fn latest<'a>(
    &'a self,
    series_name: &'a str,
  ) -> impl Future<Output = Result<Option<Observation>, Self::Error>>
  + Send
  + 'a;

  /// When a batch for `series_name` was last committed.
  fn last_refreshed<'a>(
    &'a self,
    series_name: &'a str,
  ) -> impl Future<Output = Result<Option<DateTime<Utc>>, Self::Error>>
  + Send
  + 'a;
}
