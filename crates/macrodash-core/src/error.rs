//! Error types for `macrodash-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown series: {0:?}")]
  UnknownSeries(String),

  #[error(
    "invalid period for series {series:?}: {period_start} .. {period_end}"
  )]
  InvalidPeriod {
    series:       String,
    period_start: NaiveDate,
    period_end:   NaiveDate,
  },

  #[error("non-finite value for series {series:?} at {period_start}")]
  InvalidValue {
    series:       String,
    period_start: NaiveDate,
  },

  #[error("series {0:?} is registered twice")]
  DuplicateSeries(String),

  #[error("unknown frequency code: {0:?}")]
  UnknownFrequency(String),

  #[error("quarter must be 1..=4, got {0}")]
  InvalidQuarter(u32),

  /// The backing store failed; nothing from the current batch was written.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
