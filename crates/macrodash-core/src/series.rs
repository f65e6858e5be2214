//! Series metadata: what a tracked series is and how its values relate to
//! the calendar.
//!
//! A series is either *instantaneous* (each value is a reading taken on one
//! day, so `period_start == period_end`) or *periodic* (each value is an
//! aggregate over `[period_start, period_end]`, e.g. a quarterly average).

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Frequency ───────────────────────────────────────────────────────────────

/// How often the source publishes a new value.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
pub enum Frequency {
  #[serde(rename = "D", alias = "daily")]
  Daily,
  #[serde(rename = "W", alias = "weekly")]
  Weekly,
  #[serde(rename = "M", alias = "monthly")]
  Monthly,
  #[serde(rename = "Q", alias = "quarterly")]
  Quarterly,
  #[serde(rename = "A", alias = "annual")]
  Annual,
}

impl Frequency {
  /// The one-letter code used in configuration and in the API.
  pub fn code(self) -> &'static str {
    match self {
      Self::Daily => "D",
      Self::Weekly => "W",
      Self::Monthly => "M",
      Self::Quarterly => "Q",
      Self::Annual => "A",
    }
  }

  pub fn from_code(code: &str) -> Result<Self> {
    match code {
      "D" => Ok(Self::Daily),
      "W" => Ok(Self::Weekly),
      "M" => Ok(Self::Monthly),
      "Q" => Ok(Self::Quarterly),
      "A" => Ok(Self::Annual),
      other => Err(Error::UnknownFrequency(other.to_owned())),
    }
  }

  /// Last day of the aggregation window that begins on `start`.
  ///
  /// Monthly, quarterly and annual windows are calendar-aligned: the window
  /// ends on the last day of the month, quarter or year containing `start`.
  /// Saturates at [`NaiveDate::MAX`].
  pub fn period_end(self, start: NaiveDate) -> NaiveDate {
    let end = match self {
      Self::Daily => Some(start),
      Self::Weekly => start.checked_add_days(Days::new(6)),
      Self::Monthly => month_end(start.year(), start.month(), 1),
      Self::Quarterly => {
        let first_month = (start.month0() / 3) * 3 + 1;
        month_end(start.year(), first_month, 3)
      }
      Self::Annual => NaiveDate::from_ymd_opt(start.year(), 12, 31),
    };
    end.unwrap_or(NaiveDate::MAX)
  }

  /// Calendar bounds of quarter `quarter` (1..=4) of `year`.
  pub fn quarter_bounds(
    year: i32,
    quarter: u32,
  ) -> Result<(NaiveDate, NaiveDate)> {
    if !(1..=4).contains(&quarter) {
      return Err(Error::InvalidQuarter(quarter));
    }
    let start = NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1)
      .ok_or(Error::InvalidQuarter(quarter))?;
    Ok((start, Self::Quarterly.period_end(start)))
  }
}

/// Last day of the `span`-month window starting at the first of
/// `year`/`month`.
fn month_end(year: i32, month: u32, span: u32) -> Option<NaiveDate> {
  NaiveDate::from_ymd_opt(year, month, 1)?
    .checked_add_months(Months::new(span))?
    .pred_opt()
}

// ─── Periodicity ─────────────────────────────────────────────────────────────

/// Whether a value describes an instant or a whole period.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
  /// A point-in-time reading; `period_start == period_end`.
  #[default]
  Instantaneous,
  /// An aggregate or average over `[period_start, period_end]`.
  Periodic,
}

impl Periodicity {
  pub fn is_periodic(self) -> bool { matches!(self, Self::Periodic) }
}

// ─── Series ──────────────────────────────────────────────────────────────────

/// A registry entry. Immutable once the registry is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
  /// Unique identifier; the key observations are stored under.
  pub name:        String,
  pub title:       String,
  #[serde(default)]
  pub unit:        Option<String>,
  /// Provider label, e.g. `FRED` or `NMDB`.
  #[serde(default)]
  pub source:      String,
  /// Provider-specific identifier, e.g. `MORTGAGE30US`.
  #[serde(default)]
  pub code:        String,
  pub frequency:   Frequency,
  #[serde(default)]
  pub periodicity: Periodicity,
}

impl Series {
  pub fn is_periodic(&self) -> bool { self.periodicity.is_periodic() }

  /// Whether `[start, end]` is a legal period for an observation of this
  /// series.
  pub fn accepts_period(&self, start: NaiveDate, end: NaiveDate) -> bool {
    match self.periodicity {
      Periodicity::Instantaneous => start == end,
      Periodicity::Periodic => end >= start,
    }
  }

  /// The period end implied by `start` when a producer did not supply one.
  pub fn default_period_end(&self, start: NaiveDate) -> NaiveDate {
    match self.periodicity {
      Periodicity::Instantaneous => start,
      Periodicity::Periodic => self.frequency.period_end(start),
    }
  }
}
