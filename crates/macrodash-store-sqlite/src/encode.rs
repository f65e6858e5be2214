//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD` and timestamps as fixed-width RFC 3339
//! UTC strings, so lexical order in SQL matches chronological order. That
//! only holds for four-digit years; callers keep dates inside
//! [`DateRange::storable`](macrodash_core::payload::DateRange::storable).
//! Timestamps keep full nanosecond precision so a decoded `as_of` compares
//! equal to the one that was written.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use macrodash_core::observation::{Observation, ObservationRow};

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// [`decode_dt`] for use inside a `tokio_rusqlite` closure.
pub fn decode_dt_in_call(s: &str) -> tokio_rusqlite::Result<DateTime<Utc>> {
  decode_dt(s).map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// An incoming row with its columns pre-encoded, ready to move into a
/// connection closure.
pub struct EncodedRow {
  pub period_start: String,
  pub period_end:   String,
  pub value:        f64,
  pub as_of:        DateTime<Utc>,
  pub as_of_text:   String,
}

impl From<&ObservationRow> for EncodedRow {
  fn from(row: &ObservationRow) -> Self {
    Self {
      period_start: encode_date(row.period_start),
      period_end:   encode_date(row.period_end),
      value:        row.value,
      as_of:        row.as_of,
      as_of_text:   encode_dt(row.as_of),
    }
  }
}

/// Raw column values read directly from an `observations` row.
pub struct RawObservation {
  pub series_name:  String,
  pub period_start: String,
  pub period_end:   String,
  pub value:        f64,
  pub as_of:        String,
  pub created_at:   String,
  pub updated_at:   String,
}

/// Column list matching [`RawObservation::from_row`].
pub const OBSERVATION_COLUMNS: &str = "series_name, period_start, period_end, \
                                       value, as_of, created_at, updated_at";

impl RawObservation {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      series_name:  row.get(0)?,
      period_start: row.get(1)?,
      period_end:   row.get(2)?,
      value:        row.get(3)?,
      as_of:        row.get(4)?,
      created_at:   row.get(5)?,
      updated_at:   row.get(6)?,
    })
  }

  pub fn into_observation(self) -> Result<Observation> {
    Ok(Observation {
      series_name:  self.series_name,
      period_start: decode_date(&self.period_start)?,
      period_end:   decode_date(&self.period_end)?,
      value:        self.value,
      as_of:        decode_dt(&self.as_of)?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_are_fixed_width_and_ordered() {
    let a = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
    let b = a + chrono::Duration::microseconds(1500);
    let (ea, eb) = (encode_dt(a), encode_dt(b));
    assert_eq!(ea, "2025-01-02T00:00:00.000000000Z");
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn nanosecond_timestamps_decode_unchanged() {
    let a = Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap()
      + chrono::Duration::nanoseconds(123_456_789);
    let encoded = encode_dt(a);
    assert_eq!(encoded, "2025-01-03T00:00:00.123456789Z");
    assert_eq!(decode_dt(&encoded).unwrap(), a);
  }

  #[test]
  fn dates_round_trip_as_iso_text() {
    let d = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
    assert_eq!(encode_date(d), "2024-03-31");
    assert_eq!(decode_date("2024-03-31").unwrap(), d);
  }

  #[test]
  fn bad_date_text_is_a_parse_error() {
    assert!(matches!(decode_date("2024-13-01"), Err(Error::DateParse(_))));
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
