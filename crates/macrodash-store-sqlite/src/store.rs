//! [`SqliteStore`]: the SQLite implementation of [`ObservationStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use macrodash_core::{
  observation::{Observation, ObservationRow, UpsertAction, UpsertReport},
  payload::DateRange,
  store::ObservationStore,
};

use crate::{
  Result,
  encode::{
    EncodedRow, OBSERVATION_COLUMNS, RawObservation, decode_dt,
    decode_dt_in_call, encode_date, encode_dt,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An observation store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of stored rows for `series_name`.
  pub async fn count(&self, series_name: &str) -> Result<usize> {
    let series = series_name.to_owned();
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM observations WHERE series_name = ?1",
          rusqlite::params![series],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(usize::try_from(n).unwrap_or_default())
  }
}

// ─── ObservationStore impl ───────────────────────────────────────────────────

impl ObservationStore for SqliteStore {
  type Error = crate::Error;

  async fn apply_batch(
    &self,
    series_name: &str,
    rows: &[ObservationRow],
  ) -> Result<UpsertReport> {
    let series = series_name.to_owned();
    let rows: Vec<EncodedRow> = rows.iter().map(EncodedRow::from).collect();
    let now = encode_dt(Utc::now());

    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut report = UpsertReport::default();

        {
          let mut select = tx.prepare(
            "SELECT as_of FROM observations
             WHERE series_name = ?1 AND period_start = ?2",
          )?;
          let mut insert = tx.prepare(
            "INSERT INTO observations (
               series_name, period_start, period_end, value, as_of,
               created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          )?;
          let mut revise = tx.prepare(
            "UPDATE observations
             SET period_end = ?3, value = ?4, as_of = ?5, updated_at = ?6
             WHERE series_name = ?1 AND period_start = ?2",
          )?;

          for row in &rows {
            let stored: Option<String> = select
              .query_row(rusqlite::params![series, row.period_start], |r| {
                r.get(0)
              })
              .optional()?;
            let stored = stored.as_deref().map(decode_dt_in_call).transpose()?;

            let action = UpsertAction::decide(stored, row.as_of);
            let params = rusqlite::params![
              series,
              row.period_start,
              row.period_end,
              row.value,
              row.as_of_text,
              now,
            ];
            match action {
              UpsertAction::Insert => insert.execute(params)?,
              UpsertAction::Revise => revise.execute(params)?,
              UpsertAction::Skip => 0,
            };
            report.record(action);
          }
        }

        tx.execute(
          "INSERT INTO series_refresh (series_name, last_refreshed_at)
           VALUES (?1, ?2)
           ON CONFLICT (series_name)
           DO UPDATE SET last_refreshed_at = excluded.last_refreshed_at",
          rusqlite::params![series, now],
        )?;
        tx.commit()?;
        Ok(report)
      })
      .await?;

    Ok(report)
  }

  async fn observations(
    &self,
    series_name: &str,
    range: DateRange,
  ) -> Result<Vec<Observation>> {
    let range = range.intersect(DateRange::storable());
    if range.is_empty() {
      return Ok(Vec::new());
    }
    let series = series_name.to_owned();
    let start = encode_date(range.start);
    let end = encode_date(range.end);

    let raws: Vec<RawObservation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {OBSERVATION_COLUMNS} FROM observations
           WHERE series_name = ?1
             AND period_start >= ?2
             AND period_start <= ?3
           ORDER BY period_start ASC"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![series, start, end],
            RawObservation::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawObservation::into_observation).collect()
  }

  async fn latest(&self, series_name: &str) -> Result<Option<Observation>> {
    let series = series_name.to_owned();

    let raw: Option<RawObservation> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {OBSERVATION_COLUMNS} FROM observations
                 WHERE series_name = ?1
                 ORDER BY period_start DESC
                 LIMIT 1"
              ),
              rusqlite::params![series],
              RawObservation::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawObservation::into_observation).transpose()
  }

  async fn last_refreshed(
    &self,
    series_name: &str,
  ) -> Result<Option<DateTime<Utc>>> {
    let series = series_name.to_owned();

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT last_refreshed_at FROM series_refresh
               WHERE series_name = ?1",
              rusqlite::params![series],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.as_deref().map(decode_dt).transpose()
  }
}
