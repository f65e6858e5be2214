//! [`Engine`]: ingestion and query over a registry and a store.
//!
//! The engine is the single writer and the single reader of the store. It
//! performs no logging; callers report the returned [`UpsertReport`].

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
  Error, Result,
  observation::{ObservationRow, UpsertReport},
  payload::{DateRange, LatestValue, SeriesPayload},
  registry::SeriesRegistry,
  series::Series,
  store::ObservationStore,
};

pub struct Engine<S> {
  registry: SeriesRegistry,
  store:    S,
}

impl<S: ObservationStore> Engine<S> {
  pub fn new(registry: SeriesRegistry, store: S) -> Self {
    Self { registry, store }
  }

  pub fn registry(&self) -> &SeriesRegistry { &self.registry }

  pub fn store(&self) -> &S { &self.store }

  // ── Ingestion ─────────────────────────────────────────────────────────────

  /// Merge one fetched batch into `series_name`.
  ///
  /// The whole batch is validated first; an unknown series or any bad row
  /// rejects it without writing anything. Rows whose `as_of` is not newer
  /// than the stored one are counted as skipped.
  pub async fn upsert(
    &self,
    series_name: &str,
    rows: &[ObservationRow],
  ) -> Result<UpsertReport> {
    let series = self.registry.require(series_name)?;
    validate_batch(series, rows)?;

    self
      .store
      .apply_batch(series_name, rows)
      .await
      .map_err(Error::storage)
  }

  // ── Queries ───────────────────────────────────────────────────────────────

  /// Points of `series_name` with `period_start` in `[start, end]`.
  pub async fn query(
    &self,
    series_name: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<SeriesPayload> {
    self.query_range(series_name, DateRange::new(start, end)).await
  }

  /// The full stored history of `series_name`.
  pub async fn history(&self, series_name: &str) -> Result<SeriesPayload> {
    self.query_range(series_name, DateRange::all()).await
  }

  pub async fn query_range(
    &self,
    series_name: &str,
    range: DateRange,
  ) -> Result<SeriesPayload> {
    let series = self.registry.require(series_name)?;
    let range = range.intersect(DateRange::storable());
    if range.is_empty() {
      return Ok(SeriesPayload::from_observations(series, Vec::new()));
    }

    let observations = self
      .store
      .observations(series_name, range)
      .await
      .map_err(Error::storage)?;
    Ok(SeriesPayload::from_observations(series, observations))
  }

  pub async fn latest(&self, series_name: &str) -> Result<Option<LatestValue>> {
    let series = self.registry.require(series_name)?;
    let latest = self
      .store
      .latest(series_name)
      .await
      .map_err(Error::storage)?;
    Ok(latest.map(|o| LatestValue::from_observation(series, &o)))
  }

  /// Latest readings for `names`, in the given order. Series without data
  /// are left out.
  pub async fn latest_values<N: AsRef<str>>(
    &self,
    names: &[N],
  ) -> Result<Vec<LatestValue>> {
    let mut values = Vec::with_capacity(names.len());
    for name in names {
      if let Some(v) = self.latest(name.as_ref()).await? {
        values.push(v);
      }
    }
    Ok(values)
  }

  pub async fn last_refreshed(
    &self,
    series_name: &str,
  ) -> Result<Option<DateTime<Utc>>> {
    self.registry.require(series_name)?;
    self
      .store
      .last_refreshed(series_name)
      .await
      .map_err(Error::storage)
  }
}

/// Check every row of a batch against the series' period rules.
///
/// Periods must also fall inside [`DateRange::storable`].
pub fn validate_batch(series: &Series, rows: &[ObservationRow]) -> Result<()> {
  let storable = DateRange::storable();
  for row in rows {
    if !series.accepts_period(row.period_start, row.period_end)
      || !storable.contains(row.period_start)
      || !storable.contains(row.period_end)
    {
      return Err(Error::InvalidPeriod {
        series:       series.name.clone(),
        period_start: row.period_start,
        period_end:   row.period_end,
      });
    }
    if !row.value.is_finite() {
      return Err(Error::InvalidValue {
        series:       series.name.clone(),
        period_start: row.period_start,
      });
    }
  }
  Ok(())
}
