//! [`SeriesRegistry`]: the static set of series the engine knows about.
//!
//! Built once at startup and never mutated afterwards. Both halves of the
//! engine consult it: ingestion to validate rows, queries to pick a line
//! shape. Reclassifying a series changes how its stored history is rendered,
//! not the stored rows themselves.

use std::collections::BTreeMap;

use crate::{
  Error, Result,
  series::{Frequency, Periodicity, Series},
};

#[derive(Debug, Clone, Default)]
pub struct SeriesRegistry {
  series: BTreeMap<String, Series>,
}

impl SeriesRegistry {
  /// Build a registry, rejecting duplicate names.
  pub fn new(series: impl IntoIterator<Item = Series>) -> Result<Self> {
    let mut map = BTreeMap::new();
    for s in series {
      if map.contains_key(&s.name) {
        return Err(Error::DuplicateSeries(s.name));
      }
      map.insert(s.name.clone(), s);
    }
    Ok(Self { series: map })
  }

  /// The mortgage-dashboard defaults: two FRED instantaneous series and the
  /// quarterly NMDB average outstanding rate.
  pub fn builtin() -> Self {
    let series = builtin_series()
      .into_iter()
      .map(|s| (s.name.clone(), s))
      .collect();
    Self { series }
  }

  pub fn get(&self, name: &str) -> Option<&Series> { self.series.get(name) }

  /// Like [`Self::get`], but an unregistered name is an error.
  pub fn require(&self, name: &str) -> Result<&Series> {
    self
      .get(name)
      .ok_or_else(|| Error::UnknownSeries(name.to_owned()))
  }

  /// All series, ordered by name.
  pub fn iter(&self) -> impl Iterator<Item = &Series> { self.series.values() }

  pub fn len(&self) -> usize { self.series.len() }

  pub fn is_empty(&self) -> bool { self.series.is_empty() }
}

fn builtin_series() -> Vec<Series> {
  vec![
    Series {
      name:        "Mortgage30".into(),
      title:       "30Y Fixed Mortgage Rate".into(),
      unit:        Some("%".into()),
      source:      "FRED".into(),
      code:        "MORTGAGE30US".into(),
      frequency:   Frequency::Weekly,
      periodicity: Periodicity::Instantaneous,
    },
    Series {
      name:        "Treasury10Y".into(),
      title:       "10Y Treasury Constant Maturity".into(),
      unit:        Some("%".into()),
      source:      "FRED".into(),
      code:        "DGS10".into(),
      frequency:   Frequency::Daily,
      periodicity: Periodicity::Instantaneous,
    },
    Series {
      name:        "NMDB_QuarterlyRate".into(),
      title:       "Avg Outstanding Mortgage Interest Rate (NMDB)".into(),
      unit:        Some("%".into()),
      source:      "NMDB".into(),
      code:        "FHFA_NMDB_AVE_INTRATE".into(),
      frequency:   Frequency::Quarterly,
      periodicity: Periodicity::Periodic,
    },
  ]
}
