//! SQL schema for the macrodash SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One live row per (series_name, period_start). Revisions UPDATE in place;
-- no DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS observations (
    series_name   TEXT NOT NULL,
    period_start  TEXT NOT NULL,   -- YYYY-MM-DD
    period_end    TEXT NOT NULL,   -- equals period_start for instants
    value         REAL NOT NULL,
    as_of         TEXT NOT NULL,   -- RFC 3339 UTC; producer-supplied
    created_at    TEXT NOT NULL,   -- RFC 3339 UTC; store-assigned
    updated_at    TEXT NOT NULL,   -- RFC 3339 UTC; store-assigned
    PRIMARY KEY (series_name, period_start),
    CHECK (period_end >= period_start)
) WITHOUT ROWID;

-- Last committed upsert batch per series.
CREATE TABLE IF NOT EXISTS series_refresh (
    series_name       TEXT PRIMARY KEY,
    last_refreshed_at TEXT NOT NULL
);

PRAGMA user_version = 1;
";
