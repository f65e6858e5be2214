//! JSON API for macrodash.
//!
//! Exposes an axum [`Router`] over an [`Engine`] backed by any
//! [`ObservationStore`]. Transport concerns are the caller's responsibility.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/series` | Registry listing |
//! | `GET`  | `/series/{name}` | Chart payload; optional `start`, `end` |
//! | `POST` | `/series/{name}/observations` | Upsert a batch |
//! | `GET`  | `/series/{name}/latest` | Most recent value |
//! | `GET`  | `/overlay` | `left`, `right`, optional `start`, `end` |
//! | `GET`  | `/dashboard` | Every enabled component, grouped by page |
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", macrodash_api::api_router(state))
//! ```

pub mod dashboard;
pub mod error;
pub mod overlay;
pub mod series;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use macrodash_core::{Engine, store::ObservationStore};

pub use dashboard::{ComponentRegistry, ComponentSpec};
pub use error::ApiError;

/// Shared handler state.
pub struct AppState<S> {
  pub engine:     Arc<Engine<S>>,
  pub components: Arc<ComponentRegistry>,
  pub layout:     Arc<Vec<ComponentSpec>>,
}

impl<S> AppState<S> {
  pub fn new(
    engine: Engine<S>,
    components: ComponentRegistry,
    layout: Vec<ComponentSpec>,
  ) -> Self {
    Self {
      engine:     Arc::new(engine),
      components: Arc::new(components),
      layout:     Arc::new(layout),
    }
  }
}

// Derived Clone would require `S: Clone`.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      engine:     Arc::clone(&self.engine),
      components: Arc::clone(&self.components),
      layout:     Arc::clone(&self.layout),
    }
  }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: ObservationStore + 'static,
{
  Router::new()
    // Series
    .route("/series", get(series::list::<S>))
    .route("/series/{name}", get(series::get_one::<S>))
    .route("/series/{name}/latest", get(series::latest::<S>))
    .route("/series/{name}/observations", post(series::ingest::<S>))
    // Composition
    .route("/overlay", get(overlay::handler::<S>))
    .route("/dashboard", get(dashboard::handler::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use macrodash_core::registry::SeriesRegistry;
  use macrodash_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt;

  use super::*;

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState::new(
      Engine::new(SeriesRegistry::builtin(), store),
      ComponentRegistry::builtin(),
      dashboard::default_layout(),
    )
  }

  async fn send(
    state: &AppState<SqliteStore>,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = api_router(state.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  fn row(period_start: &str, value: f64, as_of: &str) -> Value {
    json!({ "period_start": period_start, "value": value, "as_of": as_of })
  }

  async fn post_rows(
    state: &AppState<SqliteStore>,
    name: &str,
    rows: Value,
  ) -> (StatusCode, Value) {
    let uri = format!("/series/{name}/observations");
    send(state, "POST", &uri, Some(rows)).await
  }

  async fn seed(state: &AppState<SqliteStore>) {
    let m30 = json!([
      row("2024-01-04", 6.62, "2024-01-05T00:00:00Z"),
      row("2024-01-11", 6.66, "2024-01-12T00:00:00Z"),
    ]);
    let t10 = json!([
      row("2024-01-04", 3.99, "2024-01-05T00:00:00Z"),
      row("2024-01-11", 4.09, "2024-01-12T00:00:00Z"),
    ]);
    let nmdb = json!([row("2024-01-01", 4.0, "2024-06-01T00:00:00Z")]);

    for (name, rows) in [
      ("Mortgage30", m30),
      ("Treasury10Y", t10),
      ("NMDB_QuarterlyRate", nmdb),
    ] {
      let (status, _) = post_rows(state, name, rows).await;
      assert_eq!(status, StatusCode::OK);
    }
  }

  // ── Series ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_returns_registry() {
    let state = make_state().await;
    let (status, body) = send(&state, "GET", "/series", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
      .as_array()
      .unwrap()
      .iter()
      .map(|s| s["name"].as_str().unwrap())
      .collect();
    assert_eq!(names, ["Mortgage30", "NMDB_QuarterlyRate", "Treasury10Y"]);
  }

  #[tokio::test]
  async fn unknown_series_is_404() {
    let state = make_state().await;
    let (status, body) = send(&state, "GET", "/series/Nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Nope"));
  }

  #[tokio::test]
  async fn ingest_then_query_payload() {
    let state = make_state().await;
    seed(&state).await;

    let (status, body) =
      send(&state, "GET", "/series/NMDB_QuarterlyRate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["line_shape"], "step");
    assert_eq!(body["is_periodic"], true);
    assert_eq!(body["x"], json!(["2024-01-01"]));

    let (_, body) = send(
      &state,
      "GET",
      "/series/Mortgage30?start=2024-01-05&end=2024-12-31",
      None,
    )
    .await;
    assert_eq!(body["line_shape"], "linear");
    assert_eq!(body["x"], json!(["2024-01-11"]));
    assert_eq!(body["y"], json!([6.66]));
  }

  #[tokio::test]
  async fn ingest_reports_revisions() {
    let state = make_state().await;
    seed(&state).await;

    let rows = json!([row("2024-01-01", 4.05, "2024-09-01T00:00:00Z")]);
    let (status, body) = post_rows(&state, "NMDB_QuarterlyRate", rows).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "inserted": 0, "revised": 1, "skipped": 0 }));
  }

  #[tokio::test]
  async fn invalid_period_is_400() {
    let state = make_state().await;
    let rows = json!([{
      "period_start": "2024-03-31",
      "period_end":   "2024-01-01",
      "value":        4.0,
    }]);
    let (status, _) = post_rows(&state, "NMDB_QuarterlyRate", rows).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn latest_is_404_until_data_arrives() {
    let state = make_state().await;
    let (status, _) =
      send(&state, "GET", "/series/Treasury10Y/latest", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    seed(&state).await;
    let (status, body) =
      send(&state, "GET", "/series/Treasury10Y/latest", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], "2024-01-11");
    assert_eq!(body["value"], 4.09);
  }

  // ── Composition ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn overlay_returns_both_series_and_spread() {
    let state = make_state().await;
    seed(&state).await;

    let (status, body) = send(
      &state,
      "GET",
      "/overlay?left=Mortgage30&right=NMDB_QuarterlyRate",
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["top"].as_array().unwrap().len(), 2);
    assert_eq!(body["spread"]["series"], "Mortgage30_minus_NMDB_QuarterlyRate");
    assert_eq!(body["spread"]["x"], json!(["2024-01-04", "2024-01-11"]));
  }

  #[tokio::test]
  async fn overlay_with_unknown_side_is_404() {
    let state = make_state().await;
    let (status, _) =
      send(&state, "GET", "/overlay?left=Mortgage30&right=Nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn dashboard_groups_components_by_page() {
    let state = make_state().await;
    seed(&state).await;

    let (status, body) = send(&state, "GET", "/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);

    let pages = body["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0]["name"], "Overview");
    assert_eq!(pages[1]["name"], "Market Analysis");

    let table = &pages[0]["components"][0]["data"];
    assert_eq!(table["type"], "table");
    assert_eq!(table["rows"].as_array().unwrap().len(), 3);

    let charts = pages[1]["components"].as_array().unwrap();
    let aliases: Vec<&str> = charts
      .iter()
      .map(|c| c["alias"].as_str().unwrap())
      .collect();
    assert_eq!(aliases, ["mortgage_treasury_spread", "lock_in_spread"]);
    assert_eq!(charts[0]["data"]["type"], "overlay");
  }

  #[tokio::test]
  async fn dashboard_renders_with_no_data() {
    let state = make_state().await;
    let (status, body) = send(&state, "GET", "/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pages"][0]["components"][0]["data"]["rows"], json!([]));
  }
}
