//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::dashboard::ComponentError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("component error: {0}")]
  Component(#[from] ComponentError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<macrodash_core::Error> for ApiError {
  fn from(e: macrodash_core::Error) -> Self {
    use macrodash_core::Error as E;
    match e {
      E::UnknownSeries(_) => ApiError::NotFound(e.to_string()),
      E::Storage(inner) => ApiError::Store(inner),
      E::InvalidPeriod { .. }
      | E::InvalidValue { .. }
      | E::DuplicateSeries(_)
      | E::UnknownFrequency(_)
      | E::InvalidQuarter(_) => ApiError::BadRequest(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Component(e) => {
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
