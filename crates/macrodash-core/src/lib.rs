//! Core types for the macrodash time-series engine.
//!
//! Distinguishes instantaneous readings from period aggregates, applies
//! revisions under `as_of` ordering, and shapes stored history into chart
//! payloads. This crate is free of HTTP and database dependencies; storage
//! backends implement [`store::ObservationStore`].

// Native `async fn` in traits; the trait spells out `Send` futures itself.
#![allow(async_fn_in_trait)]

pub mod engine;
pub mod error;
pub mod observation;
pub mod payload;
pub mod registry;
pub mod series;
pub mod store;

pub use engine::Engine;
pub use error::{Error, Result};
