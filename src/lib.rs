//! QA Metrics library crate.
//!
//! This crate exposes the hospital quality-indicator engine, the record
//! store and the HTTP API as reusable modules.  External applications may
//! depend on the `qa_metrics` crate and call [`engine::compute_fields`]
//! directly, or embed the API via `api::build_router`.

pub mod numeric;
pub mod calendar;
pub mod department;
pub mod formulas;
pub mod models;
pub mod engine;
pub mod error;
pub mod store;
pub mod dashboard;
pub mod service;
pub mod config;
pub mod api;

pub use engine::compute_fields;
pub use error::{QaError, QaResult};
