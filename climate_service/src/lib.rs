//! Read-only HTTP query service over a daily climate-observation dataset.
//!
//! Modules:
//! - `model`: dataset rows, query results, date helpers, error types.
//! - `db`: declared schema and per-request read-only sessions.
//! - `queries`: the read operations behind each endpoint.
//! - `api`: axum router and handlers.
//! - `verify`: dataset integrity report.
//! - `config`: TOML + environment configuration.
//! - `logging`: structured logging helpers.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod queries;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_utils;
