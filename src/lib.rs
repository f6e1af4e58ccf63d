//! Resale price forecasting for public-housing transactions
//!
//! This crate turns a raw resale transaction table into a trained price
//! model and a multi-year projection of future prices:
//! - [`features`] - Row-level derivation, grouped statistics, rolling means
//! - [`preprocessing`] - Fail-fast label encoding and train-only scaling
//! - [`anomaly`] - Isolation-forest outlier flagging
//! - [`timeseries`] - Cutoff-year partition and time-ordered cross-validation
//! - [`training`] - Regression trees, the bagged forest, and the grid search
//! - [`evaluation`] - Held-out metrics and feature-importance ranking
//! - [`forecast`] - Model artifact persistence and future projection
//! - [`pipeline`] - End-to-end orchestration

pub mod anomaly;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod forecast;
pub mod pipeline;
pub mod preprocessing;
pub mod schema;
pub mod timeseries;
pub mod training;

pub use config::PipelineConfig;
pub use error::{ForecastError, Result};
pub use pipeline::{ForecastPipeline, PipelineOutcome};

#[cfg(test)]
pub(crate) mod testutil;
