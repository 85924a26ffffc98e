//! `shelfwatch-ai`
//!
//! **Responsibility:** demand forecasting over sales history.
//!
//! This crate stays storage-agnostic and side-effect free:
//! - Inputs (ledger windows) are provided by callers (infra runners).
//! - It never logs or mutates shared state; per-group fallbacks are reported
//!   back in the result so callers can log them.

pub mod forecast;
pub mod job;
pub mod regression;
pub mod result;

pub use forecast::{
    DEFAULT_EMPTY_FORECAST, DemandForecastJob, Forecast, ForecastBasis, ForecastBatch, HORIZON_DAYS,
    MIN_REGRESSION_OBSERVATIONS,
};
pub use job::AiJob;
pub use regression::{FeatureRow, LinearModel, Regressor, RidgeRegressor};
pub use result::AiError;
