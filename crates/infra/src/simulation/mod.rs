//! Producers of the pipeline: the sale simulator and the forecast retrainer.

pub mod forecaster;
pub mod simulator;

pub use forecaster::{ForecastError, Forecaster};
pub use simulator::{SimulationError, Simulator};
