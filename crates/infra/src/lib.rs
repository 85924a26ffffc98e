//! Infrastructure layer: ledger boundary, read model, background pipeline,
//! configuration.

pub mod config;
pub mod ledger;
pub mod pipeline;
pub mod read_model;
pub mod simulation;

pub use config::{ConfigError, PipelineConfig};
pub use ledger::{CatalogSource, InMemorySalesLedger, LedgerError, SalesLedger};
pub use pipeline::{PipelineHandle, PipelineRunner, PipelineStats, RetryPolicy};
pub use read_model::{AlertCounts, AlertStore, FeedEntry, FeedKind, Scope};
pub use simulation::{ForecastError, Forecaster, SimulationError, Simulator};
