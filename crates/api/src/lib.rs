//! Read-only view API over the live alert feed, plus daemon wiring.

pub mod app;
pub mod config;
pub mod context;
pub mod sample;

pub use app::AlertFeed;
pub use config::DaemonConfig;
pub use context::Viewer;
pub use sample::sample_catalog;
