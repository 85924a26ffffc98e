//! View-layer services and their response types.

pub mod dto;
pub mod feed;

pub use feed::{AlertFeed, DEFAULT_ALERT_LIMIT, DEFAULT_FORECAST_LIMIT};
