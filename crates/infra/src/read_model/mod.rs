//! In-memory read model for live alerts and forecasts.
//!
//! Disposable: everything here can be rebuilt from the sales ledger.

pub mod alert_store;
pub mod scope;

pub use alert_store::{AlertCounts, AlertStore, FeedEntry, MAX_ALERTS, MAX_FORECASTS};
pub use scope::{FeedKind, Scope, Scoped};
