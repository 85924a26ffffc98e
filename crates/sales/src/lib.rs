//! Sales records and the alerts derived from them.
//!
//! Pure data + validation (no IO, no storage). The ledger boundary that
//! persists sales lives in `shelfwatch-infra`.

pub mod alert;
pub mod sale;

pub use alert::{Alert, AlertContext};
pub use sale::{NewSale, SalesEvent};
