//! Sales ledger boundary (persistence collaborator).
//!
//! The pipeline only needs three calls from storage: append one sale, read the
//! newest sales of a pair, and read a trailing time window. Catalog loading
//! lives at the same boundary.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemorySalesLedger;
pub use r#trait::{CatalogSource, LedgerError, SalesLedger};
