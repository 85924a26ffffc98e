use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use shelfwatch_catalog::Catalog;
use shelfwatch_core::{ProductId, StoreId};
use shelfwatch_sales::{NewSale, SalesEvent};

/// Persistence collaborator error.
///
/// Only [`LedgerError::Unavailable`] is transient; callers may retry it with
/// backoff. The other variants mean retrying the same call cannot succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("sale rejected: {0}")]
    Rejected(String),

    #[error("ledger state poisoned")]
    Poisoned,
}

impl LedgerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_))
    }
}

/// Append-only sales history.
///
/// ## Semantics
///
/// - `append_sale` is atomic per event: the sale is either fully persisted and
///   assigned the next sequence number, or not persisted at all.
/// - Ordering is `(occurred_at, sequence)`; equal timestamps keep insertion order.
/// - `recent_sales` returns the newest `limit` sales for one pair, newest first.
/// - `sales_since` returns every sale with `occurred_at >= since`, oldest first.
pub trait SalesLedger: Send + Sync {
    fn append_sale(&self, sale: NewSale) -> Result<SalesEvent, LedgerError>;

    fn recent_sales(
        &self,
        store_id: StoreId,
        product_id: ProductId,
        limit: usize,
    ) -> Result<Vec<SalesEvent>, LedgerError>;

    fn sales_since(&self, since: DateTime<Utc>) -> Result<Vec<SalesEvent>, LedgerError>;
}

impl<S> SalesLedger for Arc<S>
where
    S: SalesLedger + ?Sized,
{
    fn append_sale(&self, sale: NewSale) -> Result<SalesEvent, LedgerError> {
        (**self).append_sale(sale)
    }

    fn recent_sales(
        &self,
        store_id: StoreId,
        product_id: ProductId,
        limit: usize,
    ) -> Result<Vec<SalesEvent>, LedgerError> {
        (**self).recent_sales(store_id, product_id, limit)
    }

    fn sales_since(&self, since: DateTime<Utc>) -> Result<Vec<SalesEvent>, LedgerError> {
        (**self).sales_since(since)
    }
}

/// Source of the process-lifetime catalog (loaded once at startup).
pub trait CatalogSource: Send + Sync {
    fn load_catalog(&self) -> Result<Catalog, LedgerError>;
}

impl<S> CatalogSource for Arc<S>
where
    S: CatalogSource + ?Sized,
{
    fn load_catalog(&self) -> Result<Catalog, LedgerError> {
        (**self).load_catalog()
    }
}
