use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use chrono::{DateTime, Utc};

use shelfwatch_catalog::Catalog;
use shelfwatch_core::{ProductId, StoreId};
use shelfwatch_sales::{NewSale, SalesEvent};

use super::r#trait::{CatalogSource, LedgerError, SalesLedger};

#[derive(Debug, Default)]
struct LedgerState {
    events: Vec<SalesEvent>,
    by_pair: HashMap<(StoreId, ProductId), Vec<usize>>,
}

/// In-memory append-only sales ledger.
///
/// Intended for tests/dev and the demo daemon. Supports failure injection so
/// retry and abort paths can be exercised deterministically.
#[derive(Debug, Default)]
pub struct InMemorySalesLedger {
    state: RwLock<LedgerState>,
    catalog: Option<Catalog>,
    failing_appends: AtomicU32,
    failing_queries: AtomicBool,
}

impl InMemorySalesLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger that also serves `catalog` through [`CatalogSource`].
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            catalog: Some(catalog),
            ..Self::default()
        }
    }

    /// Make the next `n` appends fail with [`LedgerError::Unavailable`].
    pub fn fail_next_appends(&self, n: u32) {
        self.failing_appends.store(n, Ordering::SeqCst);
    }

    /// Make every query fail with [`LedgerError::Unavailable`] until reset.
    pub fn fail_queries(&self, failing: bool) {
        self.failing_queries.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_injected_append_failure(&self) -> bool {
        self.failing_appends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn check_queries(&self) -> Result<(), LedgerError> {
        if self.failing_queries.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("injected query failure".to_string()));
        }
        Ok(())
    }
}

impl SalesLedger for InMemorySalesLedger {
    fn append_sale(&self, sale: NewSale) -> Result<SalesEvent, LedgerError> {
        sale.validate()
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;

        if self.take_injected_append_failure() {
            return Err(LedgerError::Unavailable("injected append failure".to_string()));
        }

        let mut state = self.state.write().map_err(|_| LedgerError::Poisoned)?;

        let sequence = state.events.len() as u64 + 1;
        let event = sale.into_event(sequence);
        let position = state.events.len();

        state.by_pair.entry(event.pair()).or_default().push(position);
        state.events.push(event.clone());

        Ok(event)
    }

    fn recent_sales(
        &self,
        store_id: StoreId,
        product_id: ProductId,
        limit: usize,
    ) -> Result<Vec<SalesEvent>, LedgerError> {
        self.check_queries()?;
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;

        let Some(positions) = state.by_pair.get(&(store_id, product_id)) else {
            return Ok(vec![]);
        };

        let mut sales: Vec<&SalesEvent> = positions.iter().map(|&i| &state.events[i]).collect();
        sales.sort_by_key(|s| std::cmp::Reverse(s.order_key()));

        Ok(sales.into_iter().take(limit).cloned().collect())
    }

    fn sales_since(&self, since: DateTime<Utc>) -> Result<Vec<SalesEvent>, LedgerError> {
        self.check_queries()?;
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;

        let mut sales: Vec<SalesEvent> = state
            .events
            .iter()
            .filter(|s| s.occurred_at >= since)
            .cloned()
            .collect();
        sales.sort_by_key(|s| s.order_key());

        Ok(sales)
    }
}

impl CatalogSource for InMemorySalesLedger {
    fn load_catalog(&self) -> Result<Catalog, LedgerError> {
        self.check_queries()?;
        self.catalog
            .clone()
            .ok_or_else(|| LedgerError::Unavailable("no catalog configured".to_string()))
    }
}
