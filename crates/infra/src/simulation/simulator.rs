use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, warn};

use shelfwatch_catalog::Catalog;
use shelfwatch_core::{CityId, ProductId, StoreId};
use shelfwatch_inventory::{DISCOUNT_STEPS, INITIAL_STOCK, UNITS_SOLD, adjust, stock_after_sale};
use shelfwatch_sales::{Alert, AlertContext, NewSale, SalesEvent};

use crate::ledger::{LedgerError, SalesLedger};
use crate::pipeline::retry::{RetryPolicy, sleep_unless};
use crate::read_model::AlertStore;

/// Why a tick produced no alert.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("catalog has no stores or no products")]
    EmptyCatalog,

    #[error("ledger call failed after {attempts} attempt(s): {source}")]
    Persistence {
        attempts: u32,
        #[source]
        source: LedgerError,
    },

    #[error("tick cancelled by shutdown")]
    Cancelled,

    #[error("adjustment roll must be in [0, 1), got {0}")]
    InvalidRoll(f64),

    #[error("store references unknown city {0}")]
    UnknownCity(CityId),
}

/// Scheduled producer of sales and alerts.
///
/// One `tick` picks a random (store, product) pair, synthesizes a sale on top
/// of the pair's latest stock, runs the three-branch adjustment model,
/// appends the sale to the ledger and only then publishes the alert.
pub struct Simulator<L> {
    catalog: Arc<Catalog>,
    ledger: L,
    store: Arc<AlertStore>,
    rng: StdRng,
    retry: RetryPolicy,
    cancel: Arc<AtomicBool>,
}

impl<L: SalesLedger> Simulator<L> {
    pub fn new(catalog: Arc<Catalog>, ledger: L, store: Arc<AlertStore>) -> Self {
        Self {
            catalog,
            ledger,
            store,
            rng: StdRng::from_entropy(),
            retry: RetryPolicy::default(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Deterministic random source.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Flag that aborts backoff waits (`SimulationError::Cancelled`).
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// One simulation step with a random adjustment draw.
    pub fn tick(&mut self) -> Result<Arc<Alert>, SimulationError> {
        let roll: f64 = self.rng.r#gen();
        self.tick_with_roll(roll)
    }

    /// One simulation step with a forced adjustment draw `roll` in `[0, 1)`.
    pub fn tick_with_roll(&mut self, roll: f64) -> Result<Arc<Alert>, SimulationError> {
        if !(0.0..1.0).contains(&roll) {
            return Err(SimulationError::InvalidRoll(roll));
        }

        let catalog = Arc::clone(&self.catalog);
        let (store, product) = catalog
            .pick_pair(&mut self.rng)
            .ok_or(SimulationError::EmptyCatalog)?;
        let city = catalog
            .city(store.city_id)
            .ok_or(SimulationError::UnknownCity(store.city_id))?;

        let current = self.current_stock(store.id, product.id)?;
        let units = self.rng.gen_range(UNITS_SOLD);
        let computed = stock_after_sale(current, units);

        let discount = DISCOUNT_STEPS.choose(&mut self.rng).copied().unwrap_or(0);
        let holiday = self.rng.gen_bool(0.5);
        let activity = self.rng.gen_bool(0.5);

        let adjustment =
            adjust(computed, roll, &mut self.rng).map_err(|_| SimulationError::InvalidRoll(roll))?;

        let sale = NewSale::new(Utc::now(), store.id, product.id, city.id, units, adjustment.stock)
            .with_discount(discount)
            .with_flags(holiday, activity);
        let event = self.append(sale)?;

        let forecast = self.store.forecast_for(store.id, product.id).map(|f| f.risk);
        let alert = Alert::from_sale(
            &event,
            adjustment.label,
            forecast,
            AlertContext {
                store_name: store.name.clone(),
                product_name: product.name.clone(),
                city_name: city.name.clone(),
            },
        );

        debug!(
            store = %store.id,
            product = %product.id,
            sequence = event.sequence,
            units,
            stock = event.stock,
            label = %adjustment.label,
            "sale simulated"
        );

        Ok(self.store.append_alert(alert))
    }

    fn current_stock(
        &mut self,
        store_id: StoreId,
        product_id: ProductId,
    ) -> Result<u32, SimulationError> {
        let latest = self.with_retry("recent_sales", || {
            self.ledger.recent_sales(store_id, product_id, 1)
        })?;
        match latest.first() {
            Some(sale) => Ok(sale.stock),
            None => Ok(self.rng.gen_range(INITIAL_STOCK)),
        }
    }

    fn append(&self, sale: NewSale) -> Result<SalesEvent, SimulationError> {
        self.with_retry("append_sale", || self.ledger.append_sale(sale.clone()))
    }

    /// Retry transient ledger failures with backoff; give up on anything else.
    fn with_retry<T>(
        &self,
        op: &'static str,
        mut call: impl FnMut() -> Result<T, LedgerError>,
    ) -> Result<T, SimulationError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match call() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        op,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "ledger call failed; retrying"
                    );
                    if !sleep_unless(&self.cancel, delay) {
                        return Err(SimulationError::Cancelled);
                    }
                }
                Err(source) => {
                    return Err(SimulationError::Persistence {
                        attempts: attempt,
                        source,
                    });
                }
            }
            if self.cancel.load(Ordering::SeqCst) {
                return Err(SimulationError::Cancelled);
            }
        }
    }
}
