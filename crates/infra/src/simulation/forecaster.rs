use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use shelfwatch_ai::{AiError, AiJob, DemandForecastJob, Forecast, Regressor, RidgeRegressor};
use shelfwatch_catalog::Catalog;

use crate::ledger::{LedgerError, SalesLedger};
use crate::read_model::AlertStore;

/// A retrain cycle that wrote nothing.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("could not fetch sales window: {0}")]
    Fetch(#[source] LedgerError),

    #[error("forecast job failed: {0}")]
    Job(#[source] AiError),
}

/// Periodic retrainer of per-pair demand forecasts.
///
/// Reads a trailing window from the ledger, runs [`DemandForecastJob`], and
/// publishes the batch into the forecast cache of the [`AlertStore`].
pub struct Forecaster<L, M = RidgeRegressor> {
    catalog: Arc<Catalog>,
    ledger: L,
    store: Arc<AlertStore>,
    regressor: M,
}

impl<L: SalesLedger> Forecaster<L, RidgeRegressor> {
    pub fn new(catalog: Arc<Catalog>, ledger: L, store: Arc<AlertStore>) -> Self {
        Self {
            catalog,
            ledger,
            store,
            regressor: RidgeRegressor::default(),
        }
    }
}

impl<L: SalesLedger, M: Regressor + Clone> Forecaster<L, M> {
    pub fn with_regressor<N: Regressor + Clone>(self, regressor: N) -> Forecaster<L, N> {
        Forecaster {
            catalog: self.catalog,
            ledger: self.ledger,
            store: self.store,
            regressor,
        }
    }

    /// Recompute forecasts over the last `window` of sales.
    ///
    /// Groups are the pairs seen in the window plus the pairs already cached.
    /// A fetch failure aborts the cycle and leaves the cache untouched.
    /// Returns the forecasts that were published.
    pub fn retrain(&self, window: Duration) -> Result<Vec<Forecast>, ForecastError> {
        let started = Instant::now();
        let now = Utc::now();

        let history = self
            .ledger
            .sales_since(now - window)
            .map_err(ForecastError::Fetch)?;
        let observations = history.len();

        let batch = DemandForecastJob::new(history, now)
            .with_tracked_pairs(self.store.forecast_pairs())
            .with_regressor(self.regressor.clone())
            .run()
            .map_err(ForecastError::Job)?;

        for ((store, product), e) in &batch.fallbacks {
            debug!(
                store = %store,
                product = %product,
                error = %e,
                "model fit failed; using mean heuristic"
            );
        }

        let (known, unknown): (Vec<Forecast>, Vec<Forecast>) = batch
            .forecasts
            .into_iter()
            .partition(|f| self.catalog.contains_pair(f.store_id, f.product_id));

        for f in &unknown {
            warn!(
                store = %f.store_id,
                product = %f.product_id,
                "forecast group not in catalog; skipped"
            );
        }

        self.store.replace_forecasts(known.iter().cloned());

        info!(
            groups = known.len(),
            skipped = unknown.len(),
            fallbacks = batch.fallbacks.len(),
            observations,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "forecast retrain complete"
        );

        Ok(known)
    }
}
