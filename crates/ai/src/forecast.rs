use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelfwatch_core::{ProductId, StoreId};
use shelfwatch_inventory::RiskLabel;
use shelfwatch_sales::SalesEvent;

use crate::job::AiJob;
use crate::regression::{FeatureRow, Regressor, RidgeRegressor};
use crate::result::AiError;

/// Days predicted per forecast.
pub const HORIZON_DAYS: usize = 7;

/// Groups with fewer observations use the mean heuristic instead of regression.
pub const MIN_REGRESSION_OBSERVATIONS: usize = 7;

/// Seven-day total assumed for a pair with no history in the window.
pub const DEFAULT_EMPTY_FORECAST: f64 = 20.0;

/// How a forecast figure was produced.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastBasis {
    Regression,
    MeanHeuristic,
    EmptyDefault,
}

/// Seven-day demand forecast for one (store, product) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub store_id: StoreId,
    pub product_id: ProductId,
    /// Predicted units over the next seven days.
    pub predicted_units: f64,
    /// Per-day predictions summing to `predicted_units`.
    pub daily: [f64; HORIZON_DAYS],
    pub risk: RiskLabel,
    pub basis: ForecastBasis,
    /// Observations the figure was derived from.
    pub observations: usize,
    /// Stock after the most recent observed sale, if any.
    pub latest_stock: Option<u32>,
    pub computed_at: DateTime<Utc>,
}

impl Forecast {
    pub fn pair(&self) -> (StoreId, ProductId) {
        (self.store_id, self.product_id)
    }
}

/// Output of one retrain run.
#[derive(Debug, Clone, Default)]
pub struct ForecastBatch {
    /// One forecast per group, stalest group first.
    pub forecasts: Vec<Forecast>,
    /// Groups whose model failed and fell back to the mean heuristic.
    pub fallbacks: Vec<((StoreId, ProductId), AiError)>,
}

/// Retrains per-pair demand forecasts over a window of ledger history.
///
/// Model:
/// - Group sales by (store, product).
/// - Fewer than 7 observations: `mean(units) × 7` (20 for an empty group).
/// - Otherwise regress units on day-of-week, stock, discount, holiday and
///   activity; predict the next 7 days from the latest observation's features
///   (cycling day-of-week) and sum. A failed fit falls back to the mean.
/// - Risk is RESTOCK_LIKELY when the total exceeds 40 units.
#[derive(Debug, Clone)]
pub struct DemandForecastJob<M = RidgeRegressor> {
    history: Vec<SalesEvent>,
    /// Pairs to forecast even when absent from `history`.
    tracked: Vec<(StoreId, ProductId)>,
    computed_at: DateTime<Utc>,
    regressor: M,
}

impl DemandForecastJob<RidgeRegressor> {
    pub fn new(history: Vec<SalesEvent>, computed_at: DateTime<Utc>) -> Self {
        Self {
            history,
            tracked: Vec::new(),
            computed_at,
            regressor: RidgeRegressor::default(),
        }
    }
}

impl<M: Regressor> DemandForecastJob<M> {
    pub fn with_regressor<N: Regressor>(self, regressor: N) -> DemandForecastJob<N> {
        DemandForecastJob {
            history: self.history,
            tracked: self.tracked,
            computed_at: self.computed_at,
            regressor,
        }
    }

    pub fn with_tracked_pairs(
        mut self,
        pairs: impl IntoIterator<Item = (StoreId, ProductId)>,
    ) -> Self {
        self.tracked = pairs.into_iter().collect();
        self
    }

    fn forecast_group(
        &self,
        pair: (StoreId, ProductId),
        sales: &[&SalesEvent],
    ) -> (Forecast, Option<AiError>) {
        if sales.len() < MIN_REGRESSION_OBSERVATIONS {
            return (self.heuristic(pair, sales), None);
        }

        match self.regress(sales) {
            Ok(daily) => {
                let forecast = self.build(pair, sales, daily, ForecastBasis::Regression);
                (forecast, None)
            }
            Err(e) => (self.heuristic(pair, sales), Some(e)),
        }
    }

    fn regress(&self, sales: &[&SalesEvent]) -> Result<[f64; HORIZON_DAYS], AiError> {
        let rows: Vec<FeatureRow> = sales.iter().map(|s| FeatureRow::from_sale(s)).collect();
        let targets: Vec<f64> = sales.iter().map(|s| s.units_sold as f64).collect();
        let model = self.regressor.fit(&rows, &targets)?;

        let latest = sales
            .last()
            .ok_or_else(|| AiError::model_fit("empty group"))?;
        let base = FeatureRow::from_sale(latest);
        let base_day = latest.day_of_week();

        let mut daily = [0.0; HORIZON_DAYS];
        for (offset, slot) in daily.iter_mut().enumerate() {
            let day = base_day + offset as u32 + 1;
            let predicted = model.predict(&base.on_day(day));
            if !predicted.is_finite() {
                return Err(AiError::model_fit("non-finite prediction"));
            }
            *slot = predicted.max(0.0);
        }
        Ok(daily)
    }

    fn heuristic(&self, pair: (StoreId, ProductId), sales: &[&SalesEvent]) -> Forecast {
        if sales.is_empty() {
            let per_day = DEFAULT_EMPTY_FORECAST / HORIZON_DAYS as f64;
            return self.build(pair, sales, [per_day; HORIZON_DAYS], ForecastBasis::EmptyDefault);
        }
        let mean = sales.iter().map(|s| s.units_sold as f64).sum::<f64>() / sales.len() as f64;
        self.build(pair, sales, [mean; HORIZON_DAYS], ForecastBasis::MeanHeuristic)
    }

    fn build(
        &self,
        pair: (StoreId, ProductId),
        sales: &[&SalesEvent],
        daily: [f64; HORIZON_DAYS],
        basis: ForecastBasis,
    ) -> Forecast {
        let predicted_units = match basis {
            // Keep the documented figures exact rather than a float re-sum.
            ForecastBasis::EmptyDefault => DEFAULT_EMPTY_FORECAST,
            ForecastBasis::MeanHeuristic => daily[0] * HORIZON_DAYS as f64,
            ForecastBasis::Regression => daily.iter().sum(),
        };

        Forecast {
            store_id: pair.0,
            product_id: pair.1,
            predicted_units,
            daily,
            risk: RiskLabel::from_forecast(predicted_units),
            basis,
            observations: sales.len(),
            latest_stock: sales.last().map(|s| s.stock),
            computed_at: self.computed_at,
        }
    }
}

impl<M: Regressor> AiJob for DemandForecastJob<M> {
    type Input = Vec<SalesEvent>;
    type Output = ForecastBatch;

    fn input(&self) -> &Self::Input {
        &self.history
    }

    /// Rejects a history that repeats a ledger sequence; each sale is counted once.
    fn run(&self) -> Result<ForecastBatch, AiError> {
        let mut seen = HashSet::with_capacity(self.history.len());
        if let Some(dup) = self.history.iter().find(|s| !seen.insert(s.sequence)) {
            return Err(AiError::invalid_input(format!(
                "sale sequence {} appears more than once in the history",
                dup.sequence
            )));
        }

        let mut groups: HashMap<(StoreId, ProductId), Vec<&SalesEvent>> = HashMap::new();
        for sale in &self.history {
            groups.entry(sale.pair()).or_default().push(sale);
        }
        for sales in groups.values_mut() {
            sales.sort_by_key(|s| s.order_key());
        }

        // Stalest first: tracked pairs without history, then by latest sale.
        let mut order: Vec<(StoreId, ProductId)> =
            Vec::with_capacity(groups.len() + self.tracked.len());
        for pair in &self.tracked {
            if !groups.contains_key(pair) && !order.contains(pair) {
                order.push(*pair);
            }
        }
        let mut active: Vec<(StoreId, ProductId)> = groups.keys().copied().collect();
        active.sort_by_key(|pair| groups[pair].last().map(|s| s.order_key()));
        order.extend(active);

        let mut batch = ForecastBatch::default();
        for pair in order {
            let sales = groups.get(&pair).map(Vec::as_slice).unwrap_or(&[]);
            let (forecast, fallback) = self.forecast_group(pair, sales);
            if let Some(e) = fallback {
                batch.fallbacks.push((pair, e));
            }
            batch.forecasts.push(forecast);
        }

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::{FeatureRow, LinearModel};
    use chrono::{Duration, TimeZone};
    use shelfwatch_core::CityId;
    use shelfwatch_sales::NewSale;

    struct FailingRegressor;

    impl Regressor for FailingRegressor {
        fn fit(&self, _rows: &[FeatureRow], _targets: &[f64]) -> Result<LinearModel, AiError> {
            Err(AiError::model_fit("forced failure"))
        }
    }

    /// Predicts a fixed number of units per day regardless of features.
    struct ConstantRegressor(f64);

    impl Regressor for ConstantRegressor {
        fn fit(&self, _rows: &[FeatureRow], _targets: &[f64]) -> Result<LinearModel, AiError> {
            Ok(LinearModel {
                intercept: self.0,
                weights: [0.0; 5],
            })
        }
    }

    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()
    }

    fn history(pair: (StoreId, ProductId), units: &[u32], start_seq: u64) -> Vec<SalesEvent> {
        units
            .iter()
            .enumerate()
            .map(|(i, &u)| {
                NewSale::new(
                    monday() + Duration::days(i as i64),
                    pair.0,
                    pair.1,
                    CityId::new(),
                    u,
                    20 + i as u32,
                )
                .into_event(start_seq + i as u64)
            })
            .collect()
    }

    fn pair() -> (StoreId, ProductId) {
        (StoreId::new(), ProductId::new())
    }

    #[test]
    fn three_observations_use_mean_times_seven() {
        let p = pair();
        let job = DemandForecastJob::new(history(p, &[4, 5, 6], 1), monday());

        let batch = job.run().unwrap();
        assert_eq!(batch.forecasts.len(), 1);

        let f = &batch.forecasts[0];
        assert_eq!(f.basis, ForecastBasis::MeanHeuristic);
        assert_eq!(f.predicted_units, 35.0);
        assert_eq!(f.risk, RiskLabel::Ok);
        assert_eq!(f.observations, 3);
        assert_eq!(f.latest_stock, Some(22));
    }

    #[test]
    fn mean_above_threshold_is_restock_likely() {
        let p = pair();
        let batch = DemandForecastJob::new(history(p, &[6, 7, 8], 1), monday()).run().unwrap();
        assert_eq!(batch.forecasts[0].predicted_units, 49.0);
        assert_eq!(batch.forecasts[0].risk, RiskLabel::RestockLikely);
    }

    #[test]
    fn failing_fit_falls_back_to_heuristic_without_error() {
        let p = pair();
        let units = [2, 4, 6, 8, 10, 12, 14, 16];
        let job = DemandForecastJob::new(history(p, &units, 1), monday())
            .with_regressor(FailingRegressor);

        let batch = job.run().unwrap();
        let f = &batch.forecasts[0];
        assert_eq!(f.basis, ForecastBasis::MeanHeuristic);
        assert_eq!(f.predicted_units, 9.0 * 7.0);
        assert_eq!(f.risk, RiskLabel::RestockLikely);

        assert_eq!(batch.fallbacks.len(), 1);
        assert_eq!(batch.fallbacks[0].0, p);
    }

    #[test]
    fn one_failing_group_does_not_affect_others() {
        let big = pair();
        let small = pair();
        let mut events = history(big, &[3; 10], 1);
        events.extend(history(small, &[1, 2], 100));

        let batch = DemandForecastJob::new(events, monday())
            .with_regressor(FailingRegressor)
            .run()
            .unwrap();

        assert_eq!(batch.forecasts.len(), 2);
        assert_eq!(batch.fallbacks.len(), 1);
        let small_fc = batch.forecasts.iter().find(|f| f.pair() == small).unwrap();
        assert_eq!(small_fc.predicted_units, 10.5);
    }

    #[test]
    fn regression_sums_seven_daily_predictions() {
        let p = pair();
        let job = DemandForecastJob::new(history(p, &[1; 9], 1), monday())
            .with_regressor(ConstantRegressor(6.5));

        let f = job.run().unwrap().forecasts.remove(0);
        assert_eq!(f.basis, ForecastBasis::Regression);
        assert_eq!(f.daily, [6.5; HORIZON_DAYS]);
        assert!((f.predicted_units - 45.5).abs() < 1e-9);
        assert_eq!(f.risk, RiskLabel::RestockLikely);
    }

    #[test]
    fn negative_daily_predictions_are_clamped() {
        let p = pair();
        let job = DemandForecastJob::new(history(p, &[1; 8], 1), monday())
            .with_regressor(ConstantRegressor(-3.0));

        let f = job.run().unwrap().forecasts.remove(0);
        assert_eq!(f.predicted_units, 0.0);
        assert_eq!(f.risk, RiskLabel::Ok);
    }

    #[test]
    fn ridge_forecast_follows_weekly_pattern() {
        // Sales depend only on day of week: weekends sell more.
        let p = pair();
        let units: Vec<u32> = (0..28).map(|d| if d % 7 >= 5 { 12 } else { 4 }).collect();
        let job = DemandForecastJob::new(history(p, &units, 1), monday());

        let f = job.run().unwrap().forecasts.remove(0);
        assert_eq!(f.basis, ForecastBasis::Regression);
        assert!(f.daily.iter().all(|d| *d >= 0.0));
        assert!((f.predicted_units - f.daily.iter().sum::<f64>()).abs() < 1e-9);
        assert_eq!(f.observations, 28);
    }

    #[test]
    fn tracked_pairs_without_history_get_empty_default() {
        let tracked = [pair(), pair()];
        let batch = DemandForecastJob::new(Vec::new(), monday())
            .with_tracked_pairs(tracked)
            .run()
            .unwrap();

        assert_eq!(batch.forecasts.len(), 2);
        for f in &batch.forecasts {
            assert_eq!(f.basis, ForecastBasis::EmptyDefault);
            assert_eq!(f.predicted_units, DEFAULT_EMPTY_FORECAST);
            assert_eq!(f.risk, RiskLabel::Ok);
            assert_eq!(f.observations, 0);
            assert_eq!(f.latest_stock, None);
        }
    }

    #[test]
    fn groups_are_ordered_stalest_first() {
        let early = pair();
        let late = pair();
        let idle = pair();

        let mut events = history(late, &[2], 10);
        events[0].occurred_at = monday() + Duration::days(3);
        events.extend(history(early, &[2], 1));

        let batch = DemandForecastJob::new(events, monday())
            .with_tracked_pairs([idle, late])
            .run()
            .unwrap();

        let order: Vec<_> = batch.forecasts.iter().map(Forecast::pair).collect();
        assert_eq!(order, vec![idle, early, late]);
    }

    #[test]
    fn repeated_sale_sequence_is_rejected() {
        let (a, b) = (pair(), pair());
        let mut events = history(a, &[3, 4], 1);
        events.extend(history(b, &[5], 2));

        let err = DemandForecastJob::new(events, monday()).run().unwrap_err();
        assert!(matches!(err, AiError::InvalidInput(ref msg) if msg.contains("sequence 2")));
    }

    proptest::proptest! {
        #[test]
        fn forecasts_are_non_negative_and_sum_their_days(
            units in proptest::collection::vec(0u32..40, 1..30),
        ) {
            let p = pair();
            let batch = DemandForecastJob::new(history(p, &units, 1), monday()).run().unwrap();
            let f = &batch.forecasts[0];

            proptest::prop_assert!(f.predicted_units >= 0.0);
            proptest::prop_assert!(f.daily.iter().all(|d| *d >= 0.0));
            proptest::prop_assert!((f.predicted_units - f.daily.iter().sum::<f64>()).abs() < 1e-6);
            proptest::prop_assert_eq!(f.risk, RiskLabel::from_forecast(f.predicted_units));
            proptest::prop_assert_eq!(f.observations, units.len());
        }
    }
}
