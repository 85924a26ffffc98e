use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use serde::Serialize;

use shelfwatch_ai::Forecast;
use shelfwatch_core::{ProductId, StoreId};
use shelfwatch_inventory::StockLabel;
use shelfwatch_sales::Alert;

use super::scope::{FeedKind, Scope};

/// Default alert ring capacity.
pub const MAX_ALERTS: usize = 10_000;

/// Default forecast cache capacity.
pub const MAX_FORECASTS: usize = 100;

/// One entry returned by [`AlertStore::read`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEntry {
    Alert(Arc<Alert>),
    Forecast(Arc<Forecast>),
}

/// Alert label counts over the visible window of one scope.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertCounts {
    pub restock_needed: usize,
    pub overstock: usize,
    pub ok: usize,
    pub total: usize,
}

/// Bounded in-memory read model for live alerts and forecasts.
///
/// - Alerts live in a FIFO ring: once `alert_capacity` is reached every
///   append evicts the oldest-inserted alert (insertion order, not timestamp).
/// - Forecasts live in an insertion-ordered map keyed by (store, product):
///   a new forecast for a pair replaces the old one and moves to the back;
///   the least-recently-computed pair is evicted past `forecast_capacity`.
///
/// Entries are immutable `Arc`s. A read clones the matching `Arc`s under a
/// short read lock and returns a snapshot; writers never hold a lock while
/// building an entry, so readers only ever see complete entries.
#[derive(Debug)]
pub struct AlertStore {
    alerts: RwLock<VecDeque<Arc<Alert>>>,
    forecasts: RwLock<IndexMap<(StoreId, ProductId), Arc<Forecast>>>,
    alert_capacity: usize,
    forecast_capacity: usize,
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new(MAX_ALERTS, MAX_FORECASTS)
    }
}

impl AlertStore {
    /// Capacities are clamped to at least one entry.
    pub fn new(alert_capacity: usize, forecast_capacity: usize) -> Self {
        let alert_capacity = alert_capacity.max(1);
        let forecast_capacity = forecast_capacity.max(1);
        Self {
            alerts: RwLock::new(VecDeque::with_capacity(alert_capacity.min(MAX_ALERTS))),
            forecasts: RwLock::new(IndexMap::with_capacity(forecast_capacity.min(MAX_FORECASTS))),
            alert_capacity,
            forecast_capacity,
        }
    }

    pub fn alert_capacity(&self) -> usize {
        self.alert_capacity
    }

    pub fn forecast_capacity(&self) -> usize {
        self.forecast_capacity
    }

    /// Publish a fully built alert; evicts the oldest one when full.
    pub fn append_alert(&self, alert: Alert) -> Arc<Alert> {
        let alert = Arc::new(alert);
        let mut ring = self.alerts.write().unwrap_or_else(PoisonError::into_inner);

        if ring.len() == self.alert_capacity {
            ring.pop_front();
        }
        ring.push_back(Arc::clone(&alert));

        assert!(
            ring.len() <= self.alert_capacity,
            "alert ring exceeded capacity ({} > {})",
            ring.len(),
            self.alert_capacity
        );
        alert
    }

    /// Publish one forecast, superseding any previous forecast for its pair.
    pub fn append_forecast(&self, forecast: Forecast) -> Arc<Forecast> {
        let forecast = Arc::new(forecast);
        let mut cache = self.forecasts.write().unwrap_or_else(PoisonError::into_inner);
        self.insert_forecast(&mut cache, Arc::clone(&forecast));
        forecast
    }

    /// Publish a retrain batch in one step; readers see all of it or none of it.
    pub fn replace_forecasts(&self, forecasts: impl IntoIterator<Item = Forecast>) -> usize {
        let batch: Vec<Arc<Forecast>> = forecasts.into_iter().map(Arc::new).collect();
        let written = batch.len();

        let mut cache = self.forecasts.write().unwrap_or_else(PoisonError::into_inner);
        for forecast in batch {
            self.insert_forecast(&mut cache, forecast);
        }
        written
    }

    fn insert_forecast(
        &self,
        cache: &mut IndexMap<(StoreId, ProductId), Arc<Forecast>>,
        forecast: Arc<Forecast>,
    ) {
        let pair = forecast.pair();
        // Superseded, not merged: the pair moves to the most-recent end.
        cache.shift_remove(&pair);
        cache.insert(pair, forecast);

        while cache.len() > self.forecast_capacity {
            cache.shift_remove_index(0);
        }

        assert!(
            cache.len() <= self.forecast_capacity,
            "forecast cache exceeded capacity ({} > {})",
            cache.len(),
            self.forecast_capacity
        );
    }

    /// Most recent `limit` entries matching `scope` and `kind`, newest first.
    pub fn read(&self, scope: Scope, kind: FeedKind, limit: usize) -> Vec<FeedEntry> {
        match kind {
            FeedKind::Forecasts => self
                .forecasts(scope, limit)
                .into_iter()
                .map(FeedEntry::Forecast)
                .collect(),
            _ => self
                .alerts(scope, kind.label(), limit)
                .into_iter()
                .map(FeedEntry::Alert)
                .collect(),
        }
    }

    /// Most recent `limit` alerts visible under `scope`, optionally with one label.
    pub fn alerts(&self, scope: Scope, label: Option<StockLabel>, limit: usize) -> Vec<Arc<Alert>> {
        let ring = self.alerts.read().unwrap_or_else(PoisonError::into_inner);
        scope
            .filter(ring.iter().rev())
            .filter(|a| label.is_none_or(|l| a.label == l))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Most recently computed `limit` forecasts visible under `scope`.
    pub fn forecasts(&self, scope: Scope, limit: usize) -> Vec<Arc<Forecast>> {
        let cache = self.forecasts.read().unwrap_or_else(PoisonError::into_inner);
        scope
            .filter(cache.values().rev())
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn forecast_for(&self, store_id: StoreId, product_id: ProductId) -> Option<Arc<Forecast>> {
        let cache = self.forecasts.read().unwrap_or_else(PoisonError::into_inner);
        cache.get(&(store_id, product_id)).cloned()
    }

    /// Pairs currently cached, least-recently-computed first.
    pub fn forecast_pairs(&self) -> Vec<(StoreId, ProductId)> {
        let cache = self.forecasts.read().unwrap_or_else(PoisonError::into_inner);
        cache.keys().copied().collect()
    }

    pub fn counts(&self, scope: Scope) -> AlertCounts {
        let ring = self.alerts.read().unwrap_or_else(PoisonError::into_inner);
        let mut counts = AlertCounts::default();
        for alert in scope.filter(ring.iter()) {
            match alert.label {
                StockLabel::RestockNeeded => counts.restock_needed += 1,
                StockLabel::Overstock => counts.overstock += 1,
                StockLabel::Ok => counts.ok += 1,
            }
            counts.total += 1;
        }
        counts
    }

    pub fn alert_len(&self) -> usize {
        self.alerts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn forecast_len(&self) -> usize {
        self.forecasts.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use chrono::Utc;
    use proptest::prelude::*;
    use shelfwatch_ai::ForecastBasis;
    use shelfwatch_core::CityId;
    use shelfwatch_inventory::RiskLabel;
    use shelfwatch_sales::{AlertContext, NewSale};

    fn test_alert(store_id: StoreId, sequence: u64, label: StockLabel) -> Alert {
        let sale = NewSale::new(Utc::now(), store_id, ProductId::new(), CityId::new(), 3, 7)
            .into_event(sequence);
        Alert::from_sale(
            &sale,
            label,
            None,
            AlertContext {
                store_name: "Store".to_string(),
                product_name: "Product".to_string(),
                city_name: "City".to_string(),
            },
        )
    }

    fn test_forecast(store_id: StoreId, product_id: ProductId, units: f64) -> Forecast {
        Forecast {
            store_id,
            product_id,
            predicted_units: units,
            daily: [units / 7.0; 7],
            risk: RiskLabel::from_forecast(units),
            basis: ForecastBasis::MeanHeuristic,
            observations: 3,
            latest_stock: Some(5),
            computed_at: Utc::now(),
        }
    }

    fn sequences(alerts: &[Arc<Alert>]) -> Vec<u64> {
        alerts.iter().map(|a| a.sale_sequence).collect()
    }

    #[test]
    fn feed_entries_serialize_with_type_tag() {
        let store = AlertStore::default();
        let s = StoreId::new();
        store.append_alert(test_alert(s, 1, StockLabel::Overstock));
        store.append_forecast(test_forecast(s, ProductId::new(), 12.0));

        let alert = serde_json::to_value(&store.read(Scope::All, FeedKind::Alerts, 1)[0]).unwrap();
        assert_eq!(alert["type"], "alert");
        assert_eq!(alert["label"], "OVERSTOCK");

        let forecasts = store.read(Scope::All, FeedKind::Forecasts, 1);
        let forecast = serde_json::to_value(&forecasts[0]).unwrap();
        assert_eq!(forecast["type"], "forecast");
        assert_eq!(forecast["basis"], "mean_heuristic");
    }

    #[test]
    fn ring_evicts_oldest_inserted_first() {
        let store = AlertStore::new(5, 5);
        let s = StoreId::new();

        // Insertion order is what counts, even if timestamps were older.
        for seq in 1..=8 {
            store.append_alert(test_alert(s, seq, StockLabel::Ok));
        }

        assert_eq!(store.alert_len(), 5);
        let all = store.alerts(Scope::All, None, 100);
        assert_eq!(sequences(&all), vec![8, 7, 6, 5, 4]);
    }

    #[test]
    fn eviction_follows_insertion_order_not_timestamp() {
        let store = AlertStore::new(2, 1);
        let s = StoreId::new();

        let mut late = test_alert(s, 1, StockLabel::Ok);
        late.timestamp = Utc::now() + chrono::Duration::hours(1);
        store.append_alert(late);
        store.append_alert(test_alert(s, 2, StockLabel::Ok));
        store.append_alert(test_alert(s, 3, StockLabel::Ok));

        assert_eq!(sequences(&store.alerts(Scope::All, None, 10)), vec![3, 2]);
    }

    #[test]
    fn read_filters_by_label_newest_first_with_limit() {
        let store = AlertStore::default();
        let s = StoreId::new();
        let labels = [
            StockLabel::Overstock,
            StockLabel::Ok,
            StockLabel::Overstock,
            StockLabel::RestockNeeded,
            StockLabel::Overstock,
        ];
        for (i, label) in labels.into_iter().enumerate() {
            store.append_alert(test_alert(s, i as u64 + 1, label));
        }

        let entries = store.read(Scope::All, FeedKind::Overstock, 2);
        assert_eq!(entries.len(), 2);
        let seqs: Vec<u64> = entries
            .iter()
            .map(|e| match e {
                FeedEntry::Alert(a) => {
                    assert_eq!(a.label, StockLabel::Overstock);
                    a.sale_sequence
                }
                FeedEntry::Forecast(_) => panic!("unexpected forecast"),
            })
            .collect();
        assert_eq!(seqs, vec![5, 3]);

        assert_eq!(store.read(Scope::All, FeedKind::Understock, 10).len(), 1);
        assert_eq!(store.read(Scope::All, FeedKind::Alerts, 10).len(), 5);
    }

    #[test]
    fn read_filters_by_store_scope() {
        let store = AlertStore::default();
        let (a, b) = (StoreId::new(), StoreId::new());
        store.append_alert(test_alert(a, 1, StockLabel::Ok));
        store.append_alert(test_alert(b, 2, StockLabel::Ok));
        store.append_alert(test_alert(a, 3, StockLabel::Overstock));

        let only_a = store.alerts(Scope::Store(a), None, 10);
        assert_eq!(sequences(&only_a), vec![3, 1]);
        assert!(only_a.iter().all(|al| al.store_id == a));

        assert!(store.read(Scope::Store(StoreId::new()), FeedKind::Alerts, 10).is_empty());
    }

    #[test]
    fn counts_cover_visible_window_for_scope() {
        let store = AlertStore::new(3, 1);
        let (a, b) = (StoreId::new(), StoreId::new());
        store.append_alert(test_alert(a, 1, StockLabel::Overstock)); // evicted
        store.append_alert(test_alert(a, 2, StockLabel::RestockNeeded));
        store.append_alert(test_alert(b, 3, StockLabel::Ok));
        store.append_alert(test_alert(a, 4, StockLabel::RestockNeeded));

        assert_eq!(
            store.counts(Scope::All),
            AlertCounts { restock_needed: 2, overstock: 0, ok: 1, total: 3 }
        );
        assert_eq!(store.counts(Scope::Store(a)).total, 2);
        assert_eq!(store.counts(Scope::Store(StoreId::new())), AlertCounts::default());
    }

    #[test]
    fn forecast_for_same_pair_is_superseded_not_merged() {
        let store = AlertStore::default();
        let (s, p) = (StoreId::new(), ProductId::new());

        store.append_forecast(test_forecast(s, p, 10.0));
        store.append_forecast(test_forecast(s, p, 50.0));

        assert_eq!(store.forecast_len(), 1);
        let f = store.forecast_for(s, p).unwrap();
        assert_eq!(f.predicted_units, 50.0);
        assert_eq!(f.risk, RiskLabel::RestockLikely);
    }

    #[test]
    fn forecast_cache_evicts_least_recently_computed() {
        let store = AlertStore::new(10, 2);
        let s = StoreId::new();
        let (p1, p2, p3) = (ProductId::new(), ProductId::new(), ProductId::new());

        store.append_forecast(test_forecast(s, p1, 1.0));
        store.append_forecast(test_forecast(s, p2, 2.0));
        // Recomputing p1 makes p2 the stalest entry.
        store.append_forecast(test_forecast(s, p1, 3.0));
        store.append_forecast(test_forecast(s, p3, 4.0));

        assert_eq!(store.forecast_pairs(), vec![(s, p1), (s, p3)]);
        assert!(store.forecast_for(s, p2).is_none());

        let newest_first: Vec<f64> = store
            .forecasts(Scope::All, 10)
            .iter()
            .map(|f| f.predicted_units)
            .collect();
        assert_eq!(newest_first, vec![4.0, 3.0]);
    }

    #[test]
    fn replace_forecasts_applies_whole_batch() {
        let store = AlertStore::new(10, 3);
        let s = StoreId::new();
        let batch: Vec<Forecast> = (0..5)
            .map(|i| test_forecast(s, ProductId::new(), i as f64))
            .collect();

        assert_eq!(store.replace_forecasts(batch), 5);
        assert_eq!(store.forecast_len(), 3);

        let kept: Vec<f64> = store
            .forecasts(Scope::All, 10)
            .iter()
            .map(|f| f.predicted_units)
            .collect();
        assert_eq!(kept, vec![4.0, 3.0, 2.0]);
    }

    #[test]
    fn forecasts_respect_scope() {
        let store = AlertStore::default();
        let (a, b) = (StoreId::new(), StoreId::new());
        store.append_forecast(test_forecast(a, ProductId::new(), 1.0));
        store.append_forecast(test_forecast(b, ProductId::new(), 2.0));

        let entries = store.read(Scope::Store(b), FeedKind::Forecasts, 10);
        assert_eq!(entries.len(), 1);
        assert!(matches!(&entries[0], FeedEntry::Forecast(f) if f.store_id == b));
    }

    #[test]
    fn concurrent_readers_and_writer_never_exceed_capacity() {
        let store = Arc::new(AlertStore::new(64, 8));
        let stores: Vec<StoreId> = (0..4).map(|_| StoreId::new()).collect();

        let writer = {
            let store = Arc::clone(&store);
            let stores = stores.clone();
            thread::spawn(move || {
                for seq in 1..=2_000u64 {
                    let s = stores[(seq % 4) as usize];
                    store.append_alert(test_alert(s, seq, StockLabel::RestockNeeded));
                    if seq % 10 == 0 {
                        store.append_forecast(test_forecast(s, ProductId::new(), 1.0));
                    }
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                let scope = Scope::Store(stores[i]);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let all = store.alerts(Scope::All, None, usize::MAX);
                        assert!(all.len() <= 64);
                        for alert in &all {
                            // Fully built entries only.
                            assert!(alert.sale_sequence > 0);
                            assert_eq!(alert.units_sold, 3);
                            assert_eq!(alert.store_name, "Store");
                        }
                        // Newest first within a snapshot.
                        assert!(all.windows(2).all(|w| w[0].sale_sequence > w[1].sale_sequence));

                        let scoped = store.read(scope, FeedKind::Understock, 16);
                        assert!(scoped.len() <= 16);
                        assert!(store.forecasts(Scope::All, usize::MAX).len() <= 8);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }

        assert_eq!(store.alert_len(), 64);
        assert_eq!(store.forecast_len(), 8);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: after appending capacity + k alerts exactly the newest
        /// `capacity` remain, in insertion order.
        #[test]
        fn ring_keeps_newest_capacity(capacity in 1usize..40, extra in 0usize..60) {
            let store = AlertStore::new(capacity, 1);
            let s = StoreId::new();
            let total = capacity + extra;
            for seq in 1..=total as u64 {
                store.append_alert(test_alert(s, seq, StockLabel::Ok));
            }

            let kept = store.alerts(Scope::All, None, usize::MAX);
            prop_assert_eq!(kept.len(), capacity);
            let expected: Vec<u64> = ((extra as u64 + 1)..=total as u64).rev().collect();
            prop_assert_eq!(sequences(&kept), expected);
        }
    }
}
