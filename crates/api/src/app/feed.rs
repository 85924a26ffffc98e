use std::collections::HashMap;
use std::sync::Arc;

use shelfwatch_ai::Forecast;
use shelfwatch_catalog::Catalog;
use shelfwatch_core::CityId;
use shelfwatch_infra::{AlertCounts, AlertStore, FeedEntry, FeedKind, Scope};
use shelfwatch_inventory::StockLabel;

use super::dto::{
    BranchView, CityView, DashboardSummary, ProductRestockCount, ReorderSuggestion,
    StoreRestockCount,
};

/// Default `limit` for [`AlertFeed::get_alerts`].
pub const DEFAULT_ALERT_LIMIT: usize = 200;

/// Default `limit` for [`AlertFeed::get_forecasts`].
pub const DEFAULT_FORECAST_LIMIT: usize = 10;

const TOP_RESTOCK_ENTRIES: usize = 10;
const MAX_REORDER_SUGGESTIONS: usize = 20;

/// Read-only view API over the live alert store.
///
/// Every call takes the caller's scope explicitly; nothing is read from
/// ambient session state.
#[derive(Debug, Clone)]
pub struct AlertFeed {
    store: Arc<AlertStore>,
    catalog: Arc<Catalog>,
}

impl AlertFeed {
    pub fn new(store: Arc<AlertStore>, catalog: Arc<Catalog>) -> Self {
        Self { store, catalog }
    }

    /// Newest entries of `kind` visible under `scope`, newest first.
    ///
    /// `limit` defaults to 200. `FeedKind::Forecasts` yields forecast entries.
    pub fn get_alerts(&self, scope: Scope, kind: FeedKind, limit: Option<usize>) -> Vec<FeedEntry> {
        self.store
            .read(scope, kind, limit.unwrap_or(DEFAULT_ALERT_LIMIT))
    }

    /// Most recently computed forecasts across all stores (default 10).
    pub fn get_forecasts(&self, limit: Option<usize>) -> Vec<Arc<Forecast>> {
        self.get_forecasts_scoped(Scope::All, limit)
    }

    pub fn get_forecasts_scoped(&self, scope: Scope, limit: Option<usize>) -> Vec<Arc<Forecast>> {
        self.store
            .forecasts(scope, limit.unwrap_or(DEFAULT_FORECAST_LIMIT))
    }

    /// Forecasts with the highest predicted demand first.
    pub fn riskiest_forecasts(&self, scope: Scope, limit: usize) -> Vec<Arc<Forecast>> {
        let mut forecasts = self.store.forecasts(scope, usize::MAX);
        forecasts.sort_by(|a, b| b.predicted_units.total_cmp(&a.predicted_units));
        forecasts.truncate(limit);
        forecasts
    }

    pub fn get_counts(&self, scope: Scope) -> AlertCounts {
        self.store.counts(scope)
    }

    pub fn cities(&self) -> Vec<CityView> {
        self.catalog.cities().into_iter().map(CityView::from).collect()
    }

    /// Branches of a city sorted by name; empty for unknown cities.
    pub fn branches_for_city(&self, city_id: CityId) -> Vec<BranchView> {
        self.catalog
            .stores_in_city(city_id)
            .into_iter()
            .map(BranchView::from)
            .collect()
    }

    /// Dashboard summary over the visible alert window and forecast cache.
    pub fn summary(&self, scope: Scope) -> DashboardSummary {
        let restock = self
            .store
            .alerts(scope, Some(StockLabel::RestockNeeded), usize::MAX);

        let mut by_product: HashMap<&str, usize> = HashMap::new();
        let mut by_store: HashMap<(&str, &str), usize> = HashMap::new();
        for alert in &restock {
            *by_product.entry(alert.product_name.as_str()).or_default() += 1;
            *by_store
                .entry((alert.city_name.as_str(), alert.store_name.as_str()))
                .or_default() += 1;
        }

        let top_restock_products = top_n(by_product, TOP_RESTOCK_ENTRIES)
            .into_iter()
            .map(|(product_name, count)| ProductRestockCount {
                product_name: product_name.to_string(),
                count,
            })
            .collect();

        let top_restock_stores = top_n(by_store, TOP_RESTOCK_ENTRIES)
            .into_iter()
            .map(|((city_name, store_name), count)| StoreRestockCount {
                city_name: city_name.to_string(),
                store_name: store_name.to_string(),
                count,
            })
            .collect();

        DashboardSummary {
            counts: self.store.counts(scope),
            top_restock_products,
            top_restock_stores,
            reorder_suggestions: self.reorder_suggestions(scope),
        }
    }

    fn reorder_suggestions(&self, scope: Scope) -> Vec<ReorderSuggestion> {
        let mut suggestions: Vec<ReorderSuggestion> = self
            .store
            .forecasts(scope, usize::MAX)
            .iter()
            .filter_map(|f| {
                let stock = f.latest_stock?;
                let shortfall = f.predicted_units - f64::from(stock);
                if shortfall <= 0.0 {
                    return None;
                }
                let store = self.catalog.store(f.store_id)?;
                let product = self.catalog.product(f.product_id)?;
                let city = self.catalog.city(store.city_id)?;
                Some(ReorderSuggestion {
                    store_id: f.store_id,
                    product_id: f.product_id,
                    city_name: city.name.clone(),
                    store_name: store.name.clone(),
                    product_name: product.name.clone(),
                    latest_stock: stock,
                    predicted_units: f.predicted_units,
                    reorder_qty: shortfall.ceil() as u32,
                })
            })
            .collect();

        suggestions.sort_by(|a, b| {
            b.reorder_qty
                .cmp(&a.reorder_qty)
                .then_with(|| a.store_name.cmp(&b.store_name))
                .then_with(|| a.product_name.cmp(&b.product_name))
        });
        suggestions.truncate(MAX_REORDER_SUGGESTIONS);
        suggestions
    }
}

/// Largest counts first; ties broken by key so output is stable.
fn top_n<K: Ord>(counts: HashMap<K, usize>, n: usize) -> Vec<(K, usize)> {
    let mut entries: Vec<(K, usize)> = counts.into_iter().collect();
    entries.sort_by(|(ka, ca), (kb, cb)| cb.cmp(ca).then_with(|| ka.cmp(kb)));
    entries.truncate(n);
    entries
}
