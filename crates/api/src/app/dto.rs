use serde::Serialize;

use shelfwatch_catalog::{City, Store};
use shelfwatch_core::{CityId, ProductId, StoreId};
use shelfwatch_infra::AlertCounts;

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityView {
    pub city_id: CityId,
    pub city_name: String,
}

impl From<&City> for CityView {
    fn from(city: &City) -> Self {
        Self {
            city_id: city.id,
            city_name: city.name.clone(),
        }
    }
}

/// A branch as listed in the manager's city/branch picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchView {
    pub store_id: StoreId,
    pub branch_name: String,
    pub company_name: Option<String>,
}

impl From<&Store> for BranchView {
    fn from(store: &Store) -> Self {
        Self {
            store_id: store.id,
            branch_name: store.name.clone(),
            company_name: store.company.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRestockCount {
    pub product_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreRestockCount {
    pub city_name: String,
    pub store_name: String,
    pub count: usize,
}

/// A pair whose forecast demand exceeds its latest stock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReorderSuggestion {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub city_name: String,
    pub store_name: String,
    pub product_name: String,
    pub latest_stock: u32,
    pub predicted_units: f64,
    /// `ceil(predicted_units - latest_stock)`, always positive.
    pub reorder_qty: u32,
}

/// Dashboard summary for one scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub counts: AlertCounts,
    pub top_restock_products: Vec<ProductRestockCount>,
    pub top_restock_stores: Vec<StoreRestockCount>,
    pub reorder_suggestions: Vec<ReorderSuggestion>,
}
