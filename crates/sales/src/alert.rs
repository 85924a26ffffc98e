use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelfwatch_core::{CityId, ProductId, StoreId};
use shelfwatch_inventory::{RiskLabel, StockLabel};

use crate::sale::SalesEvent;

/// Display names resolved from the catalog when an alert is classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertContext {
    pub store_name: String,
    pub product_name: String,
    pub city_name: String,
}

/// A classified, user-visible view of one persisted sale.
///
/// Built only from a [`SalesEvent`] (i.e. after the ledger append succeeded)
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Ledger sequence of the source sale.
    pub sale_sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub store_id: StoreId,
    pub store_name: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub city_id: CityId,
    pub city_name: String,
    pub units_sold: u32,
    pub stock: u32,
    pub label: StockLabel,
    /// Latest forecast risk for the pair; OK when no forecast exists yet.
    pub forecast: RiskLabel,
    pub hour: u8,
    pub discount_pct: u8,
    pub holiday: bool,
    pub activity: bool,
}

impl Alert {
    pub fn from_sale(
        sale: &SalesEvent,
        label: StockLabel,
        forecast: Option<RiskLabel>,
        context: AlertContext,
    ) -> Self {
        Self {
            sale_sequence: sale.sequence,
            timestamp: sale.occurred_at,
            store_id: sale.store_id,
            store_name: context.store_name,
            product_id: sale.product_id,
            product_name: context.product_name,
            city_id: sale.city_id,
            city_name: context.city_name,
            units_sold: sale.units_sold,
            stock: sale.stock,
            label,
            forecast: forecast.unwrap_or_default(),
            hour: sale.hour,
            discount_pct: sale.discount_pct,
            holiday: sale.holiday,
            activity: sale.activity,
        }
    }
}
