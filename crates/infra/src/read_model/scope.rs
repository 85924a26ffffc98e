use std::sync::Arc;

use serde::{Deserialize, Serialize};

use shelfwatch_ai::Forecast;
use shelfwatch_core::StoreId;
use shelfwatch_inventory::StockLabel;
use shelfwatch_sales::Alert;

/// Visibility restriction for a read: everything, or a single store.
///
/// Always passed explicitly by the caller; the read model never infers it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope", content = "store_id")]
pub enum Scope {
    #[default]
    All,
    Store(StoreId),
}

impl Scope {
    pub fn allows(&self, store_id: StoreId) -> bool {
        match self {
            Scope::All => true,
            Scope::Store(id) => *id == store_id,
        }
    }

    /// Keep only the entries visible under this scope, preserving order.
    ///
    /// The single scope filter behind every read of the alert store.
    pub fn filter<'a, T, I>(self, entries: I) -> impl Iterator<Item = &'a T>
    where
        T: Scoped + ?Sized + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        entries.into_iter().filter(move |e| self.allows(e.store_id()))
    }
}

/// Entries that belong to exactly one store.
pub trait Scoped {
    fn store_id(&self) -> StoreId;
}

impl Scoped for Alert {
    fn store_id(&self) -> StoreId {
        self.store_id
    }
}

impl Scoped for Forecast {
    fn store_id(&self) -> StoreId {
        self.store_id
    }
}

impl<T: Scoped + ?Sized> Scoped for Arc<T> {
    fn store_id(&self) -> StoreId {
        (**self).store_id()
    }
}

/// What a feed read selects.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    /// Every live alert.
    Alerts,
    Overstock,
    /// RESTOCK_NEEDED alerts.
    Understock,
    Ok,
    Forecasts,
}

impl FeedKind {
    /// Label an alert must carry to match, `None` when any label matches.
    pub fn label(&self) -> Option<StockLabel> {
        match self {
            FeedKind::Overstock => Some(StockLabel::Overstock),
            FeedKind::Understock => Some(StockLabel::RestockNeeded),
            FeedKind::Ok => Some(StockLabel::Ok),
            FeedKind::Alerts | FeedKind::Forecasts => None,
        }
    }
}
