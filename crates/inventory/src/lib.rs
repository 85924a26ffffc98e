//! Inventory rules for simulated point-of-sale activity.
//!
//! Pure, deterministic given the random source passed in (no IO, no clocks,
//! no storage).

pub mod label;
pub mod stock;

pub use label::{RiskLabel, StockLabel};
pub use stock::{
    Adjustment, DISCOUNT_STEPS, INITIAL_STOCK, OVERSTOCK_BELOW, OVERSTOCK_TOP_UP, RESTOCK_BELOW,
    RESTOCK_FLOOR, UNITS_SOLD, adjust, stock_after_sale,
};
