use core::ops::RangeInclusive;

use rand::Rng;

use shelfwatch_core::DomainError;

use crate::label::StockLabel;

/// Opening stock for a pair with no recorded sales yet.
pub const INITIAL_STOCK: RangeInclusive<u32> = 10..=40;

/// Units sold per simulated sale.
pub const UNITS_SOLD: RangeInclusive<u32> = 2..=15;

/// Discount percentages a sale may carry.
pub const DISCOUNT_STEPS: [u8; 4] = [0, 5, 10, 15];

/// Rolls below this value take the overstock branch.
pub const OVERSTOCK_BELOW: f64 = 0.35;

/// Rolls in `[OVERSTOCK_BELOW, RESTOCK_BELOW)` take the restock branch.
pub const RESTOCK_BELOW: f64 = 0.60;

/// Units added on top of the computed stock in the overstock branch.
pub const OVERSTOCK_TOP_UP: RangeInclusive<u32> = 35..=60;

/// Final stock range in the restock branch.
pub const RESTOCK_FLOOR: RangeInclusive<u32> = 0..=3;

/// Stock left after selling `units`; never below zero.
pub fn stock_after_sale(current: u32, units: u32) -> u32 {
    current.saturating_sub(units)
}

/// Outcome of the adjustment model for one sale.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Adjustment {
    pub stock: u32,
    pub label: StockLabel,
}

/// Three-branch stochastic adjustment of the post-sale stock.
///
/// `roll` selects the branch and must lie in `[0, 1)`:
/// - `roll < 0.35`: stock is topped up by 35..=60 units, labelled OVERSTOCK
/// - `0.35 <= roll < 0.60`: stock is replaced by 0..=3 units, labelled RESTOCK_NEEDED
/// - otherwise: stock is kept, labelled OK
///
/// The label comes from the branch, not from the resulting stock level.
pub fn adjust<R: Rng + ?Sized>(
    computed: u32,
    roll: f64,
    rng: &mut R,
) -> Result<Adjustment, DomainError> {
    if !(0.0..1.0).contains(&roll) {
        return Err(DomainError::validation(format!(
            "adjustment roll must be in [0, 1), got {roll}"
        )));
    }

    let adjustment = if roll < OVERSTOCK_BELOW {
        Adjustment {
            stock: computed.saturating_add(rng.gen_range(OVERSTOCK_TOP_UP)),
            label: StockLabel::Overstock,
        }
    } else if roll < RESTOCK_BELOW {
        Adjustment {
            stock: rng.gen_range(RESTOCK_FLOOR),
            label: StockLabel::RestockNeeded,
        }
    } else {
        Adjustment {
            stock: computed,
            label: StockLabel::Ok,
        }
    };

    Ok(adjustment)
}
