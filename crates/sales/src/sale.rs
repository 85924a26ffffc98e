use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use shelfwatch_core::{CityId, DomainError, DomainResult, ProductId, StoreId};

/// A sale ready to be appended to the ledger (no sequence number yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub occurred_at: DateTime<Utc>,
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub city_id: CityId,
    pub units_sold: u32,
    /// Stock level after the sale (and after any adjustment).
    pub stock: u32,
    pub hour: u8,
    pub discount_pct: u8,
    pub holiday: bool,
    pub activity: bool,
}

impl NewSale {
    /// A sale with neutral attributes; hour is taken from `occurred_at`.
    pub fn new(
        occurred_at: DateTime<Utc>,
        store_id: StoreId,
        product_id: ProductId,
        city_id: CityId,
        units_sold: u32,
        stock: u32,
    ) -> Self {
        Self {
            occurred_at,
            store_id,
            product_id,
            city_id,
            units_sold,
            stock,
            hour: occurred_at.hour() as u8,
            discount_pct: 0,
            holiday: false,
            activity: false,
        }
    }

    pub fn with_discount(mut self, discount_pct: u8) -> Self {
        self.discount_pct = discount_pct;
        self
    }

    pub fn with_flags(mut self, holiday: bool, activity: bool) -> Self {
        self.holiday = holiday;
        self.activity = activity;
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.units_sold == 0 {
            return Err(DomainError::validation("units_sold must be positive"));
        }
        if self.hour > 23 {
            return Err(DomainError::validation(format!(
                "hour must be in 0..=23, got {}",
                self.hour
            )));
        }
        if self.discount_pct > 100 {
            return Err(DomainError::validation(format!(
                "discount_pct must be at most 100, got {}",
                self.discount_pct
            )));
        }
        Ok(())
    }

    /// Assign the ledger position. Called by ledger implementations on append.
    pub fn into_event(self, sequence: u64) -> SalesEvent {
        SalesEvent {
            sequence,
            occurred_at: self.occurred_at,
            store_id: self.store_id,
            product_id: self.product_id,
            city_id: self.city_id,
            units_sold: self.units_sold,
            stock: self.stock,
            hour: self.hour,
            discount_pct: self.discount_pct,
            holiday: self.holiday,
            activity: self.activity,
        }
    }
}

/// A sale persisted in the append-only ledger.
///
/// Ordered by `occurred_at`; ties are broken by `sequence` (insertion order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesEvent {
    /// Monotonically increasing position in the ledger (starts at 1).
    pub sequence: u64,
    pub occurred_at: DateTime<Utc>,
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub city_id: CityId,
    pub units_sold: u32,
    pub stock: u32,
    pub hour: u8,
    pub discount_pct: u8,
    pub holiday: bool,
    pub activity: bool,
}

impl SalesEvent {
    pub fn pair(&self) -> (StoreId, ProductId) {
        (self.store_id, self.product_id)
    }

    /// Day of week, Monday = 0 .. Sunday = 6.
    pub fn day_of_week(&self) -> u32 {
        self.occurred_at.weekday().num_days_from_monday()
    }

    /// Ledger ordering key.
    pub fn order_key(&self) -> (DateTime<Utc>, u64) {
        (self.occurred_at, self.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sale(units: u32) -> NewSale {
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap();
        NewSale::new(at, StoreId::new(), ProductId::new(), CityId::new(), units, 10)
    }

    #[test]
    fn hour_is_taken_from_timestamp() {
        assert_eq!(sale(3).hour, 14);
    }

    #[test]
    fn zero_units_are_rejected() {
        assert!(sale(0).validate().is_err());
        assert!(sale(1).validate().is_ok());
    }

    #[test]
    fn out_of_range_attributes_are_rejected() {
        let mut s = sale(2);
        s.hour = 24;
        assert!(s.validate().is_err());

        let s = sale(2).with_discount(101);
        assert!(s.validate().is_err());
    }

    #[test]
    fn committed_event_keeps_fields_and_sequence() {
        let s = sale(5).with_discount(10).with_flags(true, false);
        let e = s.clone().into_event(7);

        assert_eq!(e.sequence, 7);
        assert_eq!(e.units_sold, 5);
        assert_eq!(e.discount_pct, 10);
        assert!(e.holiday && !e.activity);
        assert_eq!(e.pair(), (s.store_id, s.product_id));
        // 2024-03-04 is a Monday.
        assert_eq!(e.day_of_week(), 0);
    }
}
