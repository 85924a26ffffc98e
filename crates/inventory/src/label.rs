use serde::{Deserialize, Serialize};

/// Operational classification attached to every live alert.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockLabel {
    Overstock,
    RestockNeeded,
    Ok,
}

impl StockLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockLabel::Overstock => "OVERSTOCK",
            StockLabel::RestockNeeded => "RESTOCK_NEEDED",
            StockLabel::Ok => "OK",
        }
    }
}

impl core::fmt::Display for StockLabel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forecast-derived restock risk for a (store, product) pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLabel {
    RestockLikely,
    #[default]
    Ok,
}

impl RiskLabel {
    /// Seven-day unit total above which a pair is flagged.
    pub const THRESHOLD_UNITS: f64 = 40.0;

    /// Strictly greater than the threshold is risky; exactly 40 units is still OK.
    pub fn from_forecast(units: f64) -> Self {
        if units > Self::THRESHOLD_UNITS {
            RiskLabel::RestockLikely
        } else {
            RiskLabel::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::RestockLikely => "RESTOCK_LIKELY",
            RiskLabel::Ok => "OK",
        }
    }
}

impl core::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
