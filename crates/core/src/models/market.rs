use serde::{Deserialize, Serialize};

use crate::numeric::round2;

/// Best-effort market data for one ticker.
///
/// Every field resolves independently: `None` means the value was
/// unavailable (network failure, no coverage, unparsable upstream data),
/// which is distinct from a price of zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Latest close
    pub current_price: Option<f64>,

    /// First close of the trailing one-year window
    pub price_one_year_ago: Option<f64>,

    /// Lowest close of the trailing one-year window
    pub low_52_week: Option<f64>,

    /// Consensus (mean) analyst price target
    pub analyst_target_mean: Option<f64>,

    /// Price target of the configured named analyst
    pub analyst_target_named: Option<f64>,
}

impl MarketSnapshot {
    /// Snapshot with every field unavailable.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Number of fields that resolved to a value (0..=5).
    #[must_use]
    pub fn resolved_fields(&self) -> usize {
        self.fields().iter().filter(|f| f.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolved_fields() == 0
    }

    /// Round every present price to cents and drop values that are not
    /// finite, non-negative prices.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            current_price: normalize_price(self.current_price),
            price_one_year_ago: normalize_price(self.price_one_year_ago),
            low_52_week: normalize_price(self.low_52_week),
            analyst_target_mean: normalize_price(self.analyst_target_mean),
            analyst_target_named: normalize_price(self.analyst_target_named),
        }
    }

    fn fields(&self) -> [Option<f64>; 5] {
        [
            self.current_price,
            self.price_one_year_ago,
            self.low_52_week,
            self.analyst_target_mean,
            self.analyst_target_named,
        ]
    }
}

fn normalize_price(price: Option<f64>) -> Option<f64> {
    price
        .filter(|p| p.is_finite() && *p >= 0.0)
        .map(round2)
}
