pub mod price_target;
pub mod traits;

// Market data provider implementations
pub mod quote_summary;
pub mod yahoo_finance;
