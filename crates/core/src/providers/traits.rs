use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::market::MarketSnapshot;

/// Source of per-ticker market data used to enrich notes.
///
/// Implementations resolve each snapshot field independently: a field that
/// cannot be obtained is left `None`, it never fails the whole call. An
/// `Err` is reserved for the provider being unusable for this ticker as a
/// whole, and callers treat it as an all-unavailable snapshot.
///
/// The scoring core only sees `MarketSnapshot`, so a scraping-based
/// implementation can be swapped for a stable market-data API freely.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch a best-effort snapshot for `ticker`. Prices are rounded to
    /// 2 decimal places.
    async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, CoreError>;
}
