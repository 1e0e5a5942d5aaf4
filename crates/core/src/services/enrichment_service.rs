use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::models::market::MarketSnapshot;
use crate::models::note::Note;
use crate::models::working_set::WorkingSet;
use crate::providers::traits::MarketDataProvider;

/// Number of fields a `MarketSnapshot` carries.
pub const SNAPSHOT_FIELDS: usize = 5;

/// Result of enriching one note.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerOutcome {
    /// Position of the note in the working set
    pub index: usize,
    pub ticker: String,
    /// How many of the five fields resolved
    pub resolved_fields: usize,
    /// Set when the provider failed for this ticker as a whole
    pub error: Option<String>,
}

impl TickerOutcome {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.resolved_fields == SNAPSHOT_FIELDS
    }
}

/// Summary of a batch enrichment run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentReport {
    pub outcomes: Vec<TickerOutcome>,
    /// True when the run stopped early on request; later notes were not touched.
    pub cancelled: bool,
}

impl EnrichmentReport {
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn complete(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_complete()).count()
    }

    /// Tickers for which the provider failed outright.
    #[must_use]
    pub fn failed(&self) -> Vec<&TickerOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some()).collect()
    }
}

/// Fills notes' market fields from a `MarketDataProvider`.
///
/// Tickers are fetched one at a time with a politeness delay between
/// requests. Any failure stays local to its note (and within a note, to its
/// fields): the batch always runs to the end unless cancelled.
pub struct EnrichmentService {
    provider: Box<dyn MarketDataProvider>,
    delay: Duration,
}

impl EnrichmentService {
    pub fn new(provider: Box<dyn MarketDataProvider>, delay: Duration) -> Self {
        Self { provider, delay }
    }

    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Fetch fresh data for one note, overwriting its previous enrichment.
    /// Fields the provider could not resolve become `None`.
    pub async fn enrich_note(&self, index: usize, note: &mut Note) -> TickerOutcome {
        let (snapshot, error) = match self.provider.fetch_snapshot(&note.ticker).await {
            Ok(snapshot) => (snapshot.normalized(), None),
            Err(e) => {
                tracing::warn!(
                    ticker = %note.ticker,
                    provider = self.provider.name(),
                    error = %e,
                    "market data unavailable"
                );
                (MarketSnapshot::unavailable(), Some(e.to_string()))
            }
        };

        let resolved_fields = snapshot.resolved_fields();
        if error.is_none() && resolved_fields < SNAPSHOT_FIELDS {
            tracing::debug!(
                ticker = %note.ticker,
                resolved_fields,
                "partial market data"
            );
        }
        note.apply_market(snapshot);

        TickerOutcome {
            index,
            ticker: note.ticker.clone(),
            resolved_fields,
            error,
        }
    }

    /// Enrich every note in the set, in order.
    pub async fn enrich_all(&self, set: &mut WorkingSet) -> EnrichmentReport {
        let never = AtomicBool::new(false);
        self.enrich_until_cancelled(set, &never).await
    }

    /// Enrich every note, checking `cancel` before each ticker. Notes
    /// already updated keep their new data; the rest are left as they were.
    pub async fn enrich_until_cancelled(
        &self,
        set: &mut WorkingSet,
        cancel: &AtomicBool,
    ) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();

        for (index, note) in set.notes_mut().iter_mut().enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if cancel.load(Ordering::SeqCst) {
                tracing::info!(remaining_from = index, "enrichment cancelled");
                report.cancelled = true;
                break;
            }
            let outcome = self.enrich_note(index, note).await;
            report.outcomes.push(outcome);
        }

        tracing::info!(
            provider = self.provider.name(),
            attempted = report.attempted(),
            complete = report.complete(),
            failed = report.failed().len(),
            cancelled = report.cancelled,
            "enrichment finished"
        );
        report
    }
}
