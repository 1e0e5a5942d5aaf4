use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use yahoo_finance_api::{YQuoteSummary, YahooConnector};

use crate::errors::CoreError;
use crate::models::market::MarketSnapshot;
use crate::models::settings::Settings;
use crate::numeric::round2;
use super::quote_summary::{AnalystTargets, QuoteSummaryClient, YahooEndpoints};
use super::traits::MarketDataProvider;

const PROVIDER_NAME: &str = "Yahoo Finance";

/// Browser-like agent; the public endpoints reject default client agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Trailing window for the history-derived fields.
const HISTORY_DAYS: i64 = 365;

/// Yahoo Finance market-data provider.
///
/// - **Free**: No API key required.
/// - **History** (current price, price one year ago, 52-week low) comes from
///   the daily chart endpoint through the `yahoo_finance_api` crate.
/// - **Consensus target** comes from the connector's ticker info
///   (`financialData.targetMeanPrice`), which manages its own crumb.
/// - **Named firm's target** comes from the `quoteSummary` module
///   `upgradeDowngradeHistory` through [`QuoteSummaryClient`]. The same
///   response also carries the mean, used when ticker info has none.
///
/// Each part is fetched independently; a failure leaves only its own fields
/// unavailable.
pub struct YahooFinanceProvider {
    // `get_ticker_info` refreshes the connector's crumb and needs `&mut`.
    connector: Mutex<YahooConnector>,
    summaries: QuoteSummaryClient,
    named_analyst: String,
    timeout: Duration,
}

impl YahooFinanceProvider {
    pub fn new(settings: &Settings) -> Result<Self, CoreError> {
        Self::with_endpoints(settings, YahooEndpoints::default())
    }

    /// Provider whose analyst-history requests go to `endpoints`.
    pub fn with_endpoints(
        settings: &Settings,
        endpoints: YahooEndpoints,
    ) -> Result<Self, CoreError> {
        let connector = YahooConnector::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| CoreError::Api {
                provider: PROVIDER_NAME.into(),
                message: format!("Failed to create connector: {e}"),
            })?;
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            connector: Mutex::new(connector),
            summaries: QuoteSummaryClient::new(client, endpoints),
            named_analyst: settings.named_analyst.clone(),
            timeout: settings.request_timeout(),
        })
    }

    /// Daily closes over the trailing year, oldest first.
    async fn fetch_closes(&self, ticker: &str) -> Result<Vec<f64>, CoreError> {
        let end = OffsetDateTime::now_utc();
        let start = end - time::Duration::days(HISTORY_DAYS);

        let connector = self.connector.lock().await;
        let request = connector.get_quote_history(ticker, start, end);
        let resp = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| CoreError::Network(format!("History request for {ticker} timed out")))?
            .map_err(|e| CoreError::Api {
                provider: PROVIDER_NAME.into(),
                message: format!("Failed to fetch history for {ticker}: {e}"),
            })?;

        let mut quotes = resp.quotes().map_err(|e| CoreError::Api {
            provider: PROVIDER_NAME.into(),
            message: format!("Failed to parse quotes for {ticker}: {e}"),
        })?;
        quotes.sort_by_key(|q| q.timestamp);

        Ok(quotes.iter().map(|q| q.close).collect())
    }

    /// Consensus mean target from the connector's ticker info.
    async fn fetch_consensus_target(&self, ticker: &str) -> Result<Option<f64>, CoreError> {
        let mut connector = self.connector.lock().await;
        let info = connector.get_ticker_info(ticker).await.map_err(|e| CoreError::Api {
            provider: PROVIDER_NAME.into(),
            message: format!("Failed to fetch ticker info for {ticker}: {e}"),
        })?;
        Ok(consensus_target(&info))
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, CoreError> {
        let history = match self.fetch_closes(ticker).await {
            Ok(closes) => HistorySummary::from_closes(&closes),
            Err(e) => {
                tracing::warn!(ticker = %ticker, error = %e, "price history unavailable");
                HistorySummary::default()
            }
        };

        let consensus = match self.fetch_consensus_target(ticker).await {
            Ok(mean) => mean,
            Err(e) => {
                tracing::warn!(ticker = %ticker, error = %e, "consensus target unavailable");
                None
            }
        };

        let targets = match self
            .summaries
            .fetch_analyst_targets(ticker, &self.named_analyst)
            .await
        {
            Ok(targets) => targets,
            Err(e) => {
                tracing::warn!(ticker = %ticker, error = %e, "analyst targets unavailable");
                AnalystTargets::default()
            }
        };

        let snapshot = MarketSnapshot {
            current_price: history.current_price,
            price_one_year_ago: history.price_one_year_ago,
            low_52_week: history.low_52_week,
            analyst_target_mean: consensus.or(targets.mean),
            analyst_target_named: targets.named,
        }
        .normalized();

        tracing::debug!(ticker = %ticker, ?snapshot, "snapshot assembled");
        Ok(snapshot)
    }
}

// ── History ─────────────────────────────────────────────────────────

/// Fields derived from a trailing year of daily closes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySummary {
    pub current_price: Option<f64>,
    pub price_one_year_ago: Option<f64>,
    pub low_52_week: Option<f64>,
}

impl HistorySummary {
    /// Summarize closes ordered oldest first: latest close, first close and
    /// lowest close. Non-finite and non-positive closes (gaps in the upstream
    /// series) are skipped; an empty series leaves every field `None`.
    #[must_use]
    pub fn from_closes(closes: &[f64]) -> Self {
        let valid: Vec<f64> = closes
            .iter()
            .copied()
            .filter(|c| c.is_finite() && *c > 0.0)
            .collect();

        Self {
            current_price: valid.last().copied(),
            price_one_year_ago: valid.first().copied(),
            low_52_week: valid.iter().copied().reduce(f64::min),
        }
    }
}

/// Positive consensus mean target from a ticker-info response, rounded to cents.
#[must_use]
pub fn consensus_target(info: &YQuoteSummary) -> Option<f64> {
    info.quote_summary
        .as_ref()
        .and_then(|s| s.result.as_ref())
        .and_then(|r| r.first())
        .and_then(|data| data.financial_data.as_ref())
        .and_then(|f| f.target_mean_price)
        .filter(|p| p.is_finite() && *p > 0.0)
        .map(round2)
}
