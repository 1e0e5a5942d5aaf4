//! Yahoo `quoteSummary` access for analyst price targets.
//!
//! The endpoint only answers requests that carry a session cookie (handed
//! out by `fc.yahoo.com`) together with the matching crumb from
//! `/v1/test/getcrumb`. The pair is fetched once, reused for every ticker,
//! and refreshed when Yahoo rejects the crumb.

use reqwest::header::{ACCEPT_LANGUAGE, COOKIE, SET_COOKIE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::errors::CoreError;
use crate::numeric::round2;
use super::price_target::parse_price_target;

const PROVIDER_NAME: &str = "Yahoo Finance";

/// Modules requested per ticker.
const SUMMARY_MODULES: &str = "financialData,upgradeDowngradeHistory";

/// Extra attempts with a fresh crumb after a rejection.
const MAX_CRUMB_RETRIES: usize = 1;

/// Where the session cookie, the crumb and the summaries come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YahooEndpoints {
    pub cookie_url: String,
    pub crumb_url: String,
    /// Base URL; the ticker is appended as a path segment
    pub quote_summary_url: String,
}

impl Default for YahooEndpoints {
    fn default() -> Self {
        Self {
            cookie_url: "https://fc.yahoo.com".into(),
            crumb_url: "https://query1.finance.yahoo.com/v1/test/getcrumb".into(),
            quote_summary_url: "https://query2.finance.yahoo.com/v10/finance/quoteSummary".into(),
        }
    }
}

/// Cookie header value and the crumb issued for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrumbSession {
    pub cookie: String,
    pub crumb: String,
}

/// Fetches analyst targets through an authenticated `quoteSummary` session.
pub struct QuoteSummaryClient {
    client: Client,
    endpoints: YahooEndpoints,
    session: Mutex<Option<CrumbSession>>,
}

impl QuoteSummaryClient {
    pub fn new(client: Client, endpoints: YahooEndpoints) -> Self {
        Self {
            client,
            endpoints,
            session: Mutex::new(None),
        }
    }

    /// Consensus and `named_analyst` targets for `ticker`.
    pub async fn fetch_analyst_targets(
        &self,
        ticker: &str,
        named_analyst: &str,
    ) -> Result<AnalystTargets, CoreError> {
        for attempt in 0..=MAX_CRUMB_RETRIES {
            let session = self.session().await?;
            let url = format!("{}/{ticker}", self.endpoints.quote_summary_url);
            let response = self
                .client
                .get(url)
                .query(&[("modules", SUMMARY_MODULES), ("crumb", session.crumb.as_str())])
                .header(COOKIE, &session.cookie)
                .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;
            if is_crumb_rejection(status, &body) {
                tracing::debug!(ticker = %ticker, attempt, "crumb rejected, refreshing session");
                *self.session.lock().await = None;
                continue;
            }
            if !status.is_success() {
                return Err(CoreError::Api {
                    provider: PROVIDER_NAME.into(),
                    message: format!("quoteSummary for {ticker} returned HTTP {status}"),
                });
            }
            return parse_analyst_targets(&body, named_analyst);
        }

        Err(CoreError::Api {
            provider: PROVIDER_NAME.into(),
            message: format!("Session crumb rejected for {ticker}"),
        })
    }

    /// The cached session, opening one first if needed.
    pub async fn session(&self) -> Result<CrumbSession, CoreError> {
        let mut cached = self.session.lock().await;
        if let Some(session) = cached.as_ref() {
            return Ok(session.clone());
        }
        let session = self.open_session().await?;
        *cached = Some(session.clone());
        Ok(session)
    }

    async fn open_session(&self) -> Result<CrumbSession, CoreError> {
        // The cookie endpoint answers 404 but still sets the cookie.
        let response = self.client.get(&self.endpoints.cookie_url).send().await?;
        let set_cookies: Vec<&str> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        let cookie = cookie_header(&set_cookies).ok_or_else(|| CoreError::Api {
            provider: PROVIDER_NAME.into(),
            message: "No session cookie in response".into(),
        })?;

        let text = self
            .client
            .get(&self.endpoints.crumb_url)
            .header(COOKIE, &cookie)
            .send()
            .await?
            .text()
            .await?;
        let crumb = parse_crumb(&text).ok_or_else(|| CoreError::Api {
            provider: PROVIDER_NAME.into(),
            message: format!("Invalid crumb response: {}", text.trim()),
        })?;

        tracing::debug!("Yahoo session opened");
        Ok(CrumbSession { cookie, crumb })
    }
}

/// `Cookie` header value built from `Set-Cookie` headers: the `name=value`
/// pair of each, attributes dropped.
#[must_use]
pub fn cookie_header(set_cookies: &[&str]) -> Option<String> {
    let pairs: Vec<&str> = set_cookies
        .iter()
        .filter_map(|c| c.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

/// A usable crumb from the `getcrumb` body, or `None` for error pages.
#[must_use]
pub fn parse_crumb(text: &str) -> Option<String> {
    let crumb = text.trim();
    let rejected = crumb.is_empty()
        || crumb.contains(char::is_whitespace)
        || crumb.contains('<')
        || crumb.contains("Invalid")
        || crumb.contains("Too Many Requests");
    (!rejected).then(|| crumb.to_string())
}

/// Whether Yahoo refused the request because of the cookie/crumb pair.
#[must_use]
pub fn is_crumb_rejection(status: StatusCode, body: &str) -> bool {
    status == StatusCode::UNAUTHORIZED
        || body.contains("Invalid Crumb")
        || body.contains("Invalid Cookie")
}

// ── Response parsing ────────────────────────────────────────────────

/// Analyst price targets extracted from a `quoteSummary` response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalystTargets {
    pub mean: Option<f64>,
    pub named: Option<f64>,
}

#[derive(Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: Option<QuoteSummary>,
}

#[derive(Deserialize)]
struct QuoteSummary {
    result: Option<Vec<SummaryResult>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    financial_data: Option<FinancialData>,
    upgrade_downgrade_history: Option<UpgradeDowngradeHistory>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    target_mean_price: Option<Value>,
}

#[derive(Deserialize)]
struct UpgradeDowngradeHistory {
    #[serde(default)]
    history: Vec<AnalystAction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalystAction {
    firm: Option<String>,
    current_price_target: Option<Value>,
}

/// Extract the consensus target and `named_analyst`'s latest target from a
/// `quoteSummary` JSON body.
///
/// Missing modules, absent coverage, or the firm not being among the
/// contributors leave the corresponding target `None`. Only a body that is
/// not JSON at all is an error.
pub fn parse_analyst_targets(body: &str, named_analyst: &str) -> Result<AnalystTargets, CoreError> {
    let envelope: QuoteSummaryEnvelope =
        serde_json::from_str(body).map_err(|e| CoreError::Api {
            provider: PROVIDER_NAME.into(),
            message: format!("Unexpected quoteSummary response: {e}"),
        })?;

    let Some(result) = envelope
        .quote_summary
        .and_then(|s| s.result)
        .and_then(|r| r.into_iter().next())
    else {
        return Ok(AnalystTargets::default());
    };

    let mean = result
        .financial_data
        .and_then(|f| f.target_mean_price)
        .as_ref()
        .and_then(price_from_value)
        .filter(|p| *p > 0.0);

    let wanted = named_analyst.to_lowercase();
    // History is newest first: the first entry for the firm is its current view.
    let named = result
        .upgrade_downgrade_history
        .map(|h| h.history)
        .unwrap_or_default()
        .into_iter()
        .find(|a| {
            a.firm
                .as_deref()
                .is_some_and(|f| f.to_lowercase().contains(&wanted))
        })
        .and_then(|a| a.current_price_target)
        .as_ref()
        .and_then(price_from_value)
        .filter(|p| *p > 0.0);

    Ok(AnalystTargets { mean, named })
}

/// Accepts a bare number, Yahoo's `{"raw": .., "fmt": ..}` wrapper, or text
/// (which may be a range).
fn price_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|p| p.is_finite() && *p >= 0.0)
            .map(round2),
        Value::String(s) => parse_price_target(s),
        Value::Object(map) => map
            .get("raw")
            .and_then(price_from_value)
            .or_else(|| map.get("fmt").and_then(price_from_value)),
        _ => None,
    }
}
