use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreError;

use super::market::MarketSnapshot;

/// Longest accepted ticker symbol, in characters.
pub const MAX_TICKER_LEN: usize = 8;

/// Accepted range for `rate` and `buffer` percentages.
pub const PERCENT_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

/// User-entered terms of a structured note, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteInput {
    pub ticker: String,
    /// Nominal annual rate, percent
    pub rate: f64,
    /// Protective cushion, percent
    pub buffer: f64,
    /// Memory-coupon feature present
    pub has_memory: bool,
}

impl NoteInput {
    pub fn new(ticker: impl Into<String>, rate: f64, buffer: f64, has_memory: bool) -> Self {
        Self {
            ticker: ticker.into(),
            rate,
            buffer,
            has_memory,
        }
    }

    /// Check the terms without touching any state.
    pub fn validate(&self) -> Result<(), CoreError> {
        let ticker = self.ticker.trim();
        if ticker.is_empty() {
            return Err(CoreError::ValidationError(
                "Ticker must not be empty".into(),
            ));
        }
        let len = ticker.chars().count();
        if len > MAX_TICKER_LEN {
            return Err(CoreError::ValidationError(format!(
                "Ticker '{ticker}' is {len} characters long (max {MAX_TICKER_LEN})"
            )));
        }
        if ticker.chars().any(char::is_whitespace) {
            return Err(CoreError::ValidationError(format!(
                "Ticker '{ticker}' must not contain whitespace"
            )));
        }
        validate_percent("Rate", self.rate)?;
        validate_percent("Buffer", self.buffer)?;
        Ok(())
    }
}

fn validate_percent(label: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || !PERCENT_RANGE.contains(&value) {
        return Err(CoreError::ValidationError(format!(
            "{label} must be between 0 and 100, got {value}"
        )));
    }
    Ok(())
}

/// One structured-note candidate under evaluation.
///
/// Enrichment fields are `None` until fetched (or when the fetch failed).
/// `score` is derived: anything that changes inputs or enrichment must
/// clear it, and the caller recomputes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: Uuid,

    /// Underlying symbol, uppercased (e.g., "AAPL")
    pub ticker: String,

    /// Nominal annual rate, percent in [0, 100]
    pub rate: f64,

    /// Protective cushion, percent in [0, 100]
    pub buffer: f64,

    /// Memory-coupon feature present
    pub has_memory: bool,

    pub current_price: Option<f64>,
    pub price_one_year_ago: Option<f64>,
    pub low_52_week: Option<f64>,
    pub analyst_target_mean: Option<f64>,
    pub analyst_target_named: Option<f64>,

    /// Composite score under the working set's current weights
    #[serde(default)]
    pub score: Option<f64>,
}

impl Note {
    /// Validate the input and build an un-enriched, unscored note.
    pub fn new(input: NoteInput) -> Result<Self, CoreError> {
        input.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            ticker: input.ticker.trim().to_uppercase(),
            rate: input.rate,
            buffer: input.buffer,
            has_memory: input.has_memory,
            current_price: None,
            price_one_year_ago: None,
            low_52_week: None,
            analyst_target_mean: None,
            analyst_target_named: None,
            score: None,
        })
    }

    /// The user-entered terms of this note.
    #[must_use]
    pub fn input(&self) -> NoteInput {
        NoteInput::new(self.ticker.clone(), self.rate, self.buffer, self.has_memory)
    }

    /// Current enrichment fields as a snapshot.
    #[must_use]
    pub fn market(&self) -> MarketSnapshot {
        MarketSnapshot {
            current_price: self.current_price,
            price_one_year_ago: self.price_one_year_ago,
            low_52_week: self.low_52_week,
            analyst_target_mean: self.analyst_target_mean,
            analyst_target_named: self.analyst_target_named,
        }
    }

    /// Overwrite every enrichment field with the snapshot's values
    /// (unavailable fields become `None`) and invalidate the score.
    pub fn apply_market(&mut self, snapshot: MarketSnapshot) {
        self.current_price = snapshot.current_price;
        self.price_one_year_ago = snapshot.price_one_year_ago;
        self.low_52_week = snapshot.low_52_week;
        self.analyst_target_mean = snapshot.analyst_target_mean;
        self.analyst_target_named = snapshot.analyst_target_named;
        self.score = None;
    }

    /// True when at least one enrichment field is present.
    #[must_use]
    pub fn is_enriched(&self) -> bool {
        !self.market().is_empty()
    }

    pub fn invalidate_score(&mut self) {
        self.score = None;
    }
}
