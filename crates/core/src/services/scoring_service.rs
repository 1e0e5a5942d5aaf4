use serde::{Deserialize, Serialize};

use crate::models::note::Note;
use crate::models::weights::Weights;
use crate::models::working_set::WorkingSet;
use crate::numeric::{round2, safe_div};

/// Divisor applied to the rate term, so a 20% coupon at weight 1 scores 1.
pub const RATE_SCALE: f64 = 20.0;

/// Divisor applied to the buffer term (buffer is a percentage).
pub const BUFFER_SCALE: f64 = 100.0;

/// Protective trigger level: current price reduced by the buffer percentage.
/// `0.0` when the current price is unknown.
#[must_use]
pub fn trigger_price(note: &Note) -> f64 {
    match note.current_price {
        Some(price) => price * (100.0 - note.buffer) / 100.0,
        None => 0.0,
    }
}

/// Per-term contributions to a note's score, before rounding.
///
/// Pure business logic, no I/O. Every degenerate case (missing enrichment,
/// zero price, zero trigger) contributes exactly `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub trigger: f64,
    pub rate: f64,
    pub buffer: f64,
    pub memory: f64,
    pub target_mean_gap: f64,
    pub target_named_gap: f64,
    pub year_ago_ratio: f64,
    pub low52_ratio: f64,
}

impl ScoreBreakdown {
    #[must_use]
    pub fn compute(note: &Note, weights: &Weights) -> Self {
        let trigger = trigger_price(note);

        // Terms 1-3: the note's own contractual terms.
        let rate = note.rate * weights.rate / RATE_SCALE;
        let buffer = note.buffer * weights.buffer / BUFFER_SCALE;
        let memory = if note.has_memory { weights.memory } else { 0.0 };

        // Terms 4-5: analyst optimism relative to the current price.
        let target_mean_gap =
            target_gap(note.analyst_target_mean, note.current_price) * weights.target_mean_gap;
        let target_named_gap =
            target_gap(note.analyst_target_named, note.current_price) * weights.target_named_gap;

        // Terms 6-7: how far the trigger sits below recent prices.
        let year_ago_ratio =
            trigger_ratio(note.price_one_year_ago, trigger) * weights.year_ago_ratio;
        let low52_ratio = trigger_ratio(note.low_52_week, trigger) * weights.low52_ratio;

        Self {
            trigger,
            rate,
            buffer,
            memory,
            target_mean_gap,
            target_named_gap,
            year_ago_ratio,
            low52_ratio,
        }
    }

    /// Unrounded sum of the seven terms.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.rate
            + self.buffer
            + self.memory
            + self.target_mean_gap
            + self.target_named_gap
            + self.year_ago_ratio
            + self.low52_ratio
    }

    /// Terms in score order, labelled for display.
    #[must_use]
    pub fn terms(&self) -> [(&'static str, f64); 7] {
        [
            ("rate", self.rate),
            ("buffer", self.buffer),
            ("memory", self.memory),
            ("targetMeanGap", self.target_mean_gap),
            ("targetNamedGap", self.target_named_gap),
            ("yearAgoRatio", self.year_ago_ratio),
            ("low52Ratio", self.low52_ratio),
        ]
    }
}

fn target_gap(target: Option<f64>, current_price: Option<f64>) -> f64 {
    match (target, current_price) {
        (Some(target), Some(price)) => safe_div(target, price) - 1.0,
        _ => 0.0,
    }
}

fn trigger_ratio(price: Option<f64>, trigger: f64) -> f64 {
    match price {
        Some(price) if trigger != 0.0 => safe_div(price, trigger),
        _ => 0.0,
    }
}

/// Composite score of `note` under `weights`, rounded to 2 decimals.
#[must_use]
pub fn score(note: &Note, weights: &Weights) -> f64 {
    round2(ScoreBreakdown::compute(note, weights).total())
}

/// Score every note in the set with its current weights.
/// Returns the number of notes scored.
pub fn score_all(set: &mut WorkingSet) -> usize {
    let (notes, weights) = set.notes_and_weights_mut();
    for note in notes.iter_mut() {
        note.score = Some(score(note, weights));
    }
    tracing::debug!(scored = notes.len(), "scores computed");
    notes.len()
}
