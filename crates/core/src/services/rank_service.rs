use serde::{Deserialize, Serialize};

use crate::models::note::Note;
use crate::models::tier::Tier;
use crate::models::working_set::WorkingSet;

/// Percentile at or above which a score is `High`.
pub const HIGH_TIER_THRESHOLD: f64 = 0.66;

/// Percentile at or above which a score is `Medium`.
pub const MEDIUM_TIER_THRESHOLD: f64 = 0.33;

/// Min/max of the scores currently present in a working set.
///
/// Classification is relative: adding or removing a note can move every
/// other note to a different tier, so a `ScoreRange` is rebuilt from the
/// current set each time it is needed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    /// Range over the given scores; `None` when there are none.
    /// Non-finite values are ignored.
    pub fn from_scores(scores: impl IntoIterator<Item = f64>) -> Option<Self> {
        scores
            .into_iter()
            .filter(|s| s.is_finite())
            .fold(None, |range, s| match range {
                None => Some(Self { min: s, max: s }),
                Some(r) => Some(Self {
                    min: r.min.min(s),
                    max: r.max.max(s),
                }),
            })
    }

    /// Range over the notes' present scores.
    pub fn from_notes(notes: &[Note]) -> Option<Self> {
        Self::from_scores(notes.iter().filter_map(|n| n.score))
    }

    /// Relative position of `score` in [min, max]. A degenerate range
    /// (all scores equal) puts everything at the top.
    #[must_use]
    pub fn percentile(&self, score: f64) -> f64 {
        if self.max > self.min {
            (score - self.min) / (self.max - self.min)
        } else {
            1.0
        }
    }

    #[must_use]
    pub fn classify(&self, score: f64) -> Tier {
        tier_for_percentile(self.percentile(score))
    }
}

#[must_use]
pub fn tier_for_percentile(percentile: f64) -> Tier {
    if percentile >= HIGH_TIER_THRESHOLD {
        Tier::High
    } else if percentile >= MEDIUM_TIER_THRESHOLD {
        Tier::Medium
    } else {
        Tier::Low
    }
}

/// Tier of every note, in note order; `None` for notes without a score.
#[must_use]
pub fn classify_notes(notes: &[Note]) -> Vec<Option<Tier>> {
    let range = ScoreRange::from_notes(notes);
    notes
        .iter()
        .map(|n| match (n.score, range) {
            (Some(score), Some(range)) => Some(range.classify(score)),
            _ => None,
        })
        .collect()
}

/// A scored note's position in the ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedNote<'a> {
    /// Position in the working set (display order)
    pub index: usize,
    pub note: &'a Note,
    pub score: f64,
    pub percentile: f64,
    pub tier: Tier,
}

/// Scored notes, best first. Ties keep insertion order.
#[must_use]
pub fn rank(set: &WorkingSet) -> Vec<RankedNote<'_>> {
    let Some(range) = ScoreRange::from_notes(set.notes()) else {
        return Vec::new();
    };

    let mut ranked: Vec<RankedNote<'_>> = set
        .notes()
        .iter()
        .enumerate()
        .filter_map(|(index, note)| {
            let score = note.score?;
            Some(RankedNote {
                index,
                note,
                score,
                percentile: range.percentile(score),
                tier: range.classify(score),
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}
