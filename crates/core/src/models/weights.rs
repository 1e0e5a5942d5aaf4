use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::CoreError;
use crate::numeric::round2;

// Baseline multipliers. Product-chosen, they need not sum to 1.
pub const DEFAULT_RATE_WEIGHT: f64 = 0.15;
pub const DEFAULT_BUFFER_WEIGHT: f64 = 0.34;
pub const DEFAULT_MEMORY_WEIGHT: f64 = 0.24;
pub const DEFAULT_TARGET_MEAN_GAP_WEIGHT: f64 = 0.09;
pub const DEFAULT_TARGET_NAMED_GAP_WEIGHT: f64 = 0.09;
pub const DEFAULT_YEAR_AGO_RATIO_WEIGHT: f64 = 0.09;
pub const DEFAULT_LOW_52_RATIO_WEIGHT: f64 = 0.09;

/// Bounds of a single user-settable weight.
pub const MIN_WEIGHT: f64 = 0.0;
pub const MAX_WEIGHT: f64 = 1.0;

/// Named score component a weight applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeightComponent {
    Rate,
    Buffer,
    Memory,
    TargetMeanGap,
    TargetNamedGap,
    YearAgoRatio,
    Low52Ratio,
}

impl WeightComponent {
    /// All components, in score-term order.
    pub const ALL: [WeightComponent; 7] = [
        WeightComponent::Rate,
        WeightComponent::Buffer,
        WeightComponent::Memory,
        WeightComponent::TargetMeanGap,
        WeightComponent::TargetNamedGap,
        WeightComponent::YearAgoRatio,
        WeightComponent::Low52Ratio,
    ];

    /// Machine key, as accepted by `FromStr` and used in config files.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            WeightComponent::Rate => "rate",
            WeightComponent::Buffer => "buffer",
            WeightComponent::Memory => "memory",
            WeightComponent::TargetMeanGap => "targetMeanGap",
            WeightComponent::TargetNamedGap => "targetNamedGap",
            WeightComponent::YearAgoRatio => "yearAgoRatio",
            WeightComponent::Low52Ratio => "low52Ratio",
        }
    }

    /// Short human label for tables.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            WeightComponent::Rate => "Rate",
            WeightComponent::Buffer => "Buffer",
            WeightComponent::Memory => "Memory",
            WeightComponent::TargetMeanGap => "Target mean gap",
            WeightComponent::TargetNamedGap => "Named target gap",
            WeightComponent::YearAgoRatio => "1Y ago / trigger",
            WeightComponent::Low52Ratio => "52W low / trigger",
        }
    }
}

impl std::fmt::Display for WeightComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for WeightComponent {
    type Err = CoreError;

    /// Case-insensitive; accepts camelCase, snake_case and kebab-case keys.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        WeightComponent::ALL
            .into_iter()
            .find(|c| c.key().to_lowercase() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = WeightComponent::ALL.iter().map(|c| c.key()).collect();
                CoreError::ValidationError(format!(
                    "Unknown weight '{s}' (expected one of: {})",
                    known.join(", ")
                ))
            })
    }
}

/// Multipliers for each score component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Weights {
    pub rate: f64,
    pub buffer: f64,
    pub memory: f64,
    pub target_mean_gap: f64,
    pub target_named_gap: f64,
    pub year_ago_ratio: f64,
    pub low52_ratio: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE_WEIGHT,
            buffer: DEFAULT_BUFFER_WEIGHT,
            memory: DEFAULT_MEMORY_WEIGHT,
            target_mean_gap: DEFAULT_TARGET_MEAN_GAP_WEIGHT,
            target_named_gap: DEFAULT_TARGET_NAMED_GAP_WEIGHT,
            year_ago_ratio: DEFAULT_YEAR_AGO_RATIO_WEIGHT,
            low52_ratio: DEFAULT_LOW_52_RATIO_WEIGHT,
        }
    }
}

impl Weights {
    #[must_use]
    pub fn get(&self, component: WeightComponent) -> f64 {
        match component {
            WeightComponent::Rate => self.rate,
            WeightComponent::Buffer => self.buffer,
            WeightComponent::Memory => self.memory,
            WeightComponent::TargetMeanGap => self.target_mean_gap,
            WeightComponent::TargetNamedGap => self.target_named_gap,
            WeightComponent::YearAgoRatio => self.year_ago_ratio,
            WeightComponent::Low52Ratio => self.low52_ratio,
        }
    }

    /// Set one weight. Values must lie in [0, 1] and are kept at 0.01
    /// resolution. No cross-field validation.
    pub fn set(&mut self, component: WeightComponent, value: f64) -> Result<(), CoreError> {
        if !value.is_finite() || !(MIN_WEIGHT..=MAX_WEIGHT).contains(&value) {
            return Err(CoreError::ValidationError(format!(
                "Weight '{component}' must be between {MIN_WEIGHT} and {MAX_WEIGHT}, got {value}"
            )));
        }
        let value = round2(value);
        match component {
            WeightComponent::Rate => self.rate = value,
            WeightComponent::Buffer => self.buffer = value,
            WeightComponent::Memory => self.memory = value,
            WeightComponent::TargetMeanGap => self.target_mean_gap = value,
            WeightComponent::TargetNamedGap => self.target_named_gap = value,
            WeightComponent::YearAgoRatio => self.year_ago_ratio = value,
            WeightComponent::Low52Ratio => self.low52_ratio = value,
        }
        Ok(())
    }

    /// `(component, value)` pairs in score-term order.
    pub fn iter(&self) -> impl Iterator<Item = (WeightComponent, f64)> + '_ {
        WeightComponent::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}
