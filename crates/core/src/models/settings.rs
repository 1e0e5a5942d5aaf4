use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::CoreError;

/// Maximum number of notes in one working set.
pub const DEFAULT_MAX_NOTES: usize = 20;

/// Pause between per-ticker fetches, to stay under upstream rate limits.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 1_000;

/// Upper bound for a single network call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Firm whose individual price target fills the named-analyst field.
pub const DEFAULT_NAMED_ANALYST: &str = "Morgan Stanley";

/// Session settings. Every field falls back to its default when missing
/// from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Working-set capacity
    pub max_notes: usize,

    /// Politeness delay between tickers during batch enrichment
    pub request_delay_ms: u64,

    /// Per-request network timeout
    pub request_timeout_secs: u64,

    /// Analyst firm matched (case-insensitive substring) for the named target
    pub named_analyst: String,

    /// Directory where reports are written
    pub export_dir: PathBuf,

    /// Report file name prefix; the export date is appended
    pub export_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_notes: DEFAULT_MAX_NOTES,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            named_analyst: DEFAULT_NAMED_ANALYST.to_string(),
            export_dir: PathBuf::from("."),
            export_prefix: "notes".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CoreError::FileIO(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_notes == 0 {
            return Err(CoreError::Config("max_notes must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        if self.named_analyst.trim().is_empty() {
            return Err(CoreError::Config("named_analyst must not be empty".into()));
        }
        if self.export_prefix.trim().is_empty() {
            return Err(CoreError::Config("export_prefix must not be empty".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
