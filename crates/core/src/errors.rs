use thiserror::Error;

/// Unified error type for the structured-notes core library.
/// Every public fallible function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input validation ────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Working set is full: at most {max} notes allowed")]
    CapacityExceeded { max: usize },

    #[error("Note not found at position {0}")]
    NoteNotFound(usize),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    // ── Report export / import ──────────────────────────────────────
    #[error("Nothing to export: no note has a computed score")]
    NothingToExport,

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Import failed: {0}")]
    Import(String),

    // ── File I/O & configuration ────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CoreError {
    /// Validation-class errors are rejected before any state mutation and are
    /// fully recoverable by the user.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::ValidationError(_)
                | CoreError::CapacityExceeded { .. }
                | CoreError::NoteNotFound(_)
        )
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Strip query parameters: upstream URLs may carry session crumbs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}

impl From<rust_xlsxwriter::XlsxError> for CoreError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        CoreError::Export(e.to_string())
    }
}

impl From<calamine::XlsxError> for CoreError {
    fn from(e: calamine::XlsxError) -> Self {
        CoreError::Import(e.to_string())
    }
}
