pub mod errors;
pub mod models;
pub mod numeric;
pub mod providers;
pub mod services;

use chrono::NaiveDate;
use models::{
    note::{Note, NoteInput},
    settings::Settings,
    tier::Tier,
    weights::{WeightComponent, Weights},
    working_set::WorkingSet,
};
use providers::{traits::MarketDataProvider, yahoo_finance::YahooFinanceProvider};
use services::{
    enrichment_service::{EnrichmentReport, EnrichmentService},
    export_service::{ImportedReport, ReportExporter},
    rank_service::{self, RankedNote},
    scoring_service::{self, ScoreBreakdown},
};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use errors::CoreError;

/// Main entry point for the structured-notes core library.
///
/// One `NoteRanker` is one analyst session: it owns the working set (notes
/// and weights) plus the services that enrich, score and export it. Nothing
/// is persisted; dropping the ranker discards the session.
#[must_use]
pub struct NoteRanker {
    working_set: WorkingSet,
    settings: Settings,
    enrichment_service: EnrichmentService,
    exporter: ReportExporter,
}

impl std::fmt::Debug for NoteRanker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteRanker")
            .field("notes", &self.working_set.len())
            .field("weights", self.working_set.weights())
            .field("provider", &self.enrichment_service.provider_name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl NoteRanker {
    /// New session backed by Yahoo Finance.
    pub fn create_new(settings: Settings) -> Result<Self, CoreError> {
        let provider = YahooFinanceProvider::new(&settings)?;
        Self::with_provider(settings, Box::new(provider))
    }

    /// New session backed by a custom market-data provider.
    pub fn with_provider(
        settings: Settings,
        provider: Box<dyn MarketDataProvider>,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let enrichment_service = EnrichmentService::new(provider, settings.request_delay());
        Ok(Self {
            working_set: WorkingSet::with_capacity(settings.max_notes),
            settings,
            enrichment_service,
            exporter: ReportExporter::new(),
        })
    }

    // ── Notes ───────────────────────────────────────────────────────

    /// Validate and append a note. Returns its position.
    pub fn add_note(&mut self, input: NoteInput) -> Result<usize, CoreError> {
        let note = self.working_set.add_note(input)?;
        tracing::debug!(ticker = %note.ticker, "note added");
        Ok(self.working_set.len() - 1)
    }

    /// Remove the note at `index`.
    pub fn remove_note(&mut self, index: usize) -> Result<Note, CoreError> {
        self.working_set.remove_note(index)
    }

    /// Remove every note. Returns how many were removed.
    pub fn clear_notes(&mut self) -> usize {
        self.working_set.clear()
    }

    #[must_use]
    pub fn notes(&self) -> &[Note] {
        self.working_set.notes()
    }

    #[must_use]
    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    // ── Weights ─────────────────────────────────────────────────────

    #[must_use]
    pub fn weights(&self) -> &Weights {
        self.working_set.weights()
    }

    /// Set one weight (in [0, 1]). Clears existing scores.
    pub fn set_weight(&mut self, component: WeightComponent, value: f64) -> Result<(), CoreError> {
        self.working_set.set_weight(component, value)
    }

    /// Restore the baseline weights. Clears existing scores.
    pub fn reset_weights(&mut self) {
        self.working_set.reset_weights();
    }

    // ── Enrichment ──────────────────────────────────────────────────

    /// Fetch market data for every note, one ticker at a time.
    pub async fn enrich_all(&mut self) -> EnrichmentReport {
        self.enrichment_service.enrich_all(&mut self.working_set).await
    }

    /// Like `enrich_all`, stopping before the next ticker once `cancel` is set.
    pub async fn enrich_until_cancelled(&mut self, cancel: &AtomicBool) -> EnrichmentReport {
        self.enrichment_service
            .enrich_until_cancelled(&mut self.working_set, cancel)
            .await
    }

    // ── Scoring & ranking ───────────────────────────────────────────

    /// Score every note with the current weights.
    pub fn compute_scores(&mut self) -> usize {
        scoring_service::score_all(&mut self.working_set)
    }

    /// Per-term breakdown of the note at `index` under the current weights.
    pub fn explain(&self, index: usize) -> Result<ScoreBreakdown, CoreError> {
        let note = self
            .working_set
            .get(index)
            .ok_or(CoreError::NoteNotFound(index))?;
        Ok(ScoreBreakdown::compute(note, self.working_set.weights()))
    }

    /// Tier of each note, in note order (`None` when unscored).
    #[must_use]
    pub fn tiers(&self) -> Vec<Option<Tier>> {
        rank_service::classify_notes(self.working_set.notes())
    }

    /// Scored notes, best first.
    #[must_use]
    pub fn ranking(&self) -> Vec<RankedNote<'_>> {
        rank_service::rank(&self.working_set)
    }

    // ── Reports ─────────────────────────────────────────────────────

    /// Export to the configured directory, named with today's date.
    pub fn export_report(&self) -> Result<PathBuf, CoreError> {
        let dir = self.settings.export_dir.clone();
        self.export_report_to(&dir)
    }

    /// Export into `dir`, named with today's date.
    pub fn export_report_to(&self, dir: &Path) -> Result<PathBuf, CoreError> {
        let today = chrono::Local::now().date_naive();
        self.export_report_dated(dir, today)
    }

    pub fn export_report_dated(&self, dir: &Path, date: NaiveDate) -> Result<PathBuf, CoreError> {
        self.exporter
            .export_to_dir(&self.working_set, dir, &self.settings.export_prefix, date)
    }

    /// Render the report in memory.
    pub fn export_report_bytes(&self) -> Result<Vec<u8>, CoreError> {
        self.exporter.to_bytes(&self.working_set)
    }

    /// Append notes from a report file. Imported scores are discarded (call
    /// `compute_scores`). Rows beyond capacity are skipped, like invalid rows.
    pub fn import_report(&mut self, path: &Path) -> Result<ImportedReport, CoreError> {
        let imported = self.exporter.read_report(path)?;
        Ok(self.append_imported(imported))
    }

    fn append_imported(&mut self, imported: ImportedReport) -> ImportedReport {
        let mut result = ImportedReport {
            rows: Vec::new(),
            skipped: imported.skipped,
        };
        for imported_row in imported.rows {
            match self.working_set.push_note(imported_row.note.clone()) {
                Ok(()) => result.rows.push(imported_row),
                Err(e) => {
                    tracing::warn!(row = imported_row.row, error = %e, "note not imported");
                    result.skipped.push((imported_row.row, e.to_string()));
                }
            }
        }
        result.skipped.sort_by_key(|(row, _)| *row);
        tracing::info!(
            imported = result.rows.len(),
            skipped = result.skipped.len(),
            "report imported"
        );
        result
    }
}
