//! Table rendering for the terminal.

use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use structured_notes_core::models::note::Note;
use structured_notes_core::models::tier::Tier;
use structured_notes_core::models::weights::Weights;
use structured_notes_core::services::enrichment_service::{EnrichmentReport, SNAPSHOT_FIELDS};
use structured_notes_core::services::rank_service::RankedNote;
use structured_notes_core::services::scoring_service::ScoreBreakdown;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn price(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

fn tier_cell(tier: Option<Tier>) -> Cell {
    match tier {
        Some(Tier::High) => Cell::new("high").fg(Color::Green),
        Some(Tier::Medium) => Cell::new("medium").fg(Color::Yellow),
        Some(Tier::Low) => Cell::new("low").fg(Color::Red),
        None => Cell::new(""),
    }
}

/// All notes in display order, 1-based positions.
pub fn notes_table(notes: &[Note], tiers: &[Option<Tier>], capacity: usize) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "#", "Ticker", "Rate", "Buffer", "Memory", "Price", "1Y ago", "52W low", "Target",
        "Named", "Score", "Tier",
    ]);
    for (i, note) in notes.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&note.ticker),
            Cell::new(format!("{:.2}", note.rate)),
            Cell::new(format!("{:.2}", note.buffer)),
            Cell::new(if note.has_memory { "yes" } else { "no" }),
            Cell::new(price(note.current_price)),
            Cell::new(price(note.price_one_year_ago)),
            Cell::new(price(note.low_52_week)),
            Cell::new(price(note.analyst_target_mean)),
            Cell::new(price(note.analyst_target_named)),
            Cell::new(price(note.score)),
            tier_cell(tiers.get(i).copied().flatten()),
        ]);
    }
    format!("{table}\n{}/{capacity} notes", notes.len())
}

pub fn weights_table(weights: &Weights) -> String {
    let mut table = new_table();
    table.set_header(vec!["Weight", "Key", "Value"]);
    for (component, value) in weights.iter() {
        table.add_row(vec![
            component.label().to_string(),
            component.key().to_string(),
            format!("{value:.2}"),
        ]);
    }
    table.to_string()
}

pub fn ranking_table(ranked: &[RankedNote<'_>]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Rank", "#", "Ticker", "Score", "Percentile", "Tier"]);
    for (rank, entry) in ranked.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(entry.index + 1),
            Cell::new(&entry.note.ticker),
            Cell::new(format!("{:.2}", entry.score)),
            Cell::new(format!("{:.2}", entry.percentile)),
            tier_cell(Some(entry.tier)),
        ]);
    }
    table.to_string()
}

pub fn breakdown_table(ticker: &str, breakdown: &ScoreBreakdown) -> String {
    let mut table = new_table();
    table.set_header(vec!["Term", "Contribution"]);
    for (name, value) in breakdown.terms() {
        table.add_row(vec![name.to_string(), format!("{value:.4}")]);
    }
    format!(
        "{ticker}: trigger {:.2}\n{table}\ntotal {:.4}",
        breakdown.trigger,
        breakdown.total()
    )
}

pub fn enrichment_summary(report: &EnrichmentReport) -> String {
    let mut lines: Vec<String> = report
        .outcomes
        .iter()
        .map(|o| match &o.error {
            Some(err) => format!("  {:<8} failed: {err}", o.ticker),
            None => format!("  {:<8} {}/{SNAPSHOT_FIELDS} fields", o.ticker, o.resolved_fields),
        })
        .collect();
    if report.cancelled {
        lines.push("  (cancelled; remaining notes unchanged)".to_string());
    }
    lines.join("\n")
}
