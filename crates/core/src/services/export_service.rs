use calamine::{Data, Reader, Xlsx};
use chrono::NaiveDate;
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook, Worksheet};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::errors::CoreError;
use crate::models::market::MarketSnapshot;
use crate::models::note::{Note, NoteInput};
use crate::models::tier::Tier;
use crate::models::working_set::WorkingSet;
use crate::numeric::round2;
use crate::providers::price_target::parse_price;
use crate::services::rank_service::classify_notes;

pub const SHEET_NAME: &str = "Notes";

/// Row fills per tier (Excel's good / neutral / bad palette).
pub const HIGH_TIER_FILL: u32 = 0xC6EFCE;
pub const MEDIUM_TIER_FILL: u32 = 0xFFEB9C;
pub const LOW_TIER_FILL: u32 = 0xFFC7CE;

const NUMBER_FORMAT: &str = "0.00";

/// Report columns, in order.
pub const COLUMNS: [&str; 11] = [
    "Ticker",
    "Rate",
    "Buffer",
    "Memory",
    "Current Price",
    "Price 1Y Ago",
    "52W Low",
    "Target Mean",
    "Target Named",
    "Score",
    "Tier",
];

const COL_TICKER: u16 = 0;
const COL_RATE: u16 = 1;
const COL_BUFFER: u16 = 2;
const COL_MEMORY: u16 = 3;
const COL_CURRENT: u16 = 4;
const COL_YEAR_AGO: u16 = 5;
const COL_LOW_52: u16 = 6;
const COL_TARGET_MEAN: u16 = 7;
const COL_TARGET_NAMED: u16 = 8;
const COL_SCORE: u16 = 9;
const COL_TIER: u16 = 10;

/// Fill color of a tier's rows.
#[must_use]
pub fn tier_fill(tier: Tier) -> u32 {
    match tier {
        Tier::High => HIGH_TIER_FILL,
        Tier::Medium => MEDIUM_TIER_FILL,
        Tier::Low => LOW_TIER_FILL,
    }
}

/// Fill of a report row: its tier's color, or none for unscored notes.
#[must_use]
pub fn row_fill(tier: Option<Tier>) -> Option<u32> {
    tier.map(tier_fill)
}

/// Dated report file name, e.g. `notes_2025-04-22.xlsx`.
#[must_use]
pub fn report_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{}.xlsx", date.format("%Y-%m-%d"))
}

/// A note read from one spreadsheet row (1-based, as shown by Excel).
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedRow {
    pub row: usize,
    pub note: Note,
}

/// Notes read back from a report, plus the rows that could not be used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedReport {
    pub rows: Vec<ImportedRow>,
    /// `(spreadsheet row number, reason)` for rejected rows
    pub skipped: Vec<(usize, String)>,
}

impl ImportedReport {
    /// The imported notes, in sheet order.
    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.rows.iter().map(|r| &r.note)
    }
}

/// Cell formats for one row band.
struct RowFormats {
    text: Format,
    number: Format,
}

impl RowFormats {
    fn new(fill: Option<u32>) -> Self {
        let text = Format::new();
        let number = Format::new().set_num_format(NUMBER_FORMAT);
        match fill {
            Some(rgb) => Self {
                text: text
                    .set_pattern(FormatPattern::Solid)
                    .set_background_color(Color::RGB(rgb)),
                number: number
                    .set_pattern(FormatPattern::Solid)
                    .set_background_color(Color::RGB(rgb)),
            },
            None => Self { text, number },
        }
    }
}

/// Renders a working set to an `.xlsx` report and reads such reports back.
pub struct ReportExporter;

impl ReportExporter {
    pub fn new() -> Self {
        Self
    }

    /// Write the report into `dir` under a name carrying `date`.
    /// Returns the path written.
    pub fn export_to_dir(
        &self,
        set: &WorkingSet,
        dir: &Path,
        prefix: &str,
        date: NaiveDate,
    ) -> Result<PathBuf, CoreError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(report_file_name(prefix, date));
        self.write_report(set, &path)?;
        Ok(path)
    }

    /// Write the report to `path`. Refused when no note has a score.
    pub fn write_report(&self, set: &WorkingSet, path: &Path) -> Result<(), CoreError> {
        let mut workbook = self.build_workbook(set)?;
        workbook.save(path)?;
        tracing::info!(path = %path.display(), notes = set.len(), "report written");
        Ok(())
    }

    /// Render the report in memory.
    pub fn to_bytes(&self, set: &WorkingSet) -> Result<Vec<u8>, CoreError> {
        let mut workbook = self.build_workbook(set)?;
        Ok(workbook.save_to_buffer()?)
    }

    fn build_workbook(&self, set: &WorkingSet) -> Result<Workbook, CoreError> {
        if !set.has_scores() {
            return Err(CoreError::NothingToExport);
        }

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        let header = Format::new().set_bold();
        for (col, title) in COLUMNS.iter().enumerate() {
            let col = col as u16;
            sheet.write_string_with_format(0, col, *title, &header)?;
            sheet.set_column_width(col, 14)?;
        }

        let tiers = classify_notes(set.notes());
        for (i, (note, tier)) in set.notes().iter().zip(tiers).enumerate() {
            let row = (i + 1) as u32;
            let fill = row_fill(tier);
            let formats = RowFormats::new(fill);
            write_note_row(sheet, row, note, tier, &formats, fill.is_some())?;
        }

        Ok(workbook)
    }

    // ── Import ──────────────────────────────────────────────────────

    /// Read notes from a report file on disk.
    pub fn read_report(&self, path: &Path) -> Result<ImportedReport, CoreError> {
        let bytes = std::fs::read(path)
            .map_err(|e| CoreError::FileIO(format!("{}: {e}", path.display())))?;
        self.read_report_bytes(bytes)
    }

    /// Read notes from report bytes. Columns are matched by header name
    /// (case-insensitive; "Tasa"/"Colchón" are accepted for rate/buffer),
    /// so hand-made sheets with extra or reordered columns load too.
    ///
    /// The header is the first row naming the required columns; title or
    /// blank rows above it are ignored.
    pub fn read_report_bytes(&self, bytes: Vec<u8>) -> Result<ImportedReport, CoreError> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
        let range = match workbook.worksheet_range(SHEET_NAME) {
            Ok(range) => range,
            Err(_) => workbook
                .worksheet_range_at(0)
                .ok_or_else(|| CoreError::Import("Workbook has no sheets".into()))??,
        };

        // The range starts at the first used cell, not necessarily A1.
        let first_row = range.start().map_or(0, |(row, _)| row as usize);
        let mut rows = range.rows().enumerate();
        let mut header_error = None;
        let columns = loop {
            let Some((_, row)) = rows.next() else {
                return Err(header_error
                    .unwrap_or_else(|| CoreError::Import("Sheet is empty".into())));
            };
            if is_blank(row) {
                continue;
            }
            match ColumnMap::from_header(row) {
                Ok(columns) => break columns,
                Err(e) => {
                    header_error.get_or_insert(e);
                }
            }
        };

        let mut report = ImportedReport::default();
        for (offset, row) in rows {
            let row_number = first_row + offset + 1;
            if is_blank(row) {
                continue;
            }
            match columns.note_from_row(row) {
                Ok(note) => report.rows.push(ImportedRow {
                    row: row_number,
                    note,
                }),
                Err(e) => {
                    tracing::warn!(row = row_number, error = %e, "skipping report row");
                    report.skipped.push((row_number, e.to_string()));
                }
            }
        }
        Ok(report)
    }
}

impl Default for ReportExporter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_note_row(
    sheet: &mut Worksheet,
    row: u32,
    note: &Note,
    tier: Option<Tier>,
    formats: &RowFormats,
    filled: bool,
) -> Result<(), CoreError> {
    sheet.write_string_with_format(row, COL_TICKER, &note.ticker, &formats.text)?;
    sheet.write_number_with_format(row, COL_RATE, round2(note.rate), &formats.number)?;
    sheet.write_number_with_format(row, COL_BUFFER, round2(note.buffer), &formats.number)?;
    sheet.write_boolean_with_format(row, COL_MEMORY, note.has_memory, &formats.text)?;

    let optional = [
        (COL_CURRENT, note.current_price),
        (COL_YEAR_AGO, note.price_one_year_ago),
        (COL_LOW_52, note.low_52_week),
        (COL_TARGET_MEAN, note.analyst_target_mean),
        (COL_TARGET_NAMED, note.analyst_target_named),
        (COL_SCORE, note.score),
    ];
    for (col, value) in optional {
        match value {
            Some(v) => {
                sheet.write_number_with_format(row, col, round2(v), &formats.number)?;
            }
            // Blank cells only carry the row fill; unfilled blanks stay empty.
            None if filled => {
                sheet.write_blank(row, col, &formats.number)?;
            }
            None => {}
        }
    }

    match tier {
        Some(t) => {
            sheet.write_string_with_format(row, COL_TIER, t.to_string(), &formats.text)?;
        }
        None if filled => {
            sheet.write_blank(row, COL_TIER, &formats.text)?;
        }
        None => {}
    }
    Ok(())
}

/// Header-name → column index lookup for imports.
struct ColumnMap {
    ticker: usize,
    rate: usize,
    buffer: usize,
    memory: Option<usize>,
    current: Option<usize>,
    year_ago: Option<usize>,
    low_52: Option<usize>,
    target_mean: Option<usize>,
    target_named: Option<usize>,
    score: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &[Data]) -> Result<Self, CoreError> {
        let names: Vec<String> = header
            .iter()
            .map(|c| c.to_string().trim().to_lowercase())
            .collect();
        let find = |aliases: &[&str]| names.iter().position(|n| aliases.contains(&n.as_str()));
        let require = |aliases: &[&str]| {
            find(aliases).ok_or_else(|| {
                CoreError::Import(format!("Missing required column '{}'", aliases[0]))
            })
        };

        Ok(Self {
            ticker: require(&["ticker"])?,
            rate: require(&["rate", "tasa", "tasa (%)"])?,
            buffer: require(&["buffer", "colchón", "colchon", "colchón (%)"])?,
            memory: find(&["memory"]),
            current: find(&["current price", "precio actual"]),
            year_ago: find(&["price 1y ago", "hace 1 año"]),
            low_52: find(&["52w low", "min 1y"]),
            target_mean: find(&["target mean", "target yahoo", "target yhoo"]),
            target_named: find(&["target named", "target ms"]),
            score: find(&["score"]),
        })
    }

    fn note_from_row(&self, row: &[Data]) -> Result<Note, CoreError> {
        let cell = |idx: usize| row.get(idx).unwrap_or(&Data::Empty);
        let number = |idx: Option<usize>| idx.and_then(|i| cell_number(cell(i)));

        let ticker = cell(self.ticker).to_string();
        let rate = cell_number(cell(self.rate)).ok_or_else(|| {
            CoreError::ValidationError(format!("Rate is missing or not a number for '{ticker}'"))
        })?;
        let buffer = cell_number(cell(self.buffer)).ok_or_else(|| {
            CoreError::ValidationError(format!("Buffer is missing or not a number for '{ticker}'"))
        })?;
        let has_memory = self.memory.map(|i| cell_bool(cell(i))).unwrap_or(false);

        let mut note = Note::new(NoteInput::new(ticker, rate, buffer, has_memory))?;
        note.apply_market(
            MarketSnapshot {
                current_price: number(self.current),
                price_one_year_ago: number(self.year_ago),
                low_52_week: number(self.low_52),
                analyst_target_mean: number(self.target_mean),
                analyst_target_named: number(self.target_named),
            }
            .normalized(),
        );
        note.score = number(self.score).map(round2);
        Ok(note)
    }
}

fn is_blank(row: &[Data]) -> bool {
    row.iter().all(|c| matches!(c, Data::Empty))
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => parse_price(s.trim().trim_end_matches('%')),
        _ => None,
    }
}

fn cell_bool(cell: &Data) -> bool {
    match cell {
        Data::Bool(b) => *b,
        Data::Float(f) => *f != 0.0,
        Data::Int(i) => *i != 0,
        Data::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "y" | "x" | "si" | "sí" | "1"
        ),
        _ => false,
    }
}
