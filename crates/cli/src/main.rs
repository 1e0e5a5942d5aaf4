//! Command-line interface for ranking structured-note candidates.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use structured_notes_core::models::settings::Settings;
use structured_notes_core::NoteRanker;

mod render;
mod shell;

#[derive(Debug, Parser)]
#[command(name = "notes-ranker")]
#[command(about = "Score and rank structured-note candidates with market data", long_about = None)]
struct Args {
    /// JSON settings file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pause between tickers while fetching, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Timeout of a single network request, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Analyst firm whose price target fills the named-target column
    #[arg(long)]
    analyst: Option<String>,

    /// Directory for exported reports
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Log filter when RUST_LOG is not set (e.g. "info", "structured_notes_core=debug")
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive session (default)
    Shell,
    /// Import notes from a spreadsheet, score them and print the ranking
    Rank {
        /// Spreadsheet with at least Ticker, Rate and Buffer columns
        #[arg(long)]
        input: PathBuf,

        /// Fetch market data before scoring
        #[arg(long)]
        fetch: bool,

        /// Also write the dated report into this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

impl Args {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_json_file(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => Settings::default(),
        };
        if let Some(delay) = self.delay_ms {
            settings.request_delay_ms = delay;
        }
        if let Some(timeout) = self.timeout_secs {
            settings.request_timeout_secs = timeout;
        }
        if let Some(analyst) = &self.analyst {
            settings.named_analyst = analyst.clone();
        }
        if let Some(dir) = &self.export_dir {
            settings.export_dir = dir.clone();
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let settings = args.settings()?;
    tracing::debug!(?settings, "settings resolved");
    let ranker = NoteRanker::create_new(settings).context("starting session")?;

    match args.command.unwrap_or(Command::Shell) {
        Command::Shell => shell::run(ranker).await,
        Command::Rank {
            input,
            fetch,
            export,
        } => rank(ranker, input, fetch, export).await,
    }
}

async fn rank(
    mut ranker: NoteRanker,
    input: PathBuf,
    fetch: bool,
    export: Option<PathBuf>,
) -> anyhow::Result<()> {
    let imported = ranker
        .import_report(&input)
        .with_context(|| format!("importing {}", input.display()))?;
    for (row, reason) in &imported.skipped {
        eprintln!("warning: row {row} skipped: {reason}");
    }
    if ranker.notes().is_empty() {
        anyhow::bail!("no usable notes in {}", input.display());
    }

    if fetch {
        let report = ranker.enrich_all().await;
        println!("{}", render::enrichment_summary(&report));
    }

    ranker.compute_scores();
    println!("{}", render::ranking_table(&ranker.ranking()));

    if let Some(dir) = export {
        let path = ranker
            .export_report_to(&dir)
            .with_context(|| format!("exporting to {}", dir.display()))?;
        println!("report written to {}", path.display());
    }
    Ok(())
}
