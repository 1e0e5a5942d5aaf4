//! Line-oriented interactive session over a `NoteRanker`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use structured_notes_core::errors::CoreError;
use structured_notes_core::models::note::NoteInput;
use structured_notes_core::models::weights::WeightComponent;
use structured_notes_core::NoteRanker;

use crate::render;

#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Subcommand)]
enum ShellCommand {
    /// Add a note: TICKER RATE BUFFER [--memory]
    Add {
        ticker: String,
        rate: f64,
        buffer: f64,
        /// The note pays a memory coupon
        #[arg(short, long)]
        memory: bool,
    },
    /// Remove the note at a position (as shown by `list`)
    Remove { position: usize },
    /// Show all notes
    #[command(alias = "ls")]
    List,
    /// Show the active weights
    Weights,
    /// Set one weight in [0, 1], e.g. `weight targetMeanGap 0.12`
    Weight { name: String, value: f64 },
    /// Restore the baseline weights
    ResetWeights,
    /// Fetch market data for every note (Ctrl-C stops after the current ticker)
    Fetch,
    /// Compute scores with the current weights
    Score,
    /// Show the per-term breakdown of one note's score
    Explain { position: usize },
    /// Show scored notes, best first
    Rank,
    /// Write the dated spreadsheet report
    Export { dir: Option<PathBuf> },
    /// Append notes from a spreadsheet
    Import { file: PathBuf },
    /// Remove every note
    Clear,
    /// Leave the session
    #[command(alias = "exit")]
    Quit,
}

enum Flow {
    Continue,
    Quit,
}

/// Run the interactive loop until `quit` or end of input.
pub async fn run(mut ranker: NoteRanker) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Structured notes ranker. Type `help` for commands.");
    loop {
        stdout.write_all(b"notes> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("reading input")? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let parsed = match ShellLine::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => parsed,
            Err(e) => {
                // clap renders help and usage errors itself
                let _ = e.print();
                continue;
            }
        };

        match execute(&mut ranker, parsed.command).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => match e.downcast_ref::<CoreError>() {
                Some(core) if core.is_validation() => println!("warning: {core}"),
                _ => println!("error: {e:#}"),
            },
        }
    }
    Ok(())
}

async fn execute(ranker: &mut NoteRanker, command: ShellCommand) -> anyhow::Result<Flow> {
    match command {
        ShellCommand::Add {
            ticker,
            rate,
            buffer,
            memory,
        } => {
            let index = ranker.add_note(NoteInput::new(ticker, rate, buffer, memory))?;
            let capacity = ranker.working_set().capacity();
            println!(
                "added {} ({}/{capacity})",
                ranker.notes()[index].ticker,
                ranker.notes().len()
            );
        }
        ShellCommand::Remove { position } => {
            let index = to_index(ranker, position)?;
            let removed = ranker.remove_note(index)?;
            println!("removed {}", removed.ticker);
        }
        ShellCommand::List => {
            if ranker.notes().is_empty() {
                println!("no notes yet");
            } else {
                let tiers = ranker.tiers();
                println!(
                    "{}",
                    render::notes_table(ranker.notes(), &tiers, ranker.working_set().capacity())
                );
            }
        }
        ShellCommand::Weights => println!("{}", render::weights_table(ranker.weights())),
        ShellCommand::Weight { name, value } => {
            let component: WeightComponent = name.parse()?;
            ranker.set_weight(component, value)?;
            println!("{component} = {:.2} (scores cleared)", ranker.weights().get(component));
        }
        ShellCommand::ResetWeights => {
            ranker.reset_weights();
            println!("weights reset (scores cleared)");
        }
        ShellCommand::Fetch => {
            if ranker.notes().is_empty() {
                println!("no notes to fetch");
                return Ok(Flow::Continue);
            }
            let cancel = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&cancel);
            let watcher = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    flag.store(true, Ordering::SeqCst);
                }
            });
            let report = ranker.enrich_until_cancelled(&cancel).await;
            watcher.abort();
            println!("{}", render::enrichment_summary(&report));
        }
        ShellCommand::Score => {
            let scored = ranker.compute_scores();
            println!("scored {scored} notes");
        }
        ShellCommand::Explain { position } => {
            let index = to_index(ranker, position)?;
            let breakdown = ranker.explain(index)?;
            println!("{}", render::breakdown_table(&ranker.notes()[index].ticker, &breakdown));
        }
        ShellCommand::Rank => {
            let ranked = ranker.ranking();
            if ranked.is_empty() {
                println!("no scores yet; run `score` first");
            } else {
                println!("{}", render::ranking_table(&ranked));
            }
        }
        ShellCommand::Export { dir } => {
            let path = match dir {
                Some(dir) => ranker.export_report_to(&dir)?,
                None => ranker.export_report()?,
            };
            println!("report written to {}", path.display());
        }
        ShellCommand::Import { file } => {
            let imported = ranker.import_report(&file)?;
            println!("imported {} notes", imported.rows.len());
            for (row, reason) in &imported.skipped {
                println!("warning: row {row} skipped: {reason}");
            }
        }
        ShellCommand::Clear => {
            let removed = ranker.clear_notes();
            println!("removed {removed} notes");
        }
        ShellCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Convert a 1-based display position to an index into the notes.
fn to_index(ranker: &NoteRanker, position: usize) -> Result<usize, CoreError> {
    let len = ranker.notes().len();
    if position == 0 || position > len {
        return Err(CoreError::ValidationError(format!(
            "No note at position {position} (have {len})"
        )));
    }
    Ok(position - 1)
}
