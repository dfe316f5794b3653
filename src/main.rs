//! Novina main entry point
//!
//! This is the command-line interface for the news-archive harvester.

use anyhow::Context;
use clap::{Parser, Subcommand};
use novina::config::{load_config_with_hash, Config};
use novina::pipeline::{parse_batch_range, Pipeline};
use novina::HarvestError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Novina: a resumable news-archive harvester
///
/// Novina walks a news site's category and archive listings, extracts every
/// article it finds, drops foreign-language content, and writes one
/// deduplicated text corpus. Interrupted runs resume from the last
/// checkpoint.
#[derive(Parser, Debug)]
#[command(name = "novina")]
#[command(version)]
#[command(about = "A resumable news-archive harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk listings and seal new article links into batches
    Collect {
        /// Discard existing batches and everything derived from them
        #[arg(long)]
        fresh: bool,
    },

    /// Fetch and extract the articles of pending batches
    Process {
        /// Only these batches, e.g. "1-5" or "7,9,12"
        #[arg(long, value_name = "RANGE")]
        batches: Option<String>,
    },

    /// Split completed batches into local and foreign articles
    Filter,

    /// Deduplicate local articles into the final corpus and report
    Combine,

    /// Run every stage in order
    Run {
        /// Discard existing batches and everything derived from them
        #[arg(long)]
        fresh: bool,
    },

    /// Show per-batch progress
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let stop = Arc::new(AtomicBool::new(false));
    spawn_interrupt_handler(Arc::clone(&stop));

    let mut pipeline = Pipeline::new(config.clone(), config_hash)?.with_stop_flag(stop);

    let result = handle_command(&mut pipeline, &config, cli.command).await;
    pipeline.stats().log_summary();

    match result {
        Err(HarvestError::Cancelled) => {
            tracing::warn!("Interrupted; progress is checkpointed, rerun to resume");
            std::process::exit(130);
        }
        Err(e) => Err(e.into()),
        Ok(()) => Ok(()),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("novina=info,warn"),
            1 => EnvFilter::new("novina=debug,info"),
            2 => EnvFilter::new("novina=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// First Ctrl-C asks the stages to stop after in-flight work; a second one
/// exits immediately
fn spawn_interrupt_handler(stop: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("Interrupt received, finishing in-flight work (Ctrl-C again to abort)");
        stop.store(true, Ordering::SeqCst);

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

async fn handle_command(
    pipeline: &mut Pipeline,
    config: &Config,
    command: Command,
) -> novina::Result<()> {
    match command {
        Command::Collect { fresh } => {
            let outcome = pipeline.collect(fresh).await?;
            println!(
                "Collected {} new links into {} batches ({} total, {} listing pages failed)",
                outcome.new_links,
                outcome.sealed.len(),
                outcome.index.batches.len(),
                outcome.failed_pages
            );
        }
        Command::Process { batches } => {
            let selection = batches.as_deref().map(parse_batch_range).transpose()?;
            let reports = pipeline.process(selection.as_ref()).await?;
            for report in reports.iter().filter(|r| !r.skipped) {
                println!(
                    "Batch {}: {} ({} articles, {} failed, {} soft-rejected)",
                    report.batch_id,
                    report.status,
                    report.succeeded,
                    report.failed,
                    report.soft_rejected
                );
            }
        }
        Command::Filter => {
            let summary = pipeline.filter()?;
            println!(
                "Filtered {} articles: {} local ({} mixed), {} foreign",
                summary.articles_in, summary.local, summary.mixed, summary.foreign
            );
        }
        Command::Combine => {
            let report = pipeline.combine()?;
            print_final(pipeline, config, &report);
        }
        Command::Run { fresh } => {
            let report = pipeline.run(fresh).await?;
            print_final(pipeline, config, &report);
        }
        Command::Status => {
            let lines = pipeline.status()?;
            if lines.is_empty() {
                println!("No link batches yet");
            }
            for line in lines {
                println!(
                    "Batch {:>4}  {:<11}  {:>5}/{:<5} ok {:>5}  failed {:>4}  short {:>4}",
                    line.id,
                    line.status,
                    line.watermark,
                    line.links,
                    line.succeeded,
                    line.failed,
                    line.soft_rejected
                );
            }
        }
    }
    Ok(())
}

fn print_final(pipeline: &Pipeline, config: &Config, report: &novina::output::RunReport) {
    let corpus = pipeline.layout().final_dir().join(&config.output.corpus_file);
    println!(
        "✓ {} articles ({} duplicates removed) written to {}",
        report.final_articles,
        report.duplicates_removed,
        corpus.display()
    );
    println!(
        "✓ Report written to {}",
        pipeline.layout().report_markdown_path().display()
    );
}
