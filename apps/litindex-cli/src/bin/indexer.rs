use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::error;

use litindex_core::config::{expand_path, Config};
use litindex_core::normalize::Normalizer;
use litindex_core::{dataset, BatchDriver, BatchReport, OpenMode, Schema, SchemaVariant};
use litindex_text::TantivyBackend;

/// Index a batch of publication records into a search store.
///
/// Per-row failures (bad dates, unknown fields) are listed in the summary
/// and do not change the exit code. Store failures exit with status 2.
#[derive(Parser, Debug)]
#[command(name = "litindex-indexer", about = "Index a tabular publication batch into a search store")]
struct Args {
    /// JSON array, JSON-lines file, or directory of such files
    input: String,

    /// Index store directory
    store: String,

    /// create (discard existing content) or append
    mode: OpenMode,

    /// Separator for multi-valued columns (default from config, else a space)
    #[arg(long)]
    delimiter: Option<String>,

    /// Field catalog: publications or cord19
    #[arg(long)]
    schema: Option<SchemaVariant>,

    /// Print the batch report as JSON
    #[arg(long)]
    json: bool,
}

enum Failure {
    Setup(anyhow::Error),
    Store(anyhow::Error),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Setup(e)) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
        Err(Failure::Store(e)) => {
            error!("{:#}", e);
            eprintln!("Store error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> Result<(), Failure> {
    let config = Config::load().context("Error loading config").map_err(Failure::Setup)?;
    let settings = config.indexer().map_err(Failure::Setup)?;
    let delimiter = args.delimiter.clone().unwrap_or(settings.delimiter);
    let normalizer = Normalizer::new(&delimiter).map_err(|e| Failure::Setup(e.into()))?;
    let schema = Schema::for_variant(args.schema.unwrap_or(settings.schema));

    let input = expand_path(&args.input);
    let store = expand_path(&args.store);
    let rows = dataset::load(&input).map_err(|e| Failure::Setup(e.into()))?;

    let progress = ProgressBar::new(rows.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({percent}%)")
            .map_err(|e| Failure::Setup(e.into()))?
            .progress_chars("#>-"),
    );
    if args.json { progress.set_draw_target(indicatif::ProgressDrawTarget::hidden()); }

    let backend = TantivyBackend::new(settings.writer_heap_bytes);
    let driver = BatchDriver::new(&backend)
        .with_normalizer(normalizer)
        .with_max_skip_reasons(settings.max_skip_reasons)
        .with_progress(progress);

    match driver.run(rows, &schema, &store, args.mode) {
        Ok(report) => print_report(&report, args.json).map_err(Failure::Setup),
        Err(aborted) => {
            print_report(&aborted.report, args.json).map_err(Failure::Setup)?;
            Err(Failure::Store(anyhow::Error::new(aborted)))
        }
    }
}

fn print_report(report: &BatchReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}
