use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use antecede::batch::{self, BatchConfig};
use antecede::reader::{JsonlReader, ReaderConfig};

#[derive(Parser, Debug)]
#[command(name = "antecede")]
#[command(about = "Rewrites pronoun mentions with their canonical antecedents in pre-segmented paragraphs")]
#[command(version)]
struct Args {
    /// Input JSONL file of paragraph records with precomputed clusters
    input: PathBuf,

    /// Output JSONL file with rewritten sentences
    output: PathBuf,

    /// Record field whose string value must survive rewriting untouched
    /// (e.g. "answer")
    #[arg(long)]
    exclude_field: Option<String>,

    /// Abort on first malformed record or read error
    #[arg(long)]
    fail_fast: bool,

    /// Suppress console progress bar
    #[arg(long)]
    no_progress: bool,

    /// Number of records processed concurrently (default: logical CPUs)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Stats output file path
    #[arg(long, default_value = "run_stats.json")]
    stats_out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .json()
        .init();

    let args = Args::parse();

    info!("Starting antecede");
    info!(?args, "Parsed CLI arguments");

    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }
    if !args.input.is_file() {
        anyhow::bail!("Input path is not a file: {}", args.input.display());
    }

    let reader = JsonlReader::new(ReaderConfig {
        fail_fast: args.fail_fast,
        ..Default::default()
    });
    let (lines, read_stats) = reader.read_records(&args.input).await?;

    info!(
        "Read {} records from {} ({} lines, {} bytes)",
        read_stats.records_parsed,
        args.input.display(),
        read_stats.lines_read,
        read_stats.bytes_read
    );

    let config = BatchConfig {
        concurrency: args.concurrency.unwrap_or_else(num_cpus::get),
        exclude_field: args.exclude_field.clone(),
        show_progress: !args.no_progress,
    };

    let (output_lines, run_stats) = batch::process_records(lines, &config).await?;

    batch::write_output_file(&args.output, &output_lines).await?;
    batch::write_run_stats(&args.stats_out, &run_stats).await?;

    info!(
        "Wrote {} records to {} ({} rewritten, {} unchanged, {} fallbacks, {} passthrough)",
        run_stats.records,
        args.output.display(),
        run_stats.rewritten,
        run_stats.unchanged,
        run_stats.fallbacks,
        run_stats.passthrough
    );

    println!("antecede v{} - replacement complete", env!("CARGO_PKG_VERSION"));
    println!("Records processed: {}", run_stats.records);
    println!("  Rewritten: {}", run_stats.rewritten);
    println!("  Unchanged: {}", run_stats.unchanged);
    if run_stats.fallbacks > 0 {
        println!("  Fallbacks: {}", run_stats.fallbacks);
    }
    if run_stats.passthrough > 0 {
        println!("  Passthrough lines: {}", run_stats.passthrough);
    }
    println!("Total edits applied: {}", run_stats.total_edits);
    println!("Elapsed: {}ms", run_stats.elapsed_ms);
    println!("Stats written to: {}", args.stats_out.display());

    Ok(())
}
