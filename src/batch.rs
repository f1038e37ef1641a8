// Parallel batch processing across records. Each record's working sentence
// copy and pending-edit list are exclusively owned by the blocking worker
// handling it; output order always equals input order.

use anyhow::{anyhow, Result};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Instant;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::task;
use tracing::warn;

use crate::reader::InputLine;
use crate::replacer::{joined_text, rewrite_paragraph_outcome};

/// Configuration for batch processing behavior
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of records processed concurrently
    pub concurrency: usize,
    /// Record field whose string value is protected from replacement
    pub exclude_field: Option<String>,
    /// Show a console progress bar
    pub show_progress: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: num_cpus::get(),
            exclude_field: None,
            show_progress: false,
        }
    }
}

/// Per-record processing statistics
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RecordStats {
    /// Zero-based record index in the input file
    pub index: usize,
    /// Number of sentences in the record's paragraph
    pub sentences: usize,
    /// Number of clusters reported for the paragraph
    pub clusters: usize,
    /// Candidate edits before overlap resolution
    pub candidates: usize,
    /// Edits actually spliced into sentences
    pub edits_applied: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    /// Processing status (rewritten, unchanged, fallback, passthrough)
    pub status: String,
    /// Error message if the record fell back or failed to parse
    pub error: Option<String>,
}

/// Whole-run statistics, written next to the output file
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunStats {
    pub records: usize,
    pub rewritten: usize,
    pub unchanged: usize,
    pub fallbacks: usize,
    pub passthrough: usize,
    pub total_edits: usize,
    pub elapsed_ms: u64,
    pub per_record: Vec<RecordStats>,
}

impl RunStats {
    fn summarize(per_record: Vec<RecordStats>, elapsed_ms: u64) -> Self {
        let count = |status: &str| per_record.iter().filter(|r| r.status == status).count();
        Self {
            records: per_record.len(),
            rewritten: count("rewritten"),
            unchanged: count("unchanged"),
            fallbacks: count("fallback"),
            passthrough: count("passthrough"),
            total_edits: per_record.iter().map(|r| r.edits_applied).sum(),
            elapsed_ms,
            per_record,
        }
    }
}

/// Process records concurrently, preserving input order in the output.
///
/// A paragraph's rewrite reads only its own clusters and sentences, so
/// records fan out to blocking workers; `buffered` keeps completion order
/// aligned with submission order.
pub async fn process_records(
    lines: Vec<InputLine>,
    config: &BatchConfig,
) -> Result<(Vec<String>, RunStats)> {
    let started = Instant::now();
    let total = lines.len();

    let progress = if config.show_progress {
        ProgressBar::new(total as u64)
    } else {
        ProgressBar::hidden()
    };

    let exclude_field = config.exclude_field.clone();
    let mut results = stream::iter(lines.into_iter().enumerate().map(|(index, line)| {
        let exclude_field = exclude_field.clone();
        async move {
            let handle =
                task::spawn_blocking(move || process_one(index, line, exclude_field.as_deref()));
            match handle.await {
                Ok(result) => result,
                Err(join_error) => Err(anyhow!("record {index} worker panicked: {join_error}")),
            }
        }
    }))
    .buffered(config.concurrency.max(1));

    let mut output_lines = Vec::with_capacity(total);
    let mut per_record = Vec::with_capacity(total);
    while let Some(result) = results.next().await {
        let (line, stats) = result?;
        progress.inc(1);
        output_lines.push(line);
        per_record.push(stats);
    }
    progress.finish_and_clear();

    let run_stats = RunStats::summarize(per_record, started.elapsed().as_millis() as u64);
    Ok((output_lines, run_stats))
}

fn process_one(
    index: usize,
    line: InputLine,
    exclude_field: Option<&str>,
) -> Result<(String, RecordStats)> {
    let started = Instant::now();

    let stats = |status: &str,
                 sentences: usize,
                 clusters: usize,
                 candidates: usize,
                 edits_applied: usize,
                 error: Option<String>| RecordStats {
        index,
        sentences,
        clusters,
        candidates,
        edits_applied,
        processing_time_ms: started.elapsed().as_millis() as u64,
        status: status.to_string(),
        error,
    };

    let record = match line {
        InputLine::Passthrough(raw) => {
            return Ok((raw, stats("passthrough", 0, 0, 0, 0, None)));
        }
        InputLine::Record(record) => record,
    };
    let mut record = *record;

    let exclude = exclude_field
        .and_then(|field| record.extra.get(field))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let clusters = match record.clusters_resolved() {
        Ok(clusters) => clusters,
        Err(error) => {
            warn!("record {index}: {error}; passing through unchanged");
            let line = serde_json::to_string(&record)?;
            let cluster_count = record.clusters.len();
            return Ok((
                line,
                stats(
                    "fallback",
                    record.sentences.len(),
                    cluster_count,
                    0,
                    0,
                    Some(error.to_string()),
                ),
            ));
        }
    };

    let outcome = rewrite_paragraph_outcome(&record.sentences, &clusters, &exclude);

    // The protected text is supposed to survive verbatim; a rewrite that
    // loses it would break downstream answer-span identification.
    if !exclude.is_empty() {
        let before = joined_text(&record.sentences);
        let after = joined_text(&outcome.sentences);
        if before.contains(&exclude) && !after.contains(&exclude) {
            warn!("record {index}: protected text {exclude:?} no longer present after rewrite");
        }
    }

    let status = if outcome.fell_back {
        "fallback"
    } else if outcome.edits_applied > 0 {
        "rewritten"
    } else {
        "unchanged"
    };

    let record_stats = stats(
        status,
        record.sentences.len(),
        clusters.len(),
        outcome.candidates,
        outcome.edits_applied,
        None,
    );

    record.sentences = outcome.sentences;
    let line = serde_json::to_string(&record)?;
    Ok((line, record_stats))
}

/// Write output lines with async buffered I/O, one record per line.
pub async fn write_output_file(path: &Path, lines: &[String]) -> Result<()> {
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);

    for line in lines {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    writer.flush().await?;
    Ok(())
}

/// Persist run statistics as pretty-printed JSON.
pub async fn write_run_stats(path: &Path, run_stats: &RunStats) -> Result<()> {
    let content = serde_json::to_string_pretty(run_stats)?;
    tokio::fs::write(path, content).await?;
    Ok(())
}
