use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::{wrappers::LinesStream, StreamExt};
use tracing::{debug, info, warn};

use crate::replacer::{sentence_index_at, sentence_markers, Cluster, Mention};

/// Configuration for record reading behavior
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Whether to fail fast on first error or continue processing
    pub fail_fast: bool,
    /// Buffer size for async reading (default: 8KB)
    pub buffer_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            buffer_size: 8192,
        }
    }
}

/// Statistics for one input file
#[derive(Debug, Clone)]
pub struct ReadStats {
    pub file_path: String,
    pub lines_read: u64,
    pub records_parsed: u64,
    pub bytes_read: u64,
    pub duration_ms: u64,
    pub read_error: Option<String>,
}

/// A mention as it appears on the wire. `sentence_index` may be omitted;
/// it is then derived from the mention's global start offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionRecord {
    pub text: String,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence_index: Option<usize>,
}

impl MentionRecord {
    fn resolved(&self, markers: &[(usize, usize)]) -> Result<Mention> {
        let sentence_index = match self.sentence_index {
            Some(index) => index,
            None => sentence_index_at(markers, self.start).ok_or_else(|| {
                anyhow!(
                    "mention {:?} at {}..{} lies outside the paragraph",
                    self.text,
                    self.start,
                    self.end
                )
            })?,
        };
        Ok(Mention {
            text: self.text.clone(),
            start: self.start,
            end: self.end,
            sentence_index,
        })
    }
}

/// A cluster as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub main: MentionRecord,
    pub mentions: Vec<MentionRecord>,
}

/// One line-delimited JSON record: a paragraph's sentences plus the cluster
/// sets an external resolver reported for it. Unknown fields ride along
/// untouched and reappear on output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub sentences: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<ClusterRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Turn wire clusters into core clusters, deriving any missing mention
    /// sentence indices from the paragraph's sentence markers.
    pub fn clusters_resolved(&self) -> Result<Vec<Cluster>> {
        let markers = sentence_markers(&self.sentences);
        self.clusters
            .iter()
            .map(|cluster| {
                Ok(Cluster {
                    main: cluster.main.resolved(&markers)?,
                    mentions: cluster
                        .mentions
                        .iter()
                        .map(|mention| mention.resolved(&markers))
                        .collect::<Result<Vec<_>>>()?,
                })
            })
            .collect()
    }
}

/// One input line, either parsed or preserved verbatim for passthrough.
#[derive(Debug, Clone)]
pub enum InputLine {
    Record(Box<Record>),
    /// A non-blank line that did not parse as a record; written through
    /// unchanged unless fail-fast is set.
    Passthrough(String),
}

/// Async reader that streams line-delimited JSON records
pub struct JsonlReader {
    config: ReaderConfig,
}

impl JsonlReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Read all records from a JSONL file. Blank lines are skipped; a line
    /// that fails to parse is fatal under fail-fast and a warned
    /// passthrough otherwise.
    pub async fn read_records<P: AsRef<Path>>(
        &self,
        file_path: P,
    ) -> Result<(Vec<InputLine>, ReadStats)> {
        let path = file_path.as_ref();
        let start_time = std::time::Instant::now();

        debug!("Starting async read of records from: {}", path.display());

        let file = File::open(path)
            .await
            .map_err(|e| anyhow!("Failed to open input file {}: {}", path.display(), e))?;

        let reader = BufReader::with_capacity(self.config.buffer_size, file);
        let mut lines = LinesStream::new(reader.lines());

        let mut records = Vec::new();
        let mut line_count = 0u64;
        let mut parsed_count = 0u64;
        let mut byte_count = 0u64;
        let mut first_error = None;

        while let Some(line) = lines.next().await {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    let error_msg = format!(
                        "Read error in {} at line {}: {}",
                        path.display(),
                        line_count + 1,
                        e
                    );
                    if self.config.fail_fast {
                        bail!(error_msg);
                    }
                    warn!("{}", error_msg);
                    first_error.get_or_insert(error_msg);
                    break;
                }
            };

            byte_count += line.len() as u64 + 1;
            line_count += 1;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<Record>(&line) {
                Ok(record) => {
                    parsed_count += 1;
                    records.push(InputLine::Record(Box::new(record)));
                }
                Err(e) => {
                    let error_msg = format!(
                        "Malformed record in {} at line {}: {}",
                        path.display(),
                        line_count,
                        e
                    );
                    if self.config.fail_fast {
                        bail!(error_msg);
                    }
                    warn!("{}", error_msg);
                    first_error.get_or_insert(error_msg);
                    records.push(InputLine::Passthrough(line));
                }
            }
        }

        let stats = ReadStats {
            file_path: path.display().to_string(),
            lines_read: line_count,
            records_parsed: parsed_count,
            bytes_read: byte_count,
            duration_ms: start_time.elapsed().as_millis() as u64,
            read_error: first_error,
        };

        info!(
            "Read {}: {} lines, {} records, {} bytes in {}ms",
            path.display(),
            stats.lines_read,
            stats.records_parsed,
            stats.bytes_read,
            stats.duration_ms
        );

        Ok((records, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write_input(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        tokio::fs::write(&path, content).await.unwrap();
        path
    }

    fn record_line() -> &'static str {
        r#"{"id":"r1","sentences":["Julie wants to buy fruit."," That is what she loves."],"clusters":[{"main":{"text":"Julie","start":0,"end":5,"sentence_index":0},"mentions":[{"text":"Julie","start":0,"end":5,"sentence_index":0},{"text":"she","start":39,"end":42}]}]}"#
    }

    #[tokio::test]
    async fn test_read_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_input(&temp_dir, "input.jsonl", &format!("{}\n", record_line())).await;

        let reader = JsonlReader::new(ReaderConfig::default());
        let (lines, stats) = reader.read_records(&path).await.unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(stats.records_parsed, 1);
        assert!(stats.read_error.is_none());

        let InputLine::Record(record) = &lines[0] else {
            panic!("expected parsed record");
        };
        assert_eq!(record.sentences.len(), 2);
        assert_eq!(record.clusters.len(), 1);
        assert_eq!(record.extra.get("id"), Some(&Value::String("r1".into())));
    }

    #[tokio::test]
    async fn test_blank_lines_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let content = format!("\n{}\n   \n", record_line());
        let path = write_input(&temp_dir, "input.jsonl", &content).await;

        let reader = JsonlReader::new(ReaderConfig::default());
        let (lines, stats) = reader.read_records(&path).await.unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(stats.lines_read, 3);
    }

    #[tokio::test]
    async fn test_malformed_line_passthrough() {
        let temp_dir = TempDir::new().unwrap();
        let content = format!("not json\n{}\n", record_line());
        let path = write_input(&temp_dir, "input.jsonl", &content).await;

        let reader = JsonlReader::new(ReaderConfig::default());
        let (lines, stats) = reader.read_records(&path).await.unwrap();

        assert_eq!(lines.len(), 2);
        assert!(matches!(&lines[0], InputLine::Passthrough(raw) if raw == "not json"));
        assert!(stats.read_error.is_some());
    }

    #[tokio::test]
    async fn test_malformed_line_fail_fast() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_input(&temp_dir, "input.jsonl", "not json\n").await;

        let reader = JsonlReader::new(ReaderConfig {
            fail_fast: true,
            ..Default::default()
        });
        assert!(reader.read_records(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let reader = JsonlReader::new(ReaderConfig::default());
        let result = reader.read_records(temp_dir.path().join("absent.jsonl")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_sentence_index_derivation() {
        let record: Record = serde_json::from_str(record_line()).unwrap();
        let clusters = record.clusters_resolved().unwrap();
        assert_eq!(clusters[0].mentions[1].sentence_index, 1);
    }

    #[test]
    fn test_out_of_range_mention_is_error() {
        let record: Record = serde_json::from_str(
            r#"{"sentences":["Short."],"clusters":[{"main":{"text":"x","start":0,"end":1},"mentions":[{"text":"y","start":90,"end":92}]}]}"#,
        )
        .unwrap();
        assert!(record.clusters_resolved().is_err());
    }

    #[test]
    fn test_extra_fields_round_trip() {
        let record: Record = serde_json::from_str(record_line()).unwrap();
        let serialized = serde_json::to_string(&record).unwrap();
        let value: Value = serde_json::from_str(&serialized).unwrap();
        assert_eq!(value["id"], "r1");
        assert_eq!(value["sentences"][0], "Julie wants to buy fruit.");
    }
}
