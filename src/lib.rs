pub mod batch;
pub mod reader;
pub mod replacer;
pub mod resolver;

// Re-export the core replacement surface for convenient access
pub use replacer::{
    joined_text, rewrite_batch, rewrite_paragraph, rewrite_paragraph_outcome, sentence_index_at,
    sentence_markers, CandidateEdit, Cluster, Mention, ParagraphOutcome,
};

pub use resolver::{CoreferenceResolver, PrecomputedClusters};

// Re-export batch processing types for the CLI and benchmarks
pub use batch::{process_records, BatchConfig, RecordStats, RunStats};
pub use reader::{InputLine, JsonlReader, ReadStats, ReaderConfig, Record};
