// Replacement engine interface: paragraph-in/paragraph-out over the cluster
// output of an external coreference resolver. Submodules hold the pipeline
// stages; this module owns the data model and the paragraph driver.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub mod candidates;
pub mod normalization;
pub mod overlap;
pub mod splicer;

pub use normalization::{
    collapse_possessive_artifact, collapse_whitespace, collapse_whitespace_into,
    normalize_replacement, strip_parentheticals,
};

use crate::resolver::CoreferenceResolver;

/// One occurrence of a reference to an entity: a half-open `[start, end)`
/// character-offset span over the paragraph's concatenated sentence text,
/// plus the literal surface text and the index of the containing sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub sentence_index: usize,
}

impl Mention {
    /// Whether two mentions cover the same character span.
    pub fn same_span(&self, other: &Mention) -> bool {
        self.start == other.start && self.end == other.end
    }
}

/// All mentions in a paragraph believed to refer to one entity, with a
/// distinguished canonical (`main`) mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub main: Mention,
    pub mentions: Vec<Mention>,
}

/// A proposed rewrite of `[start, end)` in paragraph-global character
/// offsets. Lives only while one paragraph is being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEdit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl CandidateEdit {
    /// Span length in characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Per-sentence `[start, end)` ranges in the paragraph-global character
/// space, derived from original sentence lengths.
pub fn sentence_markers(sentences: &[String]) -> Vec<(usize, usize)> {
    let mut markers = Vec::with_capacity(sentences.len());
    let mut pointer = 0;
    for sentence in sentences {
        let length = sentence.chars().count();
        markers.push((pointer, pointer + length));
        pointer += length;
    }
    markers
}

/// Index of the sentence whose marker range contains `offset`, if any.
pub fn sentence_index_at(markers: &[(usize, usize)], offset: usize) -> Option<usize> {
    markers.iter().position(|&(start, end)| start <= offset && offset < end)
}

/// The concatenated paragraph text that defines the character-offset
/// coordinate space mention spans are expressed in.
pub fn joined_text(sentences: &[String]) -> String {
    sentences.concat()
}

/// What happened while rewriting one paragraph.
#[derive(Debug, Clone)]
pub struct ParagraphOutcome {
    pub sentences: Vec<String>,
    pub clusters_seen: usize,
    pub candidates: usize,
    pub edits_applied: usize,
    /// The pipeline hit a contract violation and the original sentences
    /// were returned unchanged.
    pub fell_back: bool,
}

/// Rewrite one paragraph's sentences using the cluster set reported for it.
///
/// Sentence count and order are preserved; sentences with no qualifying
/// edits come back byte-identical. A paragraph that cannot be rewritten
/// safely falls back to its original sentences rather than failing.
pub fn rewrite_paragraph(
    sentences: &[String],
    clusters: &[Cluster],
    exclude_text: &str,
) -> Vec<String> {
    rewrite_paragraph_outcome(sentences, clusters, exclude_text).sentences
}

/// As [`rewrite_paragraph`], reporting pipeline counters alongside the text.
pub fn rewrite_paragraph_outcome(
    sentences: &[String],
    clusters: &[Cluster],
    exclude_text: &str,
) -> ParagraphOutcome {
    if clusters.is_empty() {
        return ParagraphOutcome {
            sentences: sentences.to_vec(),
            clusters_seen: 0,
            candidates: 0,
            edits_applied: 0,
            fell_back: false,
        };
    }

    let mut all_candidates = Vec::new();
    for cluster in clusters {
        all_candidates.extend(candidates::extract_candidates(cluster, exclude_text));
    }
    let candidate_count = all_candidates.len();

    let edits = overlap::resolve_overlaps(all_candidates);
    debug!(
        candidates = candidate_count,
        surviving = edits.len(),
        "resolved overlapping candidates"
    );

    let mut rewritten = sentences.to_vec();
    match splicer::apply_edits(&mut rewritten, edits) {
        Ok(applied) => {
            for sentence in &mut rewritten {
                if sentence.contains("'s's") {
                    *sentence = collapse_possessive_artifact(sentence);
                }
            }
            ParagraphOutcome {
                sentences: rewritten,
                clusters_seen: clusters.len(),
                candidates: candidate_count,
                edits_applied: applied,
                fell_back: false,
            }
        }
        Err(error) => {
            warn!("paragraph rewrite aborted, keeping original sentences: {error}");
            ParagraphOutcome {
                sentences: sentences.to_vec(),
                clusters_seen: clusters.len(),
                candidates: candidate_count,
                edits_applied: 0,
                fell_back: true,
            }
        }
    }
}

/// Rewrite a batch of paragraphs through an injected resolver.
///
/// `exclude_texts`, when given, must be parallel to `paragraphs`; a missing
/// list protects nothing. Paragraphs are independent: each one reads only
/// its own clusters and mutates only its own working sentence copy.
pub fn rewrite_batch<R: CoreferenceResolver>(
    resolver: &R,
    paragraphs: &[Vec<String>],
    exclude_texts: Option<&[String]>,
) -> Result<Vec<Vec<String>>> {
    if let Some(excludes) = exclude_texts {
        ensure!(
            excludes.len() == paragraphs.len(),
            "exclude texts ({}) not parallel to paragraphs ({})",
            excludes.len(),
            paragraphs.len()
        );
    }

    let cluster_sets = resolver.resolve(paragraphs)?;
    ensure!(
        cluster_sets.len() == paragraphs.len(),
        "resolver returned {} cluster sets for {} paragraphs",
        cluster_sets.len(),
        paragraphs.len()
    );

    Ok(paragraphs
        .iter()
        .zip(cluster_sets.iter())
        .enumerate()
        .map(|(index, (sentences, clusters))| {
            let exclude = exclude_texts.map_or("", |excludes| excludes[index].as_str());
            rewrite_paragraph(sentences, clusters, exclude)
        })
        .collect())
}
