// Overlap resolution among candidate edits. Any two candidates whose spans
// overlap are both removed; there is no priority rule between clusters.

use std::collections::HashSet;

use super::CandidateEdit;

/// Filter `candidates` down to a pairwise non-overlapping set.
///
/// Candidates are sorted descending by `(start, end)` and compared through a
/// sliding window of two; both members of every overlapping pair are
/// dropped. Spans that merely touch (`end1 == start2`) both survive.
///
/// The returned list keeps the descending order, so the splicer can consume
/// it back-to-front, smallest start first.
pub fn resolve_overlaps(mut candidates: Vec<CandidateEdit>) -> Vec<CandidateEdit> {
    candidates.sort_by(|a, b| (b.start, b.end).cmp(&(a.start, a.end)));

    let mut flagged: HashSet<usize> = HashSet::new();
    for (index, pair) in candidates.windows(2).enumerate() {
        let (first, second) = (&pair[0], &pair[1]);
        let union = first.end.max(second.end) - first.start.min(second.start);
        if union < first.len() + second.len() {
            flagged.insert(index);
            flagged.insert(index + 1);
        }
    }

    // Build a fresh filtered sequence instead of deleting by index.
    candidates
        .into_iter()
        .enumerate()
        .filter(|(index, _)| !flagged.contains(index))
        .map(|(_, candidate)| candidate)
        .collect()
}
