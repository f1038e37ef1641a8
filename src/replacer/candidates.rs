// Candidate generation: turns one cluster into zero or more replacement
// edits against the paragraph's original character offsets. Filtering order
// matters and is load-bearing; see the per-mention checks below.

use std::collections::HashMap;

use super::normalization::normalize_replacement;
use super::{CandidateEdit, Cluster};

/// Canonical texts longer than this never replace anything.
const MAX_CANONICAL_CHARS: usize = 40;

/// Bare personal/possessive pronouns that make a useless canonical form.
const BARE_PRONOUNS: [&str; 9] = [
    "he", "him", "his", "she", "her", "it", "its", "they", "their",
];

/// Possessive pronoun surfaces that demand possessive inflection of the
/// replacement. Matched case-sensitively against the mention text.
const POSSESSIVE_PRONOUNS: [&str; 4] = ["his", "her", "its", "their"];

/// Produce replacement candidates for one cluster.
///
/// The cluster's canonical text is the trimmed surface of its `main`
/// mention. A cluster whose canonical text is over-long or a bare pronoun
/// yields nothing. Mentions in the same sentence as `main` are left for a
/// downstream contextual model, and a mention overlapping `exclude_text`
/// (in either containment direction) is never touched.
pub fn extract_candidates(cluster: &Cluster, exclude_text: &str) -> Vec<CandidateEdit> {
    let canonical = cluster.main.text.trim();
    if canonical.chars().count() > MAX_CANONICAL_CHARS {
        return Vec::new();
    }
    if BARE_PRONOUNS.contains(&canonical.to_lowercase().as_str()) {
        return Vec::new();
    }

    // One cluster must not rewrite the same sentence with the same
    // replacement twice; otherwise "Alice wrote her first book" becomes
    // "Alice wrote Alice's first book when Alice was 10 years old".
    let mut used_per_sentence: HashMap<usize, Vec<String>> = HashMap::new();
    let mut candidates = Vec::new();

    for mention in &cluster.mentions {
        if mention.same_span(&cluster.main) {
            continue;
        }
        if mention.text == canonical {
            continue;
        }
        if mention.sentence_index == cluster.main.sentence_index {
            continue;
        }

        let normalized = normalize_replacement(canonical);
        if normalized.is_empty() {
            continue;
        }
        if mention.text == normalized {
            continue;
        }

        // Duplicate suppression compares the un-inflected string, before
        // possessive rules run. Two pronoun cases of one base replacement
        // may therefore both survive in a sentence.
        let used = used_per_sentence.entry(mention.sentence_index).or_default();
        if used.iter().any(|prior| prior == &normalized) {
            continue;
        }

        let mention_trimmed = mention.text.trim();
        if exclude_text.contains(mention_trimmed) {
            continue;
        }
        let exclude_trimmed = exclude_text.trim();
        if !exclude_trimmed.is_empty() && mention_trimmed.contains(exclude_trimmed) {
            continue;
        }

        let replacement = inflect_possessive(&normalized, &mention.text);

        used.push(normalized);
        candidates.push(CandidateEdit {
            start: mention.start,
            end: mention.end,
            replacement,
        });
    }

    candidates
}

/// Apply possessive inflection rules for a replacement standing in for
/// `mention_text`. Both rules may fire.
fn inflect_possessive(normalized: &str, mention_text: &str) -> String {
    let mut replacement = normalized.to_string();

    if POSSESSIVE_PRONOUNS.contains(&mention_text) {
        if replacement.ends_with('\'') || replacement.ends_with("'s") {
            // already possessive
        } else if replacement.ends_with('s') {
            replacement.push('\'');
        } else {
            replacement.push_str("'s");
        }
    }

    if mention_text.ends_with("'s") && !replacement.ends_with("'s") {
        replacement.push_str("'s");
    }

    replacement
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replacer::Mention;

    fn mention(text: &str, start: usize, end: usize, sentence_index: usize) -> Mention {
        Mention {
            text: text.to_string(),
            start,
            end,
            sentence_index,
        }
    }

    fn cluster(main: Mention, mentions: Vec<Mention>) -> Cluster {
        Cluster { main, mentions }
    }

    #[test]
    fn test_simple_candidate() {
        let c = cluster(
            mention("Julie", 0, 5, 0),
            vec![mention("Julie", 0, 5, 0), mention("she", 39, 42, 1)],
        );

        let candidates = extract_candidates(&c, "");
        assert_eq!(
            candidates,
            vec![CandidateEdit {
                start: 39,
                end: 42,
                replacement: "Julie".to_string(),
            }]
        );
    }

    #[test]
    fn test_bare_pronoun_canonical_rejected() {
        for pronoun in ["it", "It", "THEY", "she"] {
            let c = cluster(
                mention(pronoun, 0, pronoun.len(), 0),
                vec![
                    mention(pronoun, 0, pronoun.len(), 0),
                    mention("him", 30, 33, 1),
                ],
            );
            assert!(extract_candidates(&c, "").is_empty(), "{pronoun} should be rejected");
        }
    }

    #[test]
    fn test_overlong_canonical_rejected() {
        let long_name = "x".repeat(41);
        let c = cluster(
            mention(&long_name, 0, 41, 0),
            vec![mention(&long_name, 0, 41, 0), mention("he", 60, 62, 1)],
        );
        assert!(extract_candidates(&c, "").is_empty());
    }

    #[test]
    fn test_forty_char_canonical_allowed() {
        let name = "y".repeat(40);
        let c = cluster(
            mention(&name, 0, 40, 0),
            vec![mention(&name, 0, 40, 0), mention("he", 60, 62, 1)],
        );
        assert_eq!(extract_candidates(&c, "").len(), 1);
    }

    #[test]
    fn test_same_sentence_as_main_skipped() {
        let c = cluster(
            mention("Alice", 0, 5, 0),
            vec![
                mention("Alice", 0, 5, 0),
                mention("her", 12, 15, 0),
                mention("she", 31, 34, 0),
            ],
        );
        assert!(extract_candidates(&c, "").is_empty());
    }

    #[test]
    fn test_mention_equal_to_canonical_skipped() {
        let c = cluster(
            mention("Alice", 0, 5, 0),
            vec![mention("Alice", 0, 5, 0), mention("Alice", 40, 45, 1)],
        );
        assert!(extract_candidates(&c, "").is_empty());
    }

    #[test]
    fn test_empty_normalization_skipped() {
        let c = cluster(
            mention("(bracketed)", 0, 11, 0),
            vec![mention("(bracketed)", 0, 11, 0), mention("it", 30, 32, 1)],
        );
        assert!(extract_candidates(&c, "").is_empty());
    }

    #[test]
    fn test_mention_equal_to_normalized_skipped() {
        // Canonical "Alice," normalizes to "Alice", which equals the second
        // mention's own surface text.
        let c = cluster(
            mention("Alice,", 0, 6, 0),
            vec![mention("Alice,", 0, 6, 0), mention("Alice", 30, 35, 1)],
        );
        assert!(extract_candidates(&c, "").is_empty());
    }

    #[test]
    fn test_duplicate_suppression_within_sentence() {
        let c = cluster(
            mention("Julie", 0, 5, 0),
            vec![
                mention("Julie", 0, 5, 0),
                mention("she", 30, 33, 1),
                mention("She", 50, 53, 1),
            ],
        );

        let candidates = extract_candidates(&c, "");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].start, 30);
    }

    #[test]
    fn test_duplicate_suppression_is_per_sentence() {
        let c = cluster(
            mention("Julie", 0, 5, 0),
            vec![
                mention("Julie", 0, 5, 0),
                mention("she", 30, 33, 1),
                mention("she", 60, 63, 2),
            ],
        );
        assert_eq!(extract_candidates(&c, "").len(), 2);
    }

    #[test]
    fn test_duplicate_check_ignores_inflection() {
        // "her" inflects to "Julie's" but records "Julie"; the later bare
        // pronoun in the same sentence is still a duplicate.
        let c = cluster(
            mention("Julie", 0, 5, 0),
            vec![
                mention("Julie", 0, 5, 0),
                mention("her", 30, 33, 1),
                mention("she", 50, 53, 1),
            ],
        );

        let candidates = extract_candidates(&c, "");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].replacement, "Julie's");
    }

    #[test]
    fn test_possessive_inflection_appends_apostrophe_s() {
        let c = cluster(
            mention("Alice", 0, 5, 0),
            vec![mention("Alice", 0, 5, 0), mention("her", 30, 33, 1)],
        );

        let candidates = extract_candidates(&c, "");
        assert_eq!(candidates[0].replacement, "Alice's");
    }

    #[test]
    fn test_possessive_inflection_plural_appends_apostrophe() {
        let c = cluster(
            mention("the students", 0, 12, 0),
            vec![mention("the students", 0, 12, 0), mention("their", 40, 45, 1)],
        );

        let candidates = extract_candidates(&c, "");
        assert_eq!(candidates[0].replacement, "the students'");
    }

    #[test]
    fn test_possessive_inflection_case_sensitive() {
        // "Her" with a capital is not in the possessive surface set.
        let c = cluster(
            mention("Alice", 0, 5, 0),
            vec![mention("Alice", 0, 5, 0), mention("Her", 30, 33, 1)],
        );

        let candidates = extract_candidates(&c, "");
        assert_eq!(candidates[0].replacement, "Alice");
    }

    #[test]
    fn test_mention_ending_apostrophe_s_inflects_replacement() {
        let c = cluster(
            mention("the captain", 0, 11, 0),
            vec![mention("the captain", 0, 11, 0), mention("Jones's", 40, 47, 1)],
        );

        let candidates = extract_candidates(&c, "");
        assert_eq!(candidates[0].replacement, "the captain's");
    }

    #[test]
    fn test_protected_span_containing_mention() {
        let c = cluster(
            mention("my mother", 0, 9, 0),
            vec![mention("my mother", 0, 9, 0), mention("She", 40, 43, 1)],
        );
        assert!(extract_candidates(&c, "She").is_empty());
        assert!(extract_candidates(&c, "She said so").is_empty());
    }

    #[test]
    fn test_protected_span_contained_in_mention() {
        let c = cluster(
            mention("Julie Andrews", 0, 13, 0),
            vec![
                mention("Julie Andrews", 0, 13, 0),
                mention("the actress Julie", 40, 57, 1),
            ],
        );
        assert!(extract_candidates(&c, "Julie").is_empty());
    }

    #[test]
    fn test_empty_protected_span_protects_nothing() {
        let c = cluster(
            mention("Julie", 0, 5, 0),
            vec![mention("Julie", 0, 5, 0), mention("she", 39, 42, 1)],
        );
        assert_eq!(extract_candidates(&c, "").len(), 1);
    }
}
