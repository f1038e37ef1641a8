// Standalone text normalization for replacement strings.
// Kept free of the candidate/splice logic so the batch layer can reuse the
// whitespace helpers when preparing paragraphs for an external resolver.

use regex_automata::{meta::Regex, Input};
use std::sync::OnceLock;

/// ASCII punctuation stripped from the ends of a replacement string.
const PUNCTUATION: &[char] = &[
    '!', '"', '#', '$', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', ':', ';', '<',
    '=', '>', '?', '@', '[', '\\', ']', '^', '_', '`', '{', '|', '}', '~',
];

fn parenthetical_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // A span from `(` to the next `)` with no parentheses in between.
    // Does not handle nested parentheticals; see normalize_replacement.
    PATTERN.get_or_init(|| Regex::new(r"\([^()]*\)").expect("parenthetical pattern is valid"))
}

/// Remove non-nested parenthetical substrings from `text`.
///
/// Single pass, non-recursive: `"a (b) c"` becomes `"a  c"`, but the inner
/// span of `"a (b (c)) d"` survives as `"a (b ) d"`. Nested parentheses are
/// a known gap that downstream fixtures depend on; do not make this recursive.
pub fn strip_parentheticals(text: &str) -> String {
    let pattern = parenthetical_pattern();
    let mut result = String::with_capacity(text.len());
    let mut last_end = 0;
    for found in pattern.find_iter(Input::new(text)) {
        result.push_str(&text[last_end..found.start()]);
        last_end = found.end();
    }
    result.push_str(&text[last_end..]);
    result
}

/// Trim surrounding ASCII punctuation from `text`.
pub fn trim_punctuation(text: &str) -> &str {
    text.trim_matches(|c: char| PUNCTUATION.contains(&c))
}

/// Normalize a candidate replacement string: strip bounded parentheticals,
/// trim surrounding whitespace, then trim surrounding punctuation.
///
/// An empty result means the caller has no valid replacement.
pub fn normalize_replacement(text: &str) -> String {
    trim_punctuation(strip_parentheticals(text).trim()).to_string()
}

/// Collapse the duplicated possessive suffix artifact `'s's` to `'s`.
///
/// Possessive inflection applied to a replacement that already ended in `'s`
/// through another rule leaves this literal behind; applied once per sentence
/// after all edits are in place.
pub fn collapse_possessive_artifact(sentence: &str) -> String {
    sentence.replace("'s's", "'s")
}

/// Collapse interior whitespace runs to single spaces and trim the ends.
///
/// Paragraph sentences are handed to the external resolver in this form, so
/// its character offsets line up with the concatenated sentence text.
pub fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    collapse_whitespace_into(text, &mut result);
    result
}

/// Collapse whitespace into a supplied buffer to avoid allocation.
pub fn collapse_whitespace_into(text: &str, buffer: &mut String) {
    buffer.clear();
    buffer.reserve(text.len());

    let mut prev_was_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                buffer.push(' ');
                prev_was_space = true;
            }
        } else {
            buffer.push(ch);
            prev_was_space = false;
        }
    }

    let trimmed = buffer.trim();
    if trimmed.len() != buffer.len() {
        let trimmed_content = trimmed.to_string();
        buffer.clear();
        buffer.push_str(&trimmed_content);
    }
}
