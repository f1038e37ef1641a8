// Boundary-safe splicing of accepted edits into the sentence list. Global
// character offsets are translated to (sentence, local offset) pairs against
// current sentence lengths, and pending edits are rebased after every
// application so later spans stay valid.

use anyhow::{bail, Result};
use tracing::debug;

use super::CandidateEdit;

/// Apply non-overlapping edits to `sentences`, smallest start first.
///
/// `edits` must be sorted descending by span as produced by
/// [`super::overlap::resolve_overlaps`]; the worklist is consumed from the
/// back. An edit that crosses a caller-imposed sentence boundary is dropped
/// silently. An edit with `start >= end`, or one pointing past the end of
/// the paragraph, is a contract violation and aborts the whole paragraph.
///
/// Returns the number of edits actually applied.
pub fn apply_edits(sentences: &mut [String], mut edits: Vec<CandidateEdit>) -> Result<usize> {
    let mut applied = 0;

    while let Some(edit) = edits.pop() {
        if edit.start >= edit.end {
            bail!("malformed edit span {}..{}", edit.start, edit.end);
        }

        // Map the global span onto a sentence by subtracting current
        // sentence lengths until the end offset fits.
        let mut sentence_index = 0;
        let mut local_start = edit.start as i64;
        let mut local_end = edit.end as i64;
        loop {
            let Some(sentence) = sentences.get(sentence_index) else {
                bail!(
                    "edit span {}..{} lies beyond the end of the paragraph",
                    edit.start,
                    edit.end
                );
            };
            let length = sentence.chars().count() as i64;
            if local_end <= length {
                break;
            }
            local_start -= length;
            local_end -= length;
            sentence_index += 1;
        }

        if local_start < 0 {
            // The edit starts in an earlier sentence than it ends in. The
            // caller's segmentation need not match the resolver's; such an
            // edit is unsupported, not an error.
            debug!(
                start = edit.start,
                end = edit.end,
                "replacement spans a sentence boundary, ignoring"
            );
            continue;
        }

        let sentence = &mut sentences[sentence_index];
        *sentence = splice_char_range(
            sentence,
            local_start as usize,
            local_end as usize,
            &edit.replacement,
        )?;
        applied += 1;

        // Rebase pending edits in the original global coordinate space.
        // Spans at or before this edit's start are unaffected; the
        // non-overlap guarantee means they lie entirely before the splice.
        let adjustment =
            edit.replacement.chars().count() as i64 - (edit.end - edit.start) as i64;
        for pending in &mut edits {
            if pending.start > edit.start {
                pending.start = (pending.start as i64 + adjustment) as usize;
                pending.end = (pending.end as i64 + adjustment) as usize;
            }
        }
    }

    Ok(applied)
}

/// Replace the character range `[start, end)` of `text` with `replacement`.
/// Offsets are Unicode scalar positions, converted to byte positions here so
/// multi-byte text is never sliced mid-character.
fn splice_char_range(text: &str, start: usize, end: usize, replacement: &str) -> Result<String> {
    let (Some(byte_start), Some(byte_end)) = (char_to_byte(text, start), char_to_byte(text, end))
    else {
        bail!(
            "character range {start}..{end} exceeds sentence of {} characters",
            text.chars().count()
        );
    };

    let mut result = String::with_capacity(text.len() + replacement.len());
    result.push_str(&text[..byte_start]);
    result.push_str(replacement);
    result.push_str(&text[byte_end..]);
    Ok(result)
}

/// Byte position of the `char_offset`-th character, or the string length for
/// the one-past-the-end position.
fn char_to_byte(text: &str, char_offset: usize) -> Option<usize> {
    text.char_indices()
        .map(|(byte_index, _)| byte_index)
        .chain(std::iter::once(text.len()))
        .nth(char_offset)
}
