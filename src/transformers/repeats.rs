//! Long repeated substring removal.
//!
//! Every substring of at least `min_len` chars that occurs more than once
//! only keeps its first occurrence. Shorter repeats are left untouched.
use log::debug;

use super::automaton::SuffixAutomaton;
use super::transform::Transform;
use crate::document::Document;

/// Default minimum length of a removed repeat.
pub const DEFAULT_MIN_REPEAT_LENGTH: usize = 21;

/// Remove repeated substrings until none is left.
///
/// A single pass ([remove_repeats_once]) can create new repeats by joining
/// the spans around a removed occurrence, so passes are applied until the
/// text stops shrinking. The result contains no substring of length
/// `>= min_len` twice, which makes the function idempotent.
pub fn remove_repeats(text: &str, min_len: usize) -> String {
    let mut current = remove_repeats_once(text, min_len);
    loop {
        let next = remove_repeats_once(&current, min_len);
        if next.len() == current.len() {
            return current;
        }
        current = next;
    }
}

/// One pass of repeat removal.
pub fn remove_repeats_once(text: &str, min_len: usize) -> String {
    let min_len = min_len.max(1);
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= min_len {
        return text.to_string();
    }

    let sam = SuffixAutomaton::build(&chars);
    let marked = sam.repeated_occurrences(min_len);
    if marked.is_empty() {
        return text.to_string();
    }

    let merged = merge(marked);
    debug!(
        "removing {} chars in {} spans",
        merged.iter().map(|(s, e)| e - s).sum::<usize>(),
        merged.len()
    );

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end) in merged {
        out.extend(&chars[cursor..start]);
        cursor = end;
    }
    out.extend(&chars[cursor..]);
    out
}

/// Sort and merge overlapping or adjacent half-open ranges.
fn merge(mut ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    ranges.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Repeat removal as a document transform.
pub struct RemoveRepeats {
    min_len: usize,
}

impl RemoveRepeats {
    pub fn new(min_len: usize) -> Self {
        Self { min_len }
    }
}

impl Default for RemoveRepeats {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_REPEAT_LENGTH)
    }
}

impl Transform for RemoveRepeats {
    fn transform_own(&self, mut doc: Document) -> Document {
        let cleaned = remove_repeats(doc.content(), self.min_len);
        doc.set_content(cleaned);
        doc
    }
}
