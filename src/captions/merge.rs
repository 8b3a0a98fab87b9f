// Caption stitching - joins rolling caption fragments without duplicating overlap
// Author: kelexine (https://github.com/kelexine)

/// Shortest overlap accepted anywhere inside a word
pub const MIN_OVERLAP_CHARS: usize = 5;

/// Shortest overlap accepted when it covers whole words on both sides
pub const MIN_WORD_OVERLAP_CHARS: usize = 3;

/// How far beyond the fragment length the containment check looks back
const CONTAINMENT_SLACK_CHARS: usize = 50;

/// Merge an incoming caption fragment into the accumulated history.
///
/// Pure and deterministic. Captions roll on screen, so consecutive fragments
/// usually repeat the tail of what was already seen:
///
/// 1. A fragment already present near the end of the history is dropped.
/// 2. Otherwise the longest suffix of the history that is also a prefix of the
///    fragment is stitched over (at least 5 characters, or at least 3 when the
///    overlap is made of whole words).
/// 3. Without overlap the fragment is appended after a single space.
///
/// Lengths are counted in characters so slicing never splits a code point.
pub fn merge(existing: &str, incoming: &str) -> String {
    let existing = existing.trim();
    let incoming = incoming.trim();

    if existing.is_empty() {
        return incoming.to_string();
    }

    let incoming_len = incoming.chars().count();
    if tail_chars(existing, incoming_len + CONTAINMENT_SLACK_CHARS).contains(incoming) {
        return existing.to_string();
    }

    match find_overlap(existing, incoming, incoming_len) {
        Some(split) => format!("{}{}", existing, &incoming[split..]),
        None => format!("{} {}", existing, incoming),
    }
}

/// Byte offset into `incoming` just past the longest accepted overlap
fn find_overlap(existing: &str, incoming: &str, incoming_len: usize) -> Option<usize> {
    let existing_len = existing.chars().count();
    let max_overlap = existing_len.min(incoming_len);

    // Byte offsets of every char boundary in `incoming`, index = char count
    let boundaries: Vec<usize> = incoming
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(incoming.len()))
        .collect();

    (MIN_WORD_OVERLAP_CHARS..=max_overlap).rev().find_map(|chars| {
        let split = boundaries[chars];
        let prefix = &incoming[..split];
        if !existing.ends_with(prefix) {
            return None;
        }
        if chars >= MIN_OVERLAP_CHARS || is_word_aligned(existing, prefix, &incoming[split..]) {
            Some(split)
        } else {
            None
        }
    })
}

/// The overlap starts a word in `existing` and ends a word in `incoming`
fn is_word_aligned(existing: &str, overlap: &str, incoming_rest: &str) -> bool {
    let before = existing[..existing.len() - overlap.len()].chars().next_back();
    let after = incoming_rest.chars().next();

    let starts_word = before.map_or(true, char::is_whitespace);
    let ends_word = after.map_or(true, char::is_whitespace);
    starts_word && ends_word
}

/// The last `n` characters of `s` (all of `s` if shorter)
fn tail_chars(s: &str, n: usize) -> &str {
    let total = s.chars().count();
    if n >= total {
        return s;
    }
    let start = s
        .char_indices()
        .nth(total - n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &s[start..]
}
