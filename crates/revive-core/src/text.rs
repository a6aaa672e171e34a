//! Small text helpers: word counting, whitespace cleanup and slug titles.

use regex::Regex;
use std::sync::LazyLock;

/// Three or more consecutive newlines.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Number of whitespace-delimited tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Collapse runs of three or more newlines to exactly two.
pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUN_RE.replace_all(text, "\n\n").into_owned()
}

/// Join pieces of text and squeeze all internal whitespace to single spaces.
pub fn squash_whitespace<'a>(pieces: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for piece in pieces {
        for word in piece.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(word);
        }
    }
    out
}

/// Capitalize the first letter of every word and lowercase the rest.
///
/// A word starts after any non-alphabetic character, so `o'neil` becomes
/// `O'Neil` and `2024recap` becomes `2024Recap`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Readable title for a site-relative slug.
///
/// Uses the last path segment with `-` and `_` turned into spaces. Falls back
/// to the slug itself when that segment is empty (the home page).
pub fn title_from_slug(slug: &str) -> String {
    let segment = slug.rsplit('/').next().unwrap_or_default();
    let raw = segment.replace(['-', '_'], " ");
    let raw = raw.trim();
    if raw.is_empty() {
        slug.to_string()
    } else {
        title_case(raw)
    }
}

/// Truncate to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
