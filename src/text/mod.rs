//! Text Analyzer - segmentation of raw model output
//!
//! Pure, total functions over `&str`. Every function returns an empty
//! sequence for empty input and never fails.
//!
//! ## Normalization
//!
//! Words are lower-cased, stripped of everything that is not an ASCII word
//! character (`[A-Za-z0-9_]`) or whitespace, split on whitespace, and tokens
//! of two characters or fewer are dropped. Whitespace here is the
//! `Zs` space set plus tab, line terminators and U+FEFF; U+0085 (NEL) is not
//! whitespace. Keywords are words minus a fixed
//! English stop-word list.
//!
//! ```rust
//! use sampling_lab::text;
//!
//! let words = text::extract_words("The cat sat on a mat!");
//! assert_eq!(words, vec!["the", "cat", "sat", "mat"]);
//!
//! let keywords = text::extract_keywords("The cat sat on a mat!");
//! assert_eq!(keywords, vec!["cat", "sat", "mat"]);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;

/// Sentence terminators: runs of `.`, `!` and `?`
static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

/// Paragraph breaks: two or more consecutive newlines
static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\n+").unwrap());

/// Tokens this short or shorter are treated as noise.
pub const MIN_WORD_LEN: usize = 3;

/// Characters counted as punctuation for density measurements.
pub const PUNCTUATION: &[char] = &['.', '!', '?', ',', ';', ':'];

/// Characters that indicate markdown-style formatting.
pub const MARKDOWN_MARKERS: &[char] = &['*', '_', '`', '#', '[', ']'];

/// Stop words removed by [`extract_keywords`].
///
/// Kept verbatim (including repeats) so keyword extraction stays
/// compatible with previously scored data.
pub const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "and", "or", "but", "a", "an", "as", "are", "was", "were",
    "been", "be", "have", "has", "had", "do", "does", "did", "will", "would", "should", "could",
    "may", "might", "must", "can", "this", "that", "these", "those", "i", "you", "he", "she", "it",
    "we", "they", "what", "who", "where", "when", "why", "how", "all", "each", "every", "both",
    "few", "more", "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same",
    "so", "than", "too", "very", "can", "will", "just", "don", "should", "now",
];

static STOP_WORD_SET: Lazy<FxHashSet<&'static str>> =
    Lazy::new(|| STOP_WORDS.iter().copied().collect());

/// Split text into trimmed, non-empty sentences.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    SENTENCE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Extract normalized words (see module docs).
#[must_use]
pub fn extract_words(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .filter(|c| is_word_char(*c) || is_space(*c))
        .collect();

    normalized
        .split(is_space)
        .filter(|w| w.len() >= MIN_WORD_LEN)
        .map(ToString::to_string)
        .collect()
}

/// Extract words that are not stop words.
#[must_use]
pub fn extract_keywords(text: &str) -> Vec<String> {
    extract_words(text)
        .into_iter()
        .filter(|w| !STOP_WORD_SET.contains(w.as_str()))
        .collect()
}

/// Split text into paragraphs separated by blank lines, dropping blank entries.
#[must_use]
pub fn split_paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_BREAK
        .split(text)
        .filter(|p| !p.trim().is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Number of [`PUNCTUATION`] characters in `text`.
#[must_use]
pub fn punctuation_count(text: &str) -> usize {
    text.chars().filter(|c| PUNCTUATION.contains(c)).count()
}

/// Whether `text` contains any [`MARKDOWN_MARKERS`].
#[must_use]
pub fn has_markdown(text: &str) -> bool {
    text.contains(MARKDOWN_MARKERS)
}

const fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_space(c: char) -> bool {
    match c {
        '\u{feff}' => true,
        '\u{85}' => false,
        _ => c.is_whitespace(),
    }
}
