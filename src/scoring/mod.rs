//! Quality Scorer - coherence, completeness and structure of a response
//!
//! Three independent sub-scores, each an integer in `[0, 100]`, combined
//! into a weighted overall score:
//!
//! ```text
//! overall = round(0.4 * coherence + 0.35 * completeness + 0.25 * structural)
//! ```
//!
//! Scoring is a pure function of `(response_text, prompt)`: scoring the
//! same pair twice yields identical [`QualityMetrics`].
//!
//! ```rust
//! use sampling_lab::scoring;
//!
//! let metrics = scoring::score("A. B. C.", "Explain quantum computing in simple terms");
//! assert_eq!(metrics.coherence(), 0);
//! assert!(metrics.overall() <= 100);
//! ```

mod metrics;

pub use metrics::{
    composite, MetricAverages, MetricDetails, QualityMetrics, COHERENCE_WEIGHT,
    COMPLETENESS_WEIGHT, STRUCTURAL_WEIGHT,
};

use rustc_hash::FxHashSet;

use crate::text;

/// Score returned when a dimension cannot be measured.
pub const BASELINE_SCORE: u32 = 50;

/// Presence of any of these (case-insensitive) earns the coherence bonus.
pub const TRANSITION_WORDS: &[&str] = &[
    "however",
    "therefore",
    "furthermore",
    "additionally",
    "moreover",
    "consequently",
    "meanwhile",
    "nevertheless",
];

const TRANSITION_BONUS: f64 = 20.0;
const OVERLAP_SCALE: f64 = 80.0;

/// Score a response against the prompt that produced it.
#[must_use]
pub fn score(response_text: &str, prompt: &str) -> QualityMetrics {
    QualityMetrics::new(
        coherence(response_text),
        completeness(response_text, prompt),
        structural(response_text),
        MetricDetails::from_text(response_text),
    )
}

/// Adjacent-sentence topical continuity.
///
/// Mean Jaccard similarity of the word sets of adjacent sentences, scaled
/// by 80, plus a flat 20 when a transition word appears anywhere.
/// Fewer than two sentences yields [`BASELINE_SCORE`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn coherence(text: &str) -> u32 {
    let sentences = text::split_sentences(text);
    if sentences.len() < 2 {
        return BASELINE_SCORE;
    }

    let word_sets: Vec<FxHashSet<String>> = sentences
        .iter()
        .map(|s| text::extract_words(s).into_iter().collect())
        .collect();

    let similarity_sum: f64 = word_sets.windows(2).map(|pair| jaccard(&pair[0], &pair[1])).sum();
    let mut score = similarity_sum / (sentences.len() - 1) as f64 * OVERLAP_SCALE;

    let lowered = text.to_lowercase();
    if TRANSITION_WORDS.iter().any(|w| lowered.contains(w)) {
        score += TRANSITION_BONUS;
    }

    to_score(score)
}

/// Topical coverage of the prompt and length appropriateness.
///
/// Every prompt keyword occurrence is tested for membership in the
/// response's keywords; `coverage = matches / prompt keyword count`.
/// Returns [`BASELINE_SCORE`] when the prompt has no keywords.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn completeness(response_text: &str, prompt: &str) -> u32 {
    let prompt_keywords = text::extract_keywords(prompt);
    if prompt_keywords.is_empty() {
        return BASELINE_SCORE;
    }

    let response_keywords: FxHashSet<String> =
        text::extract_keywords(response_text).into_iter().collect();
    let matched = prompt_keywords
        .iter()
        .filter(|w| response_keywords.contains(*w))
        .count();
    let coverage = matched as f64 / prompt_keywords.len() as f64;

    let length = length_score(text::extract_words(response_text).len());

    to_score((coverage * 0.6 + length * 0.4) * 100.0)
}

/// Length appropriateness by word count; 50-199 words is ideal.
#[must_use]
pub const fn length_score(word_count: usize) -> f64 {
    match word_count {
        0..=29 => 0.3,
        30..=49 => 0.6,
        50..=199 => 1.0,
        200..=399 => 0.8,
        _ => 0.5,
    }
}

/// Formatting and organization, an additive budget capped at 100.
///
/// | Component | Points |
/// |---|---|
/// | paragraphs: 2+ / 1 / 0 | 30 / 15 / 0 |
/// | sentence-length variance: >20 / >10 / else | 25 / 15 / 5 |
/// | punctuation per word in (0.05, 0.15) / otherwise / no words | 20 / 10 / 0 |
/// | markdown markers present | 25 |
///
/// Text without sentences scores 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn structural(text: &str) -> u32 {
    let sentences = text::split_sentences(text);
    if sentences.is_empty() {
        return 0;
    }

    let mut points = 0u32;

    points += match text::split_paragraphs(text).len() {
        0 => 0,
        1 => 15,
        _ => 30,
    };

    let lengths: Vec<f64> = sentences
        .iter()
        .map(|s| text::extract_words(s).len() as f64)
        .collect();
    let variance = population_variance(&lengths);
    points += if variance > 20.0 {
        25
    } else if variance > 10.0 {
        15
    } else {
        5
    };

    let word_count = text::extract_words(text).len();
    if word_count > 0 {
        let ratio = text::punctuation_count(text) as f64 / word_count as f64;
        points += if ratio > 0.05 && ratio < 0.15 { 20 } else { 10 };
    }

    if text::has_markdown(text) {
        points += 25;
    }

    points.min(100)
}

/// `|a ∩ b| / |a ∪ b|`; 0 for two empty sets.
#[allow(clippy::cast_precision_loss)]
fn jaccard(a: &FxHashSet<String>, b: &FxHashSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

#[allow(clippy::cast_precision_loss)]
fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Round to the nearest integer and clamp into `[0, 100]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn to_score(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT: &str = "Explain quantum computing in simple terms";

    #[test]
    fn test_coherence_baseline_for_single_sentence() {
        assert_eq!(coherence("Only one sentence here"), BASELINE_SCORE);
        assert_eq!(coherence(""), BASELINE_SCORE);
    }

    #[test]
    fn test_coherence_no_overlap() {
        assert_eq!(coherence("A. B. C."), 0);
    }

    #[test]
    fn test_coherence_full_overlap() {
        // identical word sets -> similarity 1.0 -> 80
        assert_eq!(coherence("Quantum bits flip. Quantum bits flip."), 80);
    }

    #[test]
    fn test_coherence_duplicate_words_collapse() {
        // {cats, dogs} vs {cats}: 1/2 regardless of repeats
        assert_eq!(coherence("Cats cats dogs. Cats."), 40);
    }

    #[test]
    fn test_coherence_transition_bonus_and_cap() {
        let text = "Quantum bits flip. However quantum bits flip. Quantum bits flip however.";
        // pairs: 3/4 then 4/4 -> 0.875 * 80 = 70, +20
        assert_eq!(coherence(text), 90);

        let capped = "Moreover same words. Moreover same words.";
        assert_eq!(coherence(capped), 100);
    }

    #[test]
    fn test_completeness_baseline_without_prompt_keywords() {
        assert_eq!(completeness("anything at all", "is it on"), BASELINE_SCORE);
        assert_eq!(completeness("", ""), BASELINE_SCORE);
    }

    #[test]
    fn test_completeness_coverage_and_length() {
        // prompt keywords: explain quantum computing simple terms
        let response = "Quantum computing uses qubits.";
        // coverage 2/5, 4 words -> 0.3
        // (0.4 * 0.6 + 0.3 * 0.4) * 100 = 36
        assert_eq!(completeness(response, PROMPT), 36);
    }

    #[test]
    fn test_completeness_repeated_prompt_keyword_counts_each_time() {
        // prompt keywords: [qubit, qubit, gate]; response has "qubit"
        assert_eq!(completeness("qubit", "qubit qubit gate"), 52);
    }

    #[test]
    fn test_length_score_bands() {
        assert!((length_score(0) - 0.3).abs() < f64::EPSILON);
        assert!((length_score(29) - 0.3).abs() < f64::EPSILON);
        assert!((length_score(30) - 0.6).abs() < f64::EPSILON);
        assert!((length_score(50) - 1.0).abs() < f64::EPSILON);
        assert!((length_score(199) - 1.0).abs() < f64::EPSILON);
        assert!((length_score(200) - 0.8).abs() < f64::EPSILON);
        assert!((length_score(400) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_structural_zero_sentences() {
        assert_eq!(structural(""), 0);
        assert_eq!(structural("   "), 0);
    }

    #[test]
    fn test_structural_single_paragraph_plain() {
        // 1 paragraph (15), lengths 3 and 2 (5), 2 punct / 5 words (10)
        assert_eq!(structural("Quantum bits flip. Qubits entangle."), 30);
    }

    #[test]
    fn test_structural_markdown_and_paragraphs() {
        let text = "# Heading\n\nSome text here.\n\n* item one";
        // 3 paragraphs (30) + variance small (5) + punct 1/6 out of band (10) + markdown (25)
        assert_eq!(structural(text), 70);
    }

    #[test]
    fn test_structural_punctuation_in_band() {
        // 10 words, 1 punctuation -> 0.1
        let text = "alpha bravo charlie delta echo foxtrot golf hotel india juliet.";
        // 1 paragraph (15) + single sentence variance 0 (5) + in band (20)
        assert_eq!(structural(text), 40);
    }

    #[test]
    fn test_structural_high_variance() {
        let long = "word ".repeat(12);
        let text = format!("Tiny. {long}.");
        // lengths 1 and 12 -> variance 30.25
        // 1 paragraph (15) + 25 + punct 2/13 out of band (10)
        assert_eq!(structural(&text), 50);
    }

    #[test]
    fn test_score_empty_text() {
        let metrics = score("", PROMPT);
        assert_eq!(metrics.coherence(), 50);
        assert_eq!(metrics.structural(), 0);
        // coverage 0, length 0.3 -> 12
        assert_eq!(metrics.completeness(), 12);
        assert_eq!(metrics.details().word_count, 0);
        assert_eq!(metrics.details().sentence_count, 0);
        assert_eq!(
            metrics.overall(),
            composite(metrics.coherence(), metrics.completeness(), metrics.structural())
        );
    }

    #[test]
    fn test_score_is_deterministic() {
        let text = "Quantum computers use qubits. Qubits can be in superposition.\n\nHowever, they are fragile.";
        assert_eq!(score(text, PROMPT), score(text, PROMPT));
    }

    #[test]
    fn test_to_score_rounding() {
        assert_eq!(to_score(49.5), 50);
        assert_eq!(to_score(-3.0), 0);
        assert_eq!(to_score(130.2), 100);
        assert_eq!(to_score(f64::NAN), 0);
    }
}
