//! Quality metric records - sub-scores, composite and descriptive statistics

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::text;

/// Weight of coherence in the composite score.
pub const COHERENCE_WEIGHT: f64 = 0.4;
/// Weight of completeness in the composite score.
pub const COMPLETENESS_WEIGHT: f64 = 0.35;
/// Weight of structure in the composite score.
pub const STRUCTURAL_WEIGHT: f64 = 0.25;

/// Weighted composite of the three sub-scores, rounded to the nearest integer.
#[must_use]
pub fn composite(coherence: u32, completeness: u32, structural: u32) -> u32 {
    super::to_score(
        f64::from(coherence) * COHERENCE_WEIGHT
            + f64::from(completeness) * COMPLETENESS_WEIGHT
            + f64::from(structural) * STRUCTURAL_WEIGHT,
    )
}

/// Three 0-100 sub-scores plus their weighted composite.
///
/// `overall` is always derived from the sub-scores through [`composite`];
/// there is no way to construct a `QualityMetrics` with an independent
/// overall value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    coherence: u32,
    completeness: u32,
    structural: u32,
    overall: u32,
    details: MetricDetails,
}

impl QualityMetrics {
    /// Assemble metrics from sub-scores; each is clamped to 100 and the
    /// composite is recomputed.
    #[must_use]
    pub fn new(coherence: u32, completeness: u32, structural: u32, details: MetricDetails) -> Self {
        let coherence = coherence.min(100);
        let completeness = completeness.min(100);
        let structural = structural.min(100);
        Self {
            coherence,
            completeness,
            structural,
            overall: composite(coherence, completeness, structural),
            details,
        }
    }

    /// Coherence sub-score.
    #[must_use]
    pub const fn coherence(&self) -> u32 {
        self.coherence
    }

    /// Completeness sub-score.
    #[must_use]
    pub const fn completeness(&self) -> u32 {
        self.completeness
    }

    /// Structural sub-score.
    #[must_use]
    pub const fn structural(&self) -> u32 {
        self.structural
    }

    /// Weighted composite score.
    #[must_use]
    pub const fn overall(&self) -> u32 {
        self.overall
    }

    /// Descriptive statistics of the scored text.
    #[must_use]
    pub const fn details(&self) -> &MetricDetails {
        &self.details
    }

    /// Replace the descriptive statistics, keeping the scores.
    pub fn set_details(&mut self, details: MetricDetails) {
        self.details = details;
    }
}

/// Descriptive statistics derived from a response text.
///
/// Derived data: it can always be regenerated from the text alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDetails {
    /// Number of normalized words
    pub word_count: usize,
    /// Number of sentences
    pub sentence_count: usize,
    /// Words per sentence, rounded; 0 without sentences
    pub avg_sentence_length: usize,
    /// Number of non-blank paragraphs
    pub paragraph_count: usize,
    /// Punctuation characters per word; 0 without words
    pub punctuation_density: f64,
    /// Distinct words over total words; 0 without words
    pub lexical_diversity: f64,
}

impl MetricDetails {
    /// Derive statistics from raw text.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn from_text(response_text: &str) -> Self {
        let words = text::extract_words(response_text);
        let sentence_count = text::split_sentences(response_text).len();
        let paragraph_count = text::split_paragraphs(response_text).len();
        let word_count = words.len();

        let avg_sentence_length = if sentence_count > 0 {
            (word_count as f64 / sentence_count as f64).round() as usize
        } else {
            0
        };

        let (punctuation_density, lexical_diversity) = if word_count > 0 {
            let distinct: FxHashSet<&str> = words.iter().map(String::as_str).collect();
            (
                text::punctuation_count(response_text) as f64 / word_count as f64,
                distinct.len() as f64 / word_count as f64,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            word_count,
            sentence_count,
            avg_sentence_length,
            paragraph_count,
            punctuation_density,
            lexical_diversity,
        }
    }
}

/// Mean sub-scores over a set of responses (comparison view).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricAverages {
    /// Mean coherence
    pub coherence: u32,
    /// Mean completeness
    pub completeness: u32,
    /// Mean structural score
    pub structural: u32,
    /// Mean overall score
    pub overall: u32,
}

impl MetricAverages {
    /// Average the metrics of every item; all zero for an empty input.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_metrics<'a, I>(metrics: I) -> Self
    where
        I: IntoIterator<Item = &'a QualityMetrics>,
    {
        let mut sums = [0u64; 4];
        let mut count = 0u64;
        for m in metrics {
            sums[0] += u64::from(m.coherence);
            sums[1] += u64::from(m.completeness);
            sums[2] += u64::from(m.structural);
            sums[3] += u64::from(m.overall);
            count += 1;
        }
        if count == 0 {
            return Self::default();
        }
        let mean = |sum: u64| super::to_score(sum as f64 / count as f64);
        Self {
            coherence: mean(sums[0]),
            completeness: mean(sums[1]),
            structural: mean(sums[2]),
            overall: mean(sums[3]),
        }
    }
}
