//! Confidence scoring.
//!
//! Combines retrieval quality, citation coverage and citation quality into a
//! single [0, 1] score. The weights are fixed; callers that want a different
//! weighting post-process the breakdown.

use crate::types::Citation;
use serde::{Deserialize, Serialize};

pub const RETRIEVAL_WEIGHT: f64 = 0.4;
pub const COVERAGE_WEIGHT: f64 = 0.35;
pub const QUALITY_WEIGHT: f64 = 0.25;

/// Components of a confidence score and the composed result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceBreakdown {
    /// Mean relevance over the whole retrieved set
    pub retrieval_quality: f64,

    /// Share of answer sentences that received a citation
    pub citation_coverage: f64,

    /// Mean relevance of the cited chunks
    pub citation_quality: f64,

    /// Weighted, clamped combination
    pub score: f64,
}

/// Score an answer from its citations and the retrieved set's relevance scores.
///
/// An empty `relevance_scores` forces the score to 0.0 whatever the other
/// inputs say; the components are still reported.
pub fn score_confidence(
    citations: &[Citation],
    relevance_scores: &[f64],
    sentence_count: usize,
) -> ConfidenceBreakdown {
    let retrieval_quality = mean(relevance_scores.iter().copied());
    let citation_coverage = citation_coverage(citations.len(), sentence_count);
    let citation_quality = mean(citations.iter().map(|c| c.relevance_score));

    let score = if relevance_scores.is_empty() {
        0.0
    } else {
        (RETRIEVAL_WEIGHT * retrieval_quality
            + COVERAGE_WEIGHT * citation_coverage
            + QUALITY_WEIGHT * citation_quality)
            .clamp(0.0, 1.0)
    };

    tracing::debug!(
        "Confidence: retrieval={:.3} coverage={:.3} quality={:.3} -> {:.3}",
        retrieval_quality,
        citation_coverage,
        citation_quality,
        score
    );

    ConfidenceBreakdown {
        retrieval_quality,
        citation_coverage,
        citation_quality,
        score,
    }
}

/// Composed confidence score only.
pub fn confidence_score(citations: &[Citation], relevance_scores: &[f64], sentence_count: usize) -> f64 {
    score_confidence(citations, relevance_scores, sentence_count).score
}

/// Fraction of sentences cited, capped at 1.0. No sentences means full coverage.
pub fn citation_coverage(citation_count: usize, sentence_count: usize) -> f64 {
    if sentence_count == 0 {
        return 1.0;
    }
    (citation_count as f64 / sentence_count as f64).min(1.0)
}

/// Arithmetic mean, 0.0 for an empty sequence.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citation(score: f64) -> Citation {
        Citation {
            chunk_index: 0,
            chunk_preview: String::new(),
            relevance_score: score,
            matched_text: String::new(),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_relevance_scores_short_circuit() {
        let citations = vec![citation(0.9), citation(0.8)];
        assert_eq!(confidence_score(&citations, &[], 2), 0.0);
        assert_eq!(confidence_score(&[], &[], 0), 0.0);
    }

    #[test]
    fn test_zero_sentences_is_full_coverage() {
        let breakdown = score_confidence(&[], &[0.5], 0);
        assert_eq!(breakdown.citation_coverage, 1.0);
        assert_eq!(breakdown.citation_quality, 0.0);
        assert!(approx(breakdown.score, 0.4 * 0.5 + 0.35));
    }

    #[test]
    fn test_weighted_combination() {
        // Paris example: one sentence cited from the 0.9 chunk.
        let breakdown = score_confidence(&[citation(0.9)], &[0.9, 0.7], 1);

        assert!(approx(breakdown.retrieval_quality, 0.8));
        assert_eq!(breakdown.citation_coverage, 1.0);
        assert!(approx(breakdown.citation_quality, 0.9));
        assert!(approx(breakdown.score, 0.4 * 0.8 + 0.35 + 0.25 * 0.9));
    }

    #[test]
    fn test_unsupported_answer() {
        let breakdown = score_confidence(&[], &[0.9, 0.7], 1);

        assert_eq!(breakdown.citation_coverage, 0.0);
        assert_eq!(breakdown.citation_quality, 0.0);
        assert!(approx(breakdown.score, 0.32));
    }

    #[test]
    fn test_coverage_is_capped() {
        assert_eq!(citation_coverage(5, 2), 1.0);
        assert_eq!(citation_coverage(1, 4), 0.25);
    }

    #[test]
    fn test_score_is_clamped() {
        // Unnormalized retriever scores can push the raw sum past 1.0.
        let high = score_confidence(&[citation(5.0)], &[5.0], 1);
        assert_eq!(high.score, 1.0);

        let low = score_confidence(&[], &[-3.0], 1);
        assert_eq!(low.score, 0.0);
    }
}
