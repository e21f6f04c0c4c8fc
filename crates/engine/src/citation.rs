//! Citation matching.
//!
//! Reconstructs textual grounding for an answer after the fact. Each answer
//! sentence is aligned to the first chunk, in retrieval rank order, that
//! either contains the sentence verbatim (case-insensitive) or contains
//! enough of the sentence's key terms. Bracketed chunk references the
//! generator may have emitted are ignored; grounding is re-derived from text.

use crate::segment::split_sentences;
use crate::types::{Citation, EvidenceChunk};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Characters of chunk text kept in a citation preview.
pub const PREVIEW_CHARS: usize = 200;

/// Characters of the sentence kept as matched text.
pub const MATCHED_TEXT_CHARS: usize = 100;

/// Words must be longer than this (in characters) to count as key terms.
const KEY_TERM_MIN_EXCLUSIVE: usize = 4;

/// Key-term threshold never drops below this.
const MIN_TERM_MATCHES: usize = 2;

/// Citations and unsupported sentences for one answer.
///
/// `citations.len() + unsupported_segments.len() == sentence_count`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationReport {
    pub citations: Vec<Citation>,
    pub unsupported_segments: Vec<String>,
    pub sentence_count: usize,
}

/// Align every answer sentence to at most one supporting chunk.
///
/// `chunks` must be in retrieval rank order; the earliest-ranked matching
/// chunk wins. A chunk may support any number of sentences.
pub fn find_citations(answer: &str, chunks: &[EvidenceChunk]) -> CitationReport {
    let lowered: Vec<String> = chunks.iter().map(|c| c.text.to_lowercase()).collect();
    let mut report = CitationReport::default();

    for sentence in split_sentences(answer) {
        report.sentence_count += 1;

        let sentence_lower = sentence.to_lowercase();
        let terms = key_terms(sentence);

        let matched = chunks
            .iter()
            .zip(&lowered)
            .find(|(_, chunk_lower)| is_citation_match(&sentence_lower, &terms, chunk_lower));

        match matched {
            Some((chunk, _)) => report.citations.push(Citation {
                chunk_index: chunk.index,
                chunk_preview: truncate_chars(&chunk.text, PREVIEW_CHARS),
                relevance_score: chunk.relevance_score,
                matched_text: truncate_chars(sentence, MATCHED_TEXT_CHARS),
            }),
            None => report.unsupported_segments.push(sentence.to_string()),
        }
    }

    tracing::debug!(
        "Citation matching: {} sentences, {} cited, {} unsupported",
        report.sentence_count,
        report.citations.len(),
        report.unsupported_segments.len()
    );

    report
}

/// Map each chunk index to every answer sentence it loosely supports.
///
/// Looser than [`find_citations`]: a single shared key term is enough, and
/// one sentence may be attributed to several chunks.
pub fn link_chunks_to_segments(
    answer: &str,
    chunks: &[EvidenceChunk],
) -> BTreeMap<usize, Vec<String>> {
    let lowered: Vec<String> = chunks.iter().map(|c| c.text.to_lowercase()).collect();
    let mut support: BTreeMap<usize, Vec<String>> = BTreeMap::new();

    for sentence in split_sentences(answer) {
        let sentence_lower = sentence.to_lowercase();
        let terms = key_terms(sentence);

        for (chunk, chunk_lower) in chunks.iter().zip(&lowered) {
            let supports = chunk_lower.contains(&sentence_lower)
                || terms.iter().any(|term| chunk_lower.contains(*term));
            if supports {
                support
                    .entry(chunk.index)
                    .or_default()
                    .push(sentence.to_string());
            }
        }
    }

    support
}

/// Whitespace-separated words longer than four characters.
///
/// Terms keep their case and punctuation but are searched for in lowercased
/// chunk text, so "France" and "today." can never hit.
fn key_terms(sentence: &str) -> HashSet<&str> {
    sentence
        .split_whitespace()
        .filter(|word| word.chars().count() > KEY_TERM_MIN_EXCLUSIVE)
        .collect()
}

/// Number of key-term hits needed for a partial match.
fn required_term_matches(term_count: usize) -> usize {
    MIN_TERM_MATCHES.max(term_count / 2)
}

fn is_citation_match(sentence_lower: &str, terms: &HashSet<&str>, chunk_lower: &str) -> bool {
    if chunk_lower.contains(sentence_lower) {
        return true;
    }

    let hits = terms
        .iter()
        .filter(|term| chunk_lower.contains(*term))
        .count();
    hits >= required_term_matches(terms.len())
}

/// Keep at most `max_chars` characters of `text`.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunks() -> Vec<EvidenceChunk> {
        vec![
            EvidenceChunk::new(0, "Paris is the capital of France.", 0.9),
            EvidenceChunk::new(1, "France has 67 million people.", 0.7),
        ]
    }

    #[test]
    fn test_exact_sentence_match() {
        let report = find_citations("Paris is the capital of France.", &chunks());

        assert_eq!(report.citations.len(), 1);
        assert_eq!(report.citations[0].chunk_index, 0);
        assert_eq!(report.citations[0].relevance_score, 0.9);
        assert_eq!(report.citations[0].matched_text, "Paris is the capital of France.");
        assert!(report.unsupported_segments.is_empty());
    }

    #[test]
    fn test_exact_match_ignores_case() {
        let report = find_citations("PARIS IS THE CAPITAL OF FRANCE.", &chunks());
        assert_eq!(report.citations[0].chunk_index, 0);
    }

    #[test]
    fn test_unsupported_sentence() {
        let report = find_citations("The Eiffel Tower is very tall.", &chunks());

        assert!(report.citations.is_empty());
        assert_eq!(report.unsupported_segments, vec!["The Eiffel Tower is very tall."]);
        assert_eq!(report.sentence_count, 1);
    }

    #[test]
    fn test_key_term_match() {
        // Five key terms, so two must hit: "population" and "million" do.
        // "France's" is capitalised and never counts.
        let chunks = vec![EvidenceChunk::new(
            4,
            "The population of the republic is about 67 million.",
            0.6,
        )];
        let report = find_citations("France's population is roughly 67 million today.", &chunks);

        assert_eq!(report.citations.len(), 1);
        assert_eq!(report.citations[0].chunk_index, 4);
    }

    #[test]
    fn test_capitalised_key_terms_never_match() {
        let chunks = vec![EvidenceChunk::new(0, "graydon hoare worked at mozilla research", 0.8)];
        let report = find_citations("Graydon Hoare founded Mozilla Research.", &chunks);

        assert!(report.citations.is_empty());
        assert_eq!(
            report.unsupported_segments,
            vec!["Graydon Hoare founded Mozilla Research."]
        );
    }

    #[test]
    fn test_lowercase_key_terms_still_match() {
        let chunks = vec![EvidenceChunk::new(0, "graydon hoare worked at mozilla research", 0.8)];
        let report = find_citations("graydon hoare founded mozilla research.", &chunks);

        assert_eq!(report.citations.len(), 1);
    }

    #[test]
    fn test_single_key_term_is_never_enough() {
        let chunks = vec![EvidenceChunk::new(0, "a capital idea", 0.5)];
        let report = find_citations("Its capital is big.", &chunks);

        assert!(report.citations.is_empty());
    }

    #[test]
    fn test_rank_order_wins_over_index_order() {
        let chunks = vec![
            EvidenceChunk::new(7, "Rust guarantees memory safety without garbage collection.", 0.8),
            EvidenceChunk::new(2, "Rust guarantees memory safety without garbage collection.", 0.95),
        ];
        let report = find_citations("Rust guarantees memory safety without garbage collection.", &chunks);

        assert_eq!(report.citations[0].chunk_index, 7);
        assert_eq!(report.citations[0].relevance_score, 0.8);
    }

    #[test]
    fn test_chunk_may_support_many_sentences() {
        let chunks = vec![EvidenceChunk::new(
            0,
            "Paris is the capital of France. France has 67 million people.",
            0.9,
        )];
        let report = find_citations(
            "Paris is the capital of France. France has 67 million people.",
            &chunks,
        );

        assert_eq!(report.citations.len(), 2);
        assert!(report.citations.iter().all(|c| c.chunk_index == 0));
    }

    #[test]
    fn test_counts_add_up() {
        let answer = "Paris is the capital of France. Dragons live there! Who knows? France has 67 million people.";
        let report = find_citations(answer, &chunks());

        assert_eq!(report.sentence_count, 4);
        assert_eq!(
            report.citations.len() + report.unsupported_segments.len(),
            report.sentence_count
        );
        assert_eq!(report.unsupported_segments, vec!["Dragons live there!", "Who knows?"]);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(find_citations("", &chunks()), CitationReport::default());

        let report = find_citations("Something was said.", &[]);
        assert_eq!(report.unsupported_segments, vec!["Something was said."]);
    }

    #[test]
    fn test_preview_and_matched_text_are_truncated() {
        let long_chunk = format!("{} end.", "word ".repeat(100));
        let sentence = "word ".repeat(40).trim_end().to_string();
        let chunks = vec![EvidenceChunk::new(0, long_chunk, 0.5)];

        let report = find_citations(&sentence, &chunks);
        let citation = &report.citations[0];

        assert_eq!(citation.chunk_preview.chars().count(), PREVIEW_CHARS);
        assert_eq!(citation.matched_text.chars().count(), MATCHED_TEXT_CHARS);
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_link_chunks_to_segments() {
        let support = link_chunks_to_segments(
            "Paris is the capital of France. Nothing else matters.",
            &chunks(),
        );

        assert_eq!(support.len(), 1);
        assert_eq!(support[&0], vec!["Paris is the capital of France."]);
    }

    #[test]
    fn test_link_chunks_ignores_capitalised_terms() {
        let chunks = vec![EvidenceChunk::new(3, "france has 67 million people", 0.7)];

        assert!(link_chunks_to_segments("France grew.", &chunks).is_empty());
        assert_eq!(
            link_chunks_to_segments("Its million residents.", &chunks)[&3],
            vec!["Its million residents."]
        );
    }
}
