//! Worked grounding examples end to end through the public API.

use crate::citation::find_citations;
use crate::confidence::score_confidence;
use crate::graph::ContextGraph;
use crate::segment::count_sentences;
use crate::types::{Entity, EvidenceChunk};
use pretty_assertions::assert_eq;
use std::collections::{BTreeMap, BTreeSet};

fn france_chunks() -> Vec<EvidenceChunk> {
    vec![
        EvidenceChunk::new(0, "Paris is the capital of France.", 0.9),
        EvidenceChunk::new(1, "France has 67 million people.", 0.7),
    ]
}

fn scores(chunks: &[EvidenceChunk]) -> Vec<f64> {
    chunks.iter().map(|c| c.relevance_score).collect()
}

fn chunk_map(entries: Vec<(usize, Vec<&str>)>) -> BTreeMap<usize, Vec<String>> {
    entries
        .into_iter()
        .map(|(idx, names)| (idx, names.into_iter().map(String::from).collect()))
        .collect()
}

#[test]
fn test_supported_answer_is_fully_covered() {
    let chunks = france_chunks();
    let answer = "Paris is the capital of France.";

    let report = find_citations(answer, &chunks);
    let confidence = score_confidence(&report.citations, &scores(&chunks), count_sentences(answer));

    assert_eq!(report.citations.len(), 1);
    assert_eq!(report.citations[0].chunk_index, 0);
    assert_eq!(report.citations[0].relevance_score, 0.9);
    assert!(report.unsupported_segments.is_empty());
    assert_eq!(confidence.citation_coverage, 1.0);
}

#[test]
fn test_unsupported_answer_has_no_citation_quality() {
    let chunks = france_chunks();
    let answer = "The Eiffel Tower is very tall.";

    let report = find_citations(answer, &chunks);
    let confidence = score_confidence(&report.citations, &scores(&chunks), count_sentences(answer));

    assert!(report.citations.is_empty());
    assert_eq!(report.unsupported_segments, vec![answer.to_string()]);
    assert_eq!(confidence.citation_quality, 0.0);
}

#[test]
fn test_graph_has_single_co_occurrence_edge() {
    let entities = vec![
        Entity::new("Paris", "UNKNOWN", 0),
        Entity::new("France", "UNKNOWN", 1),
    ];
    let retrieved: BTreeSet<usize> = [0, 1].into_iter().collect();
    let chunk_entities = chunk_map(vec![(0, vec!["Paris", "France"]), (1, vec!["France"])]);

    let graph = ContextGraph::build(&entities, &retrieved, &chunk_entities);
    let data = graph.to_graph_data();

    let node_ids: Vec<&str> = data.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(node_ids, vec!["Paris", "France"]);
    assert_eq!(data.edges.len(), 1);
    assert!(graph.contains_edge("France", "Paris"));
    assert_eq!(graph.edge("Paris", "France").unwrap().representative_chunk, 0);
}

#[test]
fn test_graph_scope_excludes_unretrieved_entities() {
    let entities = vec![
        Entity::new("Paris", "UNKNOWN", 0),
        Entity::new("France", "UNKNOWN", 1),
    ];
    let retrieved: BTreeSet<usize> = [0].into_iter().collect();
    let chunk_entities = chunk_map(vec![(0, vec!["Paris", "France"]), (1, vec!["France"])]);

    let graph = ContextGraph::build(&entities, &retrieved, &chunk_entities);

    let node_ids: Vec<&str> = graph.node_names().collect();
    assert_eq!(node_ids, vec!["Paris"]);
    assert_eq!(graph.edge_count(), 0);
}
