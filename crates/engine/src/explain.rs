//! Explain pipeline orchestration.
//!
//! Runs the grounding components over one query's inputs and merges their
//! outputs into a single [`ExplainResponse`]:
//! 1. Validates the request (fail fast on caller contract breaches)
//! 2. Resolves candidate entities (request-supplied or fallback-extracted)
//! 3. Matches citations and scores confidence
//! 4. Links entity mentions in the answer
//! 5. Builds the query-scoped context graph

use crate::citation::find_citations;
use crate::confidence::score_confidence;
use crate::extract::{extract_from_chunks, CapitalizedPhraseExtractor};
use crate::graph::ContextGraph;
use crate::mentions::link_mentions;
use crate::types::{ChunkReference, Entity, EvidenceChunk, ExplainRequest, ExplainResponse};
use grounded_core::{AppError, AppResult, ExplainSettings};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// Filename reported for chunks whose retriever gave no source.
const UNKNOWN_SOURCE: &str = "unknown";

/// Pipeline options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplainOptions {
    /// Requests with more chunks than this are rejected
    pub max_chunks: usize,

    /// Run the fallback extractor when the request has no entities
    pub extract_entities: bool,
}

impl Default for ExplainOptions {
    fn default() -> Self {
        Self {
            max_chunks: grounded_core::config::DEFAULT_MAX_CHUNKS,
            extract_entities: false,
        }
    }
}

impl From<&ExplainSettings> for ExplainOptions {
    fn from(settings: &ExplainSettings) -> Self {
        Self {
            max_chunks: settings.max_chunks,
            extract_entities: settings.extract_entities,
        }
    }
}

/// Explain an answer with default options.
pub fn explain(request: &ExplainRequest) -> AppResult<ExplainResponse> {
    explain_with_options(request, &ExplainOptions::default())
}

/// Explain an answer against the evidence it was generated from.
pub fn explain_with_options(
    request: &ExplainRequest,
    options: &ExplainOptions,
) -> AppResult<ExplainResponse> {
    let _span = tracing::debug_span!("explain", chunks = request.chunks.len()).entered();

    validate_request(request, options)?;

    if request.answer.trim().is_empty() {
        tracing::warn!("Explaining an empty answer for query: {}", request.query);
    }

    let (entities, chunk_entities) = resolve_entities(request, options);

    let report = find_citations(&request.answer, &request.chunks);
    let relevance_scores: Vec<f64> = request.chunks.iter().map(|c| c.relevance_score).collect();
    let confidence = score_confidence(&report.citations, &relevance_scores, report.sentence_count);

    let answer_entities = link_mentions(&request.answer, &entities);

    let retrieved: BTreeSet<usize> = request.chunks.iter().map(|c| c.index).collect();
    let graph = ContextGraph::build(&entities, &retrieved, &chunk_entities);
    let graph_stats = graph.stats();

    tracing::info!(
        "Explained answer: {}/{} sentences cited, confidence {:.3}, {} answer entities, graph {} nodes / {} edges",
        report.citations.len(),
        report.sentence_count,
        confidence.score,
        answer_entities.len(),
        graph_stats.node_count,
        graph_stats.edge_count
    );

    Ok(ExplainResponse {
        answer: request.answer.clone(),
        entities: entities.into_owned(),
        answer_entities,
        citations: report.citations,
        unsupported_segments: report.unsupported_segments,
        confidence_score: confidence.score,
        confidence,
        graph: graph.to_graph_data(),
        graph_stats,
        relationships: graph.relationships(),
        chunk_references: chunk_references(&request.chunks),
    })
}

/// Reject requests that indicate an upstream bug.
fn validate_request(request: &ExplainRequest, options: &ExplainOptions) -> AppResult<()> {
    if request.chunks.len() > options.max_chunks {
        return Err(AppError::Precondition(format!(
            "{} evidence chunks exceed the limit of {}",
            request.chunks.len(),
            options.max_chunks
        )));
    }

    let mut indices = BTreeSet::new();
    for chunk in &request.chunks {
        if !indices.insert(chunk.index) {
            return Err(AppError::Precondition(format!(
                "duplicate evidence chunk index {}",
                chunk.index
            )));
        }
        if !chunk.relevance_score.is_finite() {
            return Err(AppError::Precondition(format!(
                "chunk {} has non-finite relevance score {}",
                chunk.index, chunk.relevance_score
            )));
        }
    }

    if let Some(pos) = request.entities.iter().position(|e| e.name.is_empty()) {
        return Err(AppError::Precondition(format!(
            "entity at position {} has an empty name",
            pos
        )));
    }

    Ok(())
}

type ChunkEntityIndex = BTreeMap<usize, Vec<String>>;

/// Use the request's entities, or extract them when allowed and absent.
fn resolve_entities<'a>(
    request: &'a ExplainRequest,
    options: &ExplainOptions,
) -> (Cow<'a, [Entity]>, Cow<'a, ChunkEntityIndex>) {
    if request.entities.is_empty() && options.extract_entities {
        tracing::debug!("No entities supplied, running fallback extractor");
        let (entities, chunk_entities) =
            extract_from_chunks(&CapitalizedPhraseExtractor::new(), &request.chunks);
        return (Cow::Owned(entities), Cow::Owned(chunk_entities));
    }

    (
        Cow::Borrowed(request.entities.as_slice()),
        Cow::Borrowed(&request.chunk_entities),
    )
}

fn chunk_references(chunks: &[EvidenceChunk]) -> Vec<ChunkReference> {
    chunks
        .iter()
        .map(|chunk| ChunkReference {
            index: chunk.index,
            filename: chunk
                .source
                .clone()
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            relevance_score: chunk.relevance_score,
        })
        .collect()
}
