//! Grounding engine type definitions.
//!
//! Every value here is built fresh per explain call from collaborator
//! outputs. Field names serialize in camelCase to match the response record
//! consumed by the frontend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A retrieved span of source text with its retriever-defined score.
///
/// The score is an opaque ranking signal. It is not guaranteed to lie in
/// [0, 1] and is never recalibrated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceChunk {
    /// Chunk index in the session's chunk store
    pub index: usize,

    /// Chunk text
    pub text: String,

    /// Retrieval relevance score
    pub relevance_score: f64,

    /// Originating file name, when the retriever knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl EvidenceChunk {
    pub fn new(index: usize, text: impl Into<String>, relevance_score: f64) -> Self {
        Self {
            index,
            text: text.into(),
            relevance_score,
            source: None,
        }
    }

    /// Attach the originating file name.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A candidate entity found in the retrieved evidence.
///
/// `entity_type` is free-form: the upstream extractor may only ever emit
/// `"UNKNOWN"`, so nothing downstream branches on its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,

    #[serde(rename = "type")]
    pub entity_type: String,

    pub source_chunk_id: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_score: Option<f64>,
}

impl Entity {
    pub fn new(name: impl Into<String>, entity_type: impl Into<String>, source_chunk_id: usize) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            source_chunk_id,
            retrieval_score: None,
        }
    }

    pub fn with_retrieval_score(mut self, score: f64) -> Self {
        self.retrieval_score = Some(score);
        self
    }
}

/// Link from one answer sentence to the chunk judged to support it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub chunk_index: usize,

    /// First 200 characters of the chunk
    pub chunk_preview: String,

    pub relevance_score: f64,

    /// First 100 characters of the supported sentence
    pub matched_text: String,
}

/// An entity whose name literally appears in the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntity {
    pub name: String,

    #[serde(rename = "type")]
    pub entity_type: String,

    pub source_chunk_id: usize,

    /// Character offset of the first case-insensitive match
    pub position_in_answer: usize,

    pub retrieval_score: f64,

    pub mentioned: bool,
}

/// Chunk-level source attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkReference {
    pub index: usize,
    pub filename: String,
    pub relevance_score: f64,
}

/// Exported graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: String,
}

/// Exported graph edge, one per unordered entity pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub label: String,
}

/// Graph in the shape the visualisation consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Relationship view of a graph edge with its representative chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub from_entity: String,
    pub to_entity: String,
    pub relation: String,
    pub chunk_index: usize,
}

/// Size summary of a context graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    /// Total co-occurrence events recorded across all edges
    pub provenance_count: usize,
}

/// Everything the engine needs for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainRequest {
    pub query: String,

    /// Evidence in retrieval rank order
    pub chunks: Vec<EvidenceChunk>,

    /// Generated answer text
    pub answer: String,

    /// Deduplicated candidate entities
    #[serde(default)]
    pub entities: Vec<Entity>,

    /// Chunk index to the entity names found in that chunk
    #[serde(default)]
    pub chunk_entities: BTreeMap<usize, Vec<String>>,
}

/// The per-query response record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainResponse {
    pub answer: String,
    pub entities: Vec<Entity>,
    pub answer_entities: Vec<AnswerEntity>,
    pub citations: Vec<Citation>,
    pub unsupported_segments: Vec<String>,
    pub confidence_score: f64,
    pub confidence: crate::confidence::ConfidenceBreakdown,
    pub graph: GraphData,
    pub graph_stats: GraphStats,
    pub relationships: Vec<Relationship>,
    pub chunk_references: Vec<ChunkReference>,
}
