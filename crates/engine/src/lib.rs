//! Explainability and grounding engine.
//!
//! Given a generated answer and the ranked evidence it was conditioned on,
//! deterministically:
//! - attributes each answer sentence to a supporting chunk, or marks it
//!   unsupported (`citation`)
//! - scores confidence from retrieval and citation quality (`confidence`)
//! - links mentioned entities back to the answer (`mentions`)
//! - builds a knowledge graph scoped to the retrieved evidence (`graph`)
//!
//! Every component is a pure, synchronous function over in-memory values.
//! Nothing persists across calls, so queries may run concurrently.

pub mod citation;
pub mod confidence;
pub mod explain;
pub mod extract;
pub mod graph;
pub mod mentions;
pub mod segment;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use citation::{find_citations, link_chunks_to_segments, CitationReport};
pub use confidence::{confidence_score, score_confidence, ConfidenceBreakdown};
pub use explain::{explain, explain_with_options, ExplainOptions};
pub use extract::{extract_from_chunks, CapitalizedPhraseExtractor, EntityExtractor};
pub use graph::{ContextGraph, Provenance};
pub use mentions::link_mentions;
pub use segment::{count_sentences, split_sentences, Sentences};
pub use types::{
    AnswerEntity, ChunkReference, Citation, Entity, EvidenceChunk, ExplainRequest,
    ExplainResponse, GraphData, GraphEdge, GraphNode, GraphStats, Relationship,
};
