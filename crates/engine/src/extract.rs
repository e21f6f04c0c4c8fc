//! Entity extraction.
//!
//! The engine normally receives entities from an upstream extractor. When a
//! request arrives without any, the regex fallback here finds capitalised
//! phrases. It cannot classify them, so every entity is typed
//! [`UNKNOWN_TYPE`].

use crate::types::{Entity, EvidenceChunk};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

/// Type assigned when no real classifier is available.
pub const UNKNOWN_TYPE: &str = "UNKNOWN";

/// Capitalised words, optionally followed by more capitalised words.
const CAPITALIZED_PHRASE: &str = r"\b([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*)\b";

/// Matches must be longer than this many characters.
const MIN_NAME_CHARS_EXCLUSIVE: usize = 2;

/// An entity as reported by an extractor, before chunk attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntity {
    pub name: String,
    pub entity_type: String,
    /// Character offset of the match in the source text
    pub start: usize,
}

/// Source of candidate entities for a text.
pub trait EntityExtractor {
    /// Extract entities, deduplicated by `(lowercase(name), type)`.
    fn extract(&self, text: &str) -> Vec<ExtractedEntity>;
}

/// Regex fallback extractor.
#[derive(Debug, Clone)]
pub struct CapitalizedPhraseExtractor {
    pattern: Regex,
}

impl CapitalizedPhraseExtractor {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(CAPITALIZED_PHRASE).expect("valid capitalized phrase regex"),
        }
    }
}

impl Default for CapitalizedPhraseExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityExtractor for CapitalizedPhraseExtractor {
    fn extract(&self, text: &str) -> Vec<ExtractedEntity> {
        let mut seen = HashSet::new();

        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .filter(|m| m.as_str().chars().count() > MIN_NAME_CHARS_EXCLUSIVE)
            .filter(|m| seen.insert(m.as_str().to_lowercase()))
            .map(|m| ExtractedEntity {
                name: m.as_str().to_string(),
                entity_type: UNKNOWN_TYPE.to_string(),
                start: text[..m.start()].chars().count(),
            })
            .collect()
    }
}

/// Extract entities from every chunk.
///
/// Returns the batch-deduplicated entity list, where each entity's
/// `source_chunk_id` is the first chunk it was seen in, and the index of
/// entity names per chunk.
pub fn extract_from_chunks(
    extractor: &dyn EntityExtractor,
    chunks: &[EvidenceChunk],
) -> (Vec<Entity>, BTreeMap<usize, Vec<String>>) {
    let mut entities = Vec::new();
    let mut chunk_entities = BTreeMap::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for chunk in chunks {
        let found = extractor.extract(&chunk.text);

        for ent in &found {
            if seen.insert((ent.name.to_lowercase(), ent.entity_type.clone())) {
                entities.push(Entity::new(ent.name.clone(), ent.entity_type.clone(), chunk.index));
            }
        }

        chunk_entities.insert(chunk.index, found.into_iter().map(|e| e.name).collect());
    }

    tracing::debug!(
        "Extracted {} unique entities from {} chunks",
        entities.len(),
        chunks.len()
    );

    (entities, chunk_entities)
}
