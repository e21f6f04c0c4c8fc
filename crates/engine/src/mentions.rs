//! Entity mention linking.
//!
//! Finds which candidate entities literally appear in the answer. Matching is
//! a case-insensitive substring search; each candidate record that matches
//! yields its own [`AnswerEntity`], so a name listed twice under different
//! chunk ids produces two identically positioned records.

use crate::types::{AnswerEntity, Entity};

/// Retrieval score reported for entities that carry none.
pub const DEFAULT_RETRIEVAL_SCORE: f64 = 0.5;

/// Link candidate entities to their first mention in `answer`.
///
/// Entities that are not mentioned are omitted. Entities with an empty name
/// are skipped.
pub fn link_mentions(answer: &str, entities: &[Entity]) -> Vec<AnswerEntity> {
    let answer_lower = answer.to_lowercase();

    let linked: Vec<AnswerEntity> = entities
        .iter()
        .filter(|entity| !entity.name.is_empty())
        .filter_map(|entity| {
            let position = find_char_position(&answer_lower, &entity.name.to_lowercase())?;
            Some(AnswerEntity {
                name: entity.name.clone(),
                entity_type: entity.entity_type.clone(),
                source_chunk_id: entity.source_chunk_id,
                position_in_answer: position,
                retrieval_score: entity.retrieval_score.unwrap_or(DEFAULT_RETRIEVAL_SCORE),
                mentioned: true,
            })
        })
        .collect();

    tracing::debug!(
        "Linked {} of {} candidate entities to the answer",
        linked.len(),
        entities.len()
    );

    linked
}

/// Character offset of the first occurrence of `needle` in `haystack`.
fn find_char_position(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte_pos| haystack[..byte_pos].chars().count())
}
