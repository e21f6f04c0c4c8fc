//! Query-scoped context graph.
//!
//! Builds an entity co-occurrence graph restricted to the chunks retrieved
//! for one query. Entities whose source chunk was not retrieved never become
//! nodes.
//!
//! Edges carry two kinds of bookkeeping:
//! - display attributes (`representative_chunk`, `weight`), last writer wins
//!   as chunks are processed in ascending index order;
//! - provenance, an append-only list of every `(chunk, pair)` co-occurrence.
//!
//! A graph is a plain value built by [`ContextGraph::build`]. It is never
//! mutated after construction and never shared between queries.

use crate::types::{Entity, EvidenceChunk, GraphData, GraphEdge, GraphNode, GraphStats, Relationship};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Relation label for co-occurrence edges.
pub const CO_OCCURS: &str = "co-occurs";

/// Weight assigned to every co-occurrence edge.
const CO_OCCURRENCE_WEIGHT: f64 = 1.0;

/// Unordered pair of entity names, stored sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    low: String,
    high: String,
}

impl EdgeKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            low: low.to_string(),
            high: high.to_string(),
        }
    }

    pub fn names(&self) -> (&str, &str) {
        (&self.low, &self.high)
    }
}

/// Node attributes, fixed by the first entity record seen for a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAttributes {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub first_source_chunk: usize,
}

/// Display attributes of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeAttributes {
    pub relation: String,
    pub representative_chunk: usize,
    pub weight: f64,
}

/// One co-occurrence event contributing to an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub chunk_index: usize,
    /// The pair in the order it was encountered in the chunk
    pub entities: [String; 2],
}

#[derive(Debug, Clone)]
struct Edge {
    source: String,
    target: String,
    attributes: EdgeAttributes,
}

/// Co-occurrence graph over one query's retrieved evidence.
#[derive(Debug, Clone, Default)]
pub struct ContextGraph {
    node_order: Vec<String>,
    nodes: HashMap<String, NodeAttributes>,
    edge_order: Vec<EdgeKey>,
    edges: HashMap<EdgeKey, Edge>,
    provenance: HashMap<EdgeKey, Vec<Provenance>>,
}

impl ContextGraph {
    /// Build the graph for one query.
    ///
    /// # Arguments
    /// * `entities` - Full deduplicated entity list
    /// * `retrieved` - Indices of the chunks retrieved for this query
    /// * `chunk_entities` - Chunk index to the entity names found in it
    pub fn build(
        entities: &[Entity],
        retrieved: &BTreeSet<usize>,
        chunk_entities: &BTreeMap<usize, Vec<String>>,
    ) -> Self {
        let mut graph = Self::default();

        let in_scope: Vec<&Entity> = entities
            .iter()
            .filter(|e| retrieved.contains(&e.source_chunk_id))
            .collect();

        for entity in &in_scope {
            graph.add_node(entity);
        }

        let scoped_names: HashSet<&str> = in_scope.iter().map(|e| e.name.as_str()).collect();

        for &chunk_index in retrieved {
            let Some(names) = chunk_entities.get(&chunk_index) else {
                continue;
            };

            let names_in_chunk: Vec<&str> = names
                .iter()
                .map(String::as_str)
                .filter(|name| scoped_names.contains(name))
                .collect();

            for (i, first) in names_in_chunk.iter().enumerate() {
                for second in &names_in_chunk[i + 1..] {
                    if first != second {
                        graph.add_co_occurrence(first, second, chunk_index);
                    }
                }
            }
        }

        tracing::debug!(
            "Context graph: {} of {} entities in scope, {} nodes, {} edges over {} retrieved chunks",
            in_scope.len(),
            entities.len(),
            graph.node_count(),
            graph.edge_count(),
            retrieved.len()
        );

        graph
    }

    fn add_node(&mut self, entity: &Entity) {
        if self.nodes.contains_key(&entity.name) {
            return;
        }
        self.node_order.push(entity.name.clone());
        self.nodes.insert(
            entity.name.clone(),
            NodeAttributes {
                entity_type: entity.entity_type.clone(),
                first_source_chunk: entity.source_chunk_id,
            },
        );
    }

    fn add_co_occurrence(&mut self, first: &str, second: &str, chunk_index: usize) {
        let key = EdgeKey::new(first, second);
        let attributes = EdgeAttributes {
            relation: CO_OCCURS.to_string(),
            representative_chunk: chunk_index,
            weight: CO_OCCURRENCE_WEIGHT,
        };

        match self.edges.get_mut(&key) {
            Some(edge) => edge.attributes = attributes,
            None => {
                self.edge_order.push(key.clone());
                self.edges.insert(
                    key.clone(),
                    Edge {
                        source: first.to_string(),
                        target: second.to_string(),
                        attributes,
                    },
                );
            }
        }

        self.provenance.entry(key).or_default().push(Provenance {
            chunk_index,
            entities: [first.to_string(), second.to_string()],
        });
    }

    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_order.len()
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node(&self, name: &str) -> Option<&NodeAttributes> {
        self.nodes.get(name)
    }

    /// Node names in insertion order.
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.node_order.iter().map(String::as_str)
    }

    pub fn contains_edge(&self, a: &str, b: &str) -> bool {
        self.edges.contains_key(&EdgeKey::new(a, b))
    }

    /// Display attributes of the edge between `a` and `b`, in either order.
    pub fn edge(&self, a: &str, b: &str) -> Option<&EdgeAttributes> {
        self.edges.get(&EdgeKey::new(a, b)).map(|e| &e.attributes)
    }

    /// Every co-occurrence recorded for the pair, in processing order.
    pub fn provenance(&self, a: &str, b: &str) -> &[Provenance] {
        self.provenance
            .get(&EdgeKey::new(a, b))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Texts of the chunks behind an edge, one per distinct chunk.
    ///
    /// Occurrences whose chunk is missing from `chunks` are skipped.
    pub fn edge_evidence<'c>(&self, a: &str, b: &str, chunks: &'c [EvidenceChunk]) -> Vec<&'c str> {
        let mut seen = HashSet::new();
        self.provenance(a, b)
            .iter()
            .filter(|p| seen.insert(p.chunk_index))
            .filter_map(|p| chunks.iter().find(|c| c.index == p.chunk_index))
            .map(|c| c.text.as_str())
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            provenance_count: self.provenance.values().map(Vec::len).sum(),
        }
    }

    /// Export nodes and one edge per unordered pair.
    pub fn to_graph_data(&self) -> GraphData {
        let nodes = self
            .node_order
            .iter()
            .map(|name| GraphNode {
                id: name.clone(),
                label: name.clone(),
                node_type: self.nodes[name].entity_type.clone(),
            })
            .collect();

        let edges = self
            .edges_in_order()
            .map(|edge| GraphEdge {
                source: edge.source.clone(),
                target: edge.target.clone(),
                label: edge.attributes.relation.clone(),
            })
            .collect();

        GraphData { nodes, edges }
    }

    /// Relationship view of the edges, with each edge's representative chunk.
    pub fn relationships(&self) -> Vec<Relationship> {
        self.edges_in_order()
            .map(|edge| Relationship {
                from_entity: edge.source.clone(),
                to_entity: edge.target.clone(),
                relation: edge.attributes.relation.clone(),
                chunk_index: edge.attributes.representative_chunk,
            })
            .collect()
    }

    fn edges_in_order(&self) -> impl Iterator<Item = &Edge> {
        self.edge_order.iter().map(|key| &self.edges[key])
    }
}
