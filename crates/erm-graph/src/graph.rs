//! Core graph data structure.
//!
//! The EntityGraph keeps entities and edges in flat arenas keyed by string
//! ids and edge indices, and mirrors the resolvable edges into a petgraph
//! graph for traversal. Relationships are id pairs, so the reference
//! cycles of bidirectional mappings (Car -> Engine -> Car) never become
//! ownership cycles.

use crate::edge::{EdgeId, RelationshipEdge, RelationshipKind};
use crate::validator::{self, Violation};
use erm_core::{Declarations, EntityDescriptor};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Where a graph is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphStatus {
    /// Assembled but not yet validated.
    Assembled,
    /// Validated with zero violations; queries are allowed.
    Ready,
    /// Validated with at least one violation.
    Invalid,
}

/// The entity relationship graph.
#[derive(Debug)]
pub struct EntityGraph {
    /// Entity descriptors in declaration order.
    entities: Vec<EntityDescriptor>,

    /// Kind of every field, aligned with each descriptor's fields.
    field_kinds: Vec<Vec<RelationshipKind>>,

    /// Maps entity ids to positions in `entities`.
    entity_index: HashMap<String, usize>,

    /// Every relationship edge, dangling ones included.
    edges: Vec<RelationshipEdge>,

    /// Traversal view over the edges whose both ends exist.
    pub(crate) graph: DiGraph<String, EdgeId>,

    /// Maps entity ids to traversal node indexes.
    node_index: HashMap<String, NodeIndex>,

    /// Findings raised while assembling (ambiguous inverses).
    assembly_violations: Vec<Violation>,

    violations: Vec<Violation>,
    status: GraphStatus,
}

impl EntityGraph {
    pub(crate) fn new(
        entities: Vec<EntityDescriptor>,
        field_kinds: Vec<Vec<RelationshipKind>>,
        edges: Vec<RelationshipEdge>,
        assembly_violations: Vec<Violation>,
    ) -> Self {
        let mut entity_index = HashMap::new();
        let mut node_index = HashMap::new();
        let mut graph = DiGraph::new();

        for (position, entity) in entities.iter().enumerate() {
            entity_index.insert(entity.id().to_string(), position);
            let index = graph.add_node(entity.id().to_string());
            node_index.insert(entity.id().to_string(), index);
        }

        for edge in &edges {
            if let (Some(&from), Some(&to)) =
                (node_index.get(&edge.source), node_index.get(&edge.target))
            {
                graph.add_edge(from, to, edge.id);
            }
        }

        Self {
            entities,
            field_kinds,
            entity_index,
            edges,
            graph,
            node_index,
            assembly_violations,
            violations: Vec::new(),
            status: GraphStatus::Assembled,
        }
    }

    /// Runs the consistency validator and records the outcome.
    ///
    /// The sweep happens once; later calls return the recorded violations.
    /// A graph with zero violations becomes [`GraphStatus::Ready`].
    pub fn validate(&mut self) -> &[Violation] {
        if self.status == GraphStatus::Assembled {
            let mut violations = self.assembly_violations.clone();
            violations.extend(validator::check(self));

            self.status = if violations.is_empty() {
                GraphStatus::Ready
            } else {
                GraphStatus::Invalid
            };
            info!(
                entities = self.entity_count(),
                edges = self.edge_count(),
                violations = violations.len(),
                "validated entity graph"
            );
            self.violations = violations;
        }
        &self.violations
    }

    pub fn status(&self) -> GraphStatus {
        self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == GraphStatus::Ready
    }

    /// Violations recorded by [`validate`](Self::validate).
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Gets an entity by id.
    pub fn entity(&self, id: &str) -> Option<&EntityDescriptor> {
        let position = self.entity_index.get(id)?;
        self.entities.get(*position)
    }

    pub fn contains_entity(&self, id: &str) -> bool {
        self.entity_index.contains_key(id)
    }

    /// Iterates over entities in declaration order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.entities.iter()
    }

    /// Kind recorded for `entity.field`, attributes included.
    pub fn field_kind(&self, entity: &str, field: &str) -> Option<RelationshipKind> {
        let position = *self.entity_index.get(entity)?;
        let descriptor = &self.entities[position];
        let field_position = descriptor.fields().iter().position(|f| f.name() == field)?;
        self.field_kinds[position].get(field_position).copied()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&RelationshipEdge> {
        self.edges.get(id)
    }

    /// Iterates over all edges in assembly order.
    pub fn edges(&self) -> impl Iterator<Item = &RelationshipEdge> {
        self.edges.iter()
    }

    /// Edges declared by an entity, in field order.
    pub fn edges_from<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a RelationshipEdge> {
        self.edges.iter().filter(move |e| e.source == entity)
    }

    /// The edge declared by `entity.field`, if the field is a relationship.
    pub fn edge_for_field(&self, entity: &str, field: &str) -> Option<&RelationshipEdge> {
        self.edges
            .iter()
            .find(|e| e.source == entity && e.field == field)
    }

    /// The paired inverse of an edge.
    pub fn inverse_of(&self, edge: &RelationshipEdge) -> Option<&RelationshipEdge> {
        edge.inverse.and_then(|id| self.edges.get(id))
    }

    pub(crate) fn node(&self, id: &str) -> Option<NodeIndex> {
        self.node_index.get(id).copied()
    }

    pub(crate) fn node_id(&self, index: NodeIndex) -> Option<&str> {
        self.graph.node_weight(index).map(String::as_str)
    }

    /// Returns the number of entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns the number of relationship edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Re-derives the declaration set from the descriptors.
    pub fn declarations(&self) -> Declarations {
        Declarations::new(self.entities.iter().map(EntityDescriptor::to_raw).collect())
    }
}

/// Graph statistics for summaries and exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub entity_count: usize,
    pub edge_count: usize,
    pub bidirectional_pairs: usize,
    pub attribute_count: usize,
}

impl EntityGraph {
    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            entity_count: self.entity_count(),
            edge_count: self.edge_count(),
            bidirectional_pairs: self.edges.iter().filter(|e| e.is_bidirectional()).count() / 2,
            attribute_count: self
                .field_kinds
                .iter()
                .flatten()
                .filter(|k| !k.is_relationship())
                .count(),
        }
    }
}
