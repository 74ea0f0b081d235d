//! Graph assembler for constructing the entity graph from descriptors.
//!
//! The assembler takes EntityDescriptors, classifies their fields and links
//! the relationship fields into edges.

use crate::classifier::classify;
use crate::edge::{EdgeId, RelationshipEdge, RelationshipKind};
use crate::graph::EntityGraph;
use crate::validator::{FieldRef, Violation, ViolationKind};
use erm_core::{EntityDescriptor, ErmError};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Builds an EntityGraph from entity descriptors.
///
/// Assembly is a two-pass process:
/// 1. Add one edge per relationship field
/// 2. Pair each edge with its inverse on the target entity
///
/// Pairing fails closed. When the target entity declares several fields
/// pointing back, none of them is picked: an ambiguity is recorded for
/// validation and the edge stays unpaired.
#[derive(Debug, Default)]
pub struct GraphAssembler {
    edges: Vec<RelationshipEdge>,
    /// (source, target, field) triples already present.
    seen: HashSet<(String, String, String)>,
}

impl GraphAssembler {
    /// Creates a new assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies every field and assembles the graph.
    ///
    /// Classification errors abort assembly; ambiguous inverses do not.
    ///
    /// Descriptors may come from several builder runs. An id repeated with
    /// different fields fails with [`ErmError::DuplicateEntity`]; identical
    /// repeats collapse into the first occurrence.
    pub fn assemble(mut self, entities: Vec<EntityDescriptor>) -> Result<EntityGraph, ErmError> {
        let entities = unique_entities(entities)?;
        let mut field_kinds = Vec::with_capacity(entities.len());

        for entity in &entities {
            let mut kinds = Vec::with_capacity(entity.fields().len());
            for field in entity.fields() {
                let classification = classify(entity.id(), field)?;
                if classification.kind.is_relationship() {
                    self.add_edge(
                        entity.id(),
                        &classification.target,
                        field.name(),
                        classification.kind,
                        field.orphan_removal(),
                        field.has_explicit_join_key(),
                    );
                }
                kinds.push(classification.kind);
            }
            field_kinds.push(kinds);
        }

        let ambiguities = self.resolve_inverses();
        self.assign_owning_sides();

        debug!(
            entities = entities.len(),
            edges = self.edges.len(),
            ambiguities = ambiguities.len(),
            "assembled entity graph"
        );

        Ok(EntityGraph::new(
            entities,
            field_kinds,
            self.edges,
            ambiguities,
        ))
    }

    fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        field: &str,
        kind: RelationshipKind,
        orphan_removal: bool,
        explicit_join_key: bool,
    ) {
        let triple = (source.to_string(), target.to_string(), field.to_string());
        if !self.seen.insert(triple) {
            return;
        }

        let id = self.edges.len();
        self.edges.push(RelationshipEdge {
            id,
            source: source.to_string(),
            target: target.to_string(),
            field: field.to_string(),
            kind,
            owning: false,
            inverse: None,
            orphan_removal,
            explicit_join_key,
        });
    }

    /// Second pass: pairs edges whose endpoints mirror each other.
    ///
    /// An edge A.f -> B has as candidates every other edge declared on B
    /// that targets A. Two edges are paired only when each is the other's
    /// sole candidate, so inverse references are always mutual.
    fn resolve_inverses(&mut self) -> Vec<Violation> {
        let mut by_endpoints: HashMap<(&str, &str), Vec<EdgeId>> = HashMap::new();
        for edge in &self.edges {
            by_endpoints
                .entry((edge.source.as_str(), edge.target.as_str()))
                .or_default()
                .push(edge.id);
        }

        let candidates: Vec<Vec<EdgeId>> = self
            .edges
            .iter()
            .map(|edge| {
                by_endpoints
                    .get(&(edge.target.as_str(), edge.source.as_str()))
                    .map(|ids| ids.iter().copied().filter(|&id| id != edge.id).collect())
                    .unwrap_or_default()
            })
            .collect();

        let mut ambiguities = Vec::new();
        let mut pairs = Vec::new();

        for edge in &self.edges {
            match candidates[edge.id].as_slice() {
                [] => {}
                [other] => {
                    if candidates[*other].as_slice() == [edge.id] && edge.id < *other {
                        pairs.push((edge.id, *other));
                    }
                }
                many => {
                    let mut sites = vec![FieldRef::new(&edge.source, &edge.field)];
                    sites.extend(
                        many.iter()
                            .map(|&id| FieldRef::new(&self.edges[id].source, &self.edges[id].field)),
                    );
                    let names: Vec<String> = sites[1..].iter().map(|s| s.to_string()).collect();
                    ambiguities.push(Violation::new(
                        ViolationKind::AmbiguousInverse,
                        sites,
                        format!(
                            "{} has {} candidate inverse fields: {}",
                            edge.site(),
                            many.len(),
                            names.join(", ")
                        ),
                    ));
                }
            }
        }

        for (a, b) in pairs {
            self.edges[a].inverse = Some(b);
            self.edges[b].inverse = Some(a);
        }

        ambiguities
    }

    /// Records which end of each relationship holds the join specification.
    fn assign_owning_sides(&mut self) {
        for id in 0..self.edges.len() {
            let owning = match self.edges[id].inverse {
                None => true,
                Some(other) => owner_of(&self.edges[id], &self.edges[other]) == id,
            };
            self.edges[id].owning = owning;
        }
    }
}

/// Drops identical repeats and rejects conflicting ones, keeping first
/// occurrence order.
fn unique_entities(entities: Vec<EntityDescriptor>) -> Result<Vec<EntityDescriptor>, ErmError> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<EntityDescriptor> = Vec::with_capacity(entities.len());

    for entity in entities {
        match positions.get(entity.id()) {
            Some(&position) if unique[position] == entity => {
                debug!(entity = entity.id(), "identical descriptor collapsed");
            }
            Some(_) => {
                return Err(ErmError::DuplicateEntity {
                    entity: entity.id().to_string(),
                });
            }
            None => {
                positions.insert(entity.id().to_string(), unique.len());
                unique.push(entity);
            }
        }
    }
    Ok(unique)
}

/// Picks the owning end of a bidirectional pair.
///
/// The many-to-one end owns a one-to-many pair. Otherwise an explicit join
/// key wins, and a tie goes to the lexically smaller `Entity.field`.
fn owner_of(a: &RelationshipEdge, b: &RelationshipEdge) -> EdgeId {
    match (a.kind, b.kind) {
        (RelationshipKind::ManyToOne, RelationshipKind::OneToMany) => return a.id,
        (RelationshipKind::OneToMany, RelationshipKind::ManyToOne) => return b.id,
        _ => {}
    }

    match (a.explicit_join_key, b.explicit_join_key) {
        (true, false) => a.id,
        (false, true) => b.id,
        _ => {
            if (&a.source, &a.field) <= (&b.source, &b.field) {
                a.id
            } else {
                b.id
            }
        }
    }
}
