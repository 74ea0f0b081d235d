//! Read-only queries over a validated graph.
//!
//! Every query first checks that the graph passed validation with zero
//! violations. Failures are per call and never touch graph state.

use crate::edge::RelationshipKind;
use crate::graph::EntityGraph;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The graph has not been validated, or validation found violations.
    #[error("graph is not ready for queries ({violations} violation(s) recorded)")]
    GraphNotReady { violations: usize },

    #[error("entity `{0}` not found")]
    EntityNotFound(String),

    #[error("field `{entity}.{field}` not found")]
    FieldNotFound { entity: String, field: String },
}

pub type QueryResult<T> = Result<T, QueryError>;

impl EntityGraph {
    fn ensure_ready(&self) -> QueryResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(QueryError::GraphNotReady {
                violations: self.violations().len(),
            })
        }
    }

    fn ensure_entity(&self, id: &str) -> QueryResult<()> {
        if self.contains_entity(id) {
            Ok(())
        } else {
            Err(QueryError::EntityNotFound(id.to_string()))
        }
    }

    /// Entities directly related to `entity` through the fields it declares,
    /// in field order and without repeats, optionally filtered by kind.
    pub fn neighbors(
        &self,
        entity: &str,
        kind: Option<RelationshipKind>,
    ) -> QueryResult<Vec<String>> {
        self.ensure_ready()?;
        self.ensure_entity(entity)?;

        let mut result: Vec<String> = Vec::new();
        for edge in self.edges_from(entity) {
            if kind.map_or(true, |k| k == edge.kind) && !result.contains(&edge.target) {
                result.push(edge.target.clone());
            }
        }
        Ok(result)
    }

    /// The recorded kind of `entity.field`. Plain attributes report
    /// [`RelationshipKind::PlainAttribute`].
    pub fn cardinality_of(&self, entity: &str, field: &str) -> QueryResult<RelationshipKind> {
        self.ensure_ready()?;
        self.ensure_entity(entity)?;

        self.field_kind(entity, field)
            .ok_or_else(|| QueryError::FieldNotFound {
                entity: entity.to_string(),
                field: field.to_string(),
            })
    }

    /// Shortest relationship path from `from` to `to`, at most `max_depth`
    /// hops, treating edges as undirected.
    ///
    /// Returns the entity ids along the path, both ends included, or an
    /// empty vector when no path exists within the bound. Ties between
    /// equally short paths go to the lexically smaller neighbor.
    pub fn path(&self, from: &str, to: &str, max_depth: usize) -> QueryResult<Vec<String>> {
        self.ensure_ready()?;
        self.ensure_entity(from)?;
        self.ensure_entity(to)?;

        let (Some(start), Some(goal)) = (self.node(from), self.node(to)) else {
            return Ok(Vec::new());
        };
        if start == goal {
            return Ok(vec![from.to_string()]);
        }

        let mut parent = HashMap::new();
        let mut queue = VecDeque::from([(start, 0usize)]);
        parent.insert(start, start);

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }

            let mut next: Vec<_> = self.graph.neighbors_undirected(current).collect();
            next.sort_by(|a, b| self.node_id(*a).cmp(&self.node_id(*b)));
            next.dedup();

            for neighbor in next {
                if parent.contains_key(&neighbor) {
                    continue;
                }
                parent.insert(neighbor, current);

                if neighbor == goal {
                    let mut path = vec![neighbor];
                    let mut step = current;
                    while step != start {
                        path.push(step);
                        step = parent[&step];
                    }
                    path.push(start);
                    path.reverse();

                    return Ok(path
                        .into_iter()
                        .filter_map(|idx| self.node_id(idx).map(str::to_string))
                        .collect());
                }
                queue.push_back((neighbor, depth + 1));
            }
        }

        Ok(Vec::new())
    }
}
