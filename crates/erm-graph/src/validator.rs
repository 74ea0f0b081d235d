//! Consistency validation for assembled graphs.
//!
//! The validator always sweeps the whole graph and reports every finding,
//! so callers can assert on the exact set of violations.

use crate::edge::RelationshipKind;
use crate::graph::EntityGraph;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of inconsistency was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Several fields on the target entity could mirror an edge.
    AmbiguousInverse,
    /// An edge points at (or comes from) an entity that was never declared.
    DanglingReference,
    /// A paired inverse has an incompatible kind.
    InverseKindMismatch,
    /// Orphan removal on a many-to-one or many-to-many edge.
    InvalidOrphanRemoval,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AmbiguousInverse => "ambiguous_inverse",
            Self::DanglingReference => "dangling_reference",
            Self::InverseKindMismatch => "inverse_kind_mismatch",
            Self::InvalidOrphanRemoval => "invalid_orphan_removal",
        };
        write!(f, "{}", s)
    }
}

/// An `Entity.field` location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldRef {
    pub entity: String,
    pub field: String,
}

impl FieldRef {
    pub fn new(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity, self.field)
    }
}

/// A consistency violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Offending fields. The first entry is the field that triggered the check.
    pub sites: Vec<FieldRef>,
    /// Human-readable message describing the violation.
    pub detail: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, sites: Vec<FieldRef>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            sites,
            detail: detail.into(),
        }
    }

    /// Entity ids involved, in site order without repeats.
    pub fn entities(&self) -> Vec<&str> {
        let mut entities: Vec<&str> = Vec::new();
        for site in &self.sites {
            if !entities.contains(&site.entity.as_str()) {
                entities.push(&site.entity);
            }
        }
        entities
    }

    pub fn involves(&self, entity: &str, field: &str) -> bool {
        self.sites
            .iter()
            .any(|s| s.entity == entity && s.field == field)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.detail)
    }
}

/// Checks every edge of the graph against the relationship invariants.
///
/// Descriptors only come out of the builder, which rejects duplicate field
/// names, so they are not re-checked here. Duplicate entity ids are caught
/// by the assembler.
pub fn check(graph: &EntityGraph) -> Vec<Violation> {
    let mut violations = Vec::new();

    for edge in graph.edges() {
        let site = FieldRef::new(&edge.source, &edge.field);

        for endpoint in [&edge.source, &edge.target] {
            if !graph.contains_entity(endpoint) {
                violations.push(Violation::new(
                    ViolationKind::DanglingReference,
                    vec![site.clone()],
                    format!("{} references undeclared entity `{}`", site, endpoint),
                ));
            }
        }

        if let Some(inverse) = graph.inverse_of(edge) {
            // Report each pair once, from its lower edge id
            if edge.id < inverse.id && !kinds_mirror(edge.kind, inverse.kind) {
                violations.push(Violation::new(
                    ViolationKind::InverseKindMismatch,
                    vec![site.clone(), FieldRef::new(&inverse.source, &inverse.field)],
                    format!(
                        "{} is {} but its inverse {} is {} (expected {})",
                        site,
                        edge.kind,
                        inverse.site(),
                        inverse.kind,
                        edge.kind.mirrored()
                    ),
                ));
            }
        }

        if edge.orphan_removal && !edge.kind.allows_orphan_removal() {
            violations.push(Violation::new(
                ViolationKind::InvalidOrphanRemoval,
                vec![site.clone()],
                format!("{} sets orphan removal on a {} relationship", site, edge.kind),
            ));
        }
    }

    violations
}

fn kinds_mirror(a: RelationshipKind, b: RelationshipKind) -> bool {
    a.mirrored() == b
}
