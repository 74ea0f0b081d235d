//! Edge types for the entity graph.
//!
//! Edges represent relationships declared by entity fields. Plain
//! attributes are classified too but never become edges.

use serde::{Deserialize, Serialize};

/// Index of an edge in the graph's edge arena.
pub type EdgeId = usize;

/// The kind of a classified field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
    /// No relationship annotation. Excluded from the graph.
    PlainAttribute,
}

impl RelationshipKind {
    pub fn is_relationship(self) -> bool {
        self != Self::PlainAttribute
    }

    /// The kind an inverse field must have to mirror this one.
    pub fn mirrored(self) -> Self {
        match self {
            Self::OneToMany => Self::ManyToOne,
            Self::ManyToOne => Self::OneToMany,
            other => other,
        }
    }

    /// Whether orphan removal is meaningful on this kind.
    pub fn allows_orphan_removal(self) -> bool {
        matches!(self, Self::OneToOne | Self::OneToMany)
    }

    /// Multiplicities at the (source, target) ends.
    pub fn multiplicity(self) -> (&'static str, &'static str) {
        match self {
            Self::OneToOne => ("1", "1"),
            Self::OneToMany => ("1", "*"),
            Self::ManyToOne => ("*", "1"),
            Self::ManyToMany => ("*", "*"),
            Self::PlainAttribute => ("", ""),
        }
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OneToOne => "one_to_one",
            Self::OneToMany => "one_to_many",
            Self::ManyToOne => "many_to_one",
            Self::ManyToMany => "many_to_many",
            Self::PlainAttribute => "plain_attribute",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for RelationshipKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "one_to_one" | "onetoone" => Ok(Self::OneToOne),
            "one_to_many" | "onetomany" => Ok(Self::OneToMany),
            "many_to_one" | "manytoone" => Ok(Self::ManyToOne),
            "many_to_many" | "manytomany" => Ok(Self::ManyToMany),
            "plain_attribute" | "plain" | "attribute" => Ok(Self::PlainAttribute),
            other => Err(format!("unknown relationship kind: {}", other)),
        }
    }
}

/// A relationship declared by one field of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEdge {
    pub id: EdgeId,
    pub source: String,
    pub target: String,
    /// The declaring field on the source entity.
    pub field: String,
    pub kind: RelationshipKind,
    /// Whether this end holds the join specification.
    pub owning: bool,
    /// The mirroring edge on the target entity, when one was paired.
    pub inverse: Option<EdgeId>,
    pub orphan_removal: bool,
    pub explicit_join_key: bool,
}

impl RelationshipEdge {
    pub fn is_bidirectional(&self) -> bool {
        self.inverse.is_some()
    }

    /// `Entity.field` label used in diagnostics.
    pub fn site(&self) -> String {
        format!("{}.{}", self.source, self.field)
    }
}
