//! The input contract: raw entity declarations as supplied by a loader.
//!
//! Declarations are kept as an ordered list rather than a map keyed by type
//! name. Two declarations sharing a name must reach the builder intact so it
//! can reject them; a map would silently keep the last one.

use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The relationship annotation attached to a field, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipTag {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationshipTag {
    /// Parses an annotation name, accepting qualified forms such as
    /// `javax.persistence.OneToMany`.
    pub fn from_annotation(name: &str) -> Option<Self> {
        match name.rsplit('.').next().unwrap_or(name) {
            "OneToOne" => Some(Self::OneToOne),
            "OneToMany" => Some(Self::OneToMany),
            "ManyToOne" => Some(Self::ManyToOne),
            "ManyToMany" => Some(Self::ManyToMany),
            _ => None,
        }
    }

    /// Whether a field carrying this tag must be collection-valued.
    pub fn expects_collection(self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneToOne => "OneToOne",
            Self::OneToMany => "OneToMany",
            Self::ManyToOne => "ManyToOne",
            Self::ManyToMany => "ManyToMany",
        }
    }
}

impl std::fmt::Display for RelationshipTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One declared field, before normalization.
///
/// For collection-valued fields `declared_type` holds the element type
/// (`Car` for `List<Car>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawField {
    pub name: String,
    pub declared_type: String,
    #[serde(default)]
    pub is_collection: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_tag: Option<RelationshipTag>,
    #[serde(default)]
    pub has_explicit_join_key: bool,
    #[serde(default)]
    pub orphan_removal: bool,
    /// Container type as written in source (`Set`, or `[]` for arrays).
    /// Only used for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

impl RawField {
    /// A plain attribute with no relationship annotation.
    pub fn attribute(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            is_collection: false,
            relationship_tag: None,
            has_explicit_join_key: false,
            orphan_removal: false,
            container: None,
        }
    }

    /// A single-valued field tagged with a relationship annotation.
    pub fn relation(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        tag: RelationshipTag,
    ) -> Self {
        Self {
            relationship_tag: Some(tag),
            ..Self::attribute(name, declared_type)
        }
    }

    /// Marks the field as collection-valued.
    pub fn collection(mut self) -> Self {
        self.is_collection = true;
        self
    }

    /// Marks the field as a collection held in the named container type.
    pub fn in_container(mut self, container: impl Into<String>) -> Self {
        self.is_collection = true;
        self.container = Some(container.into());
        self
    }

    pub fn with_join_key(mut self) -> Self {
        self.has_explicit_join_key = true;
        self
    }

    pub fn with_orphan_removal(mut self) -> Self {
        self.orphan_removal = true;
        self
    }
}

/// A declared type and its ordered fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntity {
    pub name: String,
    pub fields: Vec<RawField>,
    /// Where the declaration came from, for diagnostics only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl RawEntity {
    pub fn new(name: impl Into<String>, fields: Vec<RawField>) -> Self {
        Self {
            name: name.into(),
            fields,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Two declarations have the same shape when their ordered fields match.
    /// The origin is ignored.
    pub fn same_shape(&self, other: &RawEntity) -> bool {
        self.name == other.name && self.fields == other.fields
    }
}

/// A complete declaration set, the only input the builder consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declarations {
    pub entities: Vec<RawEntity>,
}

impl Declarations {
    pub fn new(entities: Vec<RawEntity>) -> Self {
        Self { entities }
    }

    /// Parses a JSON declaration document.
    pub fn from_json(source: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Reads and parses a JSON declaration document from disk.
    pub fn load_json(path: &Path) -> Result<Self, LoadError> {
        let source = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        Self::from_json(&source)
    }

    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl From<Vec<RawEntity>> for Declarations {
    fn from(entities: Vec<RawEntity>) -> Self {
        Self::new(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_from_qualified_annotation() {
        assert_eq!(
            RelationshipTag::from_annotation("javax.persistence.OneToMany"),
            Some(RelationshipTag::OneToMany)
        );
        assert_eq!(
            RelationshipTag::from_annotation("ManyToOne"),
            Some(RelationshipTag::ManyToOne)
        );
        assert_eq!(RelationshipTag::from_annotation("Column"), None);
    }

    #[test]
    fn test_json_document_defaults() {
        let doc = r#"{
            "entities": [
                {
                    "name": "Owner",
                    "fields": [
                        { "name": "cars", "declaredType": "Car", "isCollection": true, "relationshipTag": "OneToMany" },
                        { "name": "name", "declaredType": "String" }
                    ]
                }
            ]
        }"#;

        let decls = Declarations::from_json(doc).unwrap();
        assert_eq!(decls.len(), 1);

        let owner = &decls.entities[0];
        assert_eq!(
            owner.fields[0],
            RawField::relation("cars", "Car", RelationshipTag::OneToMany).collection()
        );
        assert_eq!(owner.fields[1], RawField::attribute("name", "String"));
        assert!(owner.origin.is_none());
    }

    #[test]
    fn test_duplicate_names_survive_parsing() {
        let doc = r#"{
            "entities": [
                { "name": "Car", "fields": [{ "name": "name", "declaredType": "String" }] },
                { "name": "Car", "fields": [{ "name": "type", "declaredType": "Type" }] }
            ]
        }"#;

        let decls = Declarations::from_json(doc).unwrap();
        assert_eq!(decls.len(), 2);
    }

    #[test]
    fn test_same_shape_ignores_origin() {
        let a = RawEntity::new("Seat", vec![RawField::attribute("name", "String")])
            .with_origin("a/Seat.java");
        let b = RawEntity::new("Seat", vec![RawField::attribute("name", "String")])
            .with_origin("b/Seat.java");
        assert!(a.same_shape(&b));
    }
}
