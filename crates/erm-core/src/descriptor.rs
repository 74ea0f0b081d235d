//! Normalized entity and field descriptors.
//!
//! Descriptors are produced once per declared type by the
//! [`DescriptorBuilder`](crate::DescriptorBuilder) and never change afterwards,
//! so they only expose read accessors. They serialize for export but cannot
//! be deserialized: the builder is the only way to make one.

use crate::declaration::{RawEntity, RawField, RelationshipTag};
use serde::{Deserialize, Serialize};

/// Whether a field holds a single value or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    Single,
    Collection,
}

impl Cardinality {
    pub fn from_collection(is_collection: bool) -> Self {
        if is_collection {
            Self::Collection
        } else {
            Self::Single
        }
    }

    pub fn is_collection(self) -> bool {
        self == Self::Collection
    }
}

/// A normalized field of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    name: String,
    /// Declared type, or the element type for collections.
    target_type: String,
    tag: Option<RelationshipTag>,
    cardinality: Cardinality,
    explicit_join_key: bool,
    orphan_removal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    container: Option<String>,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    pub fn tag(&self) -> Option<RelationshipTag> {
        self.tag
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn is_collection(&self) -> bool {
        self.cardinality.is_collection()
    }

    pub fn has_explicit_join_key(&self) -> bool {
        self.explicit_join_key
    }

    pub fn orphan_removal(&self) -> bool {
        self.orphan_removal
    }

    /// Container type as declared in source, if known.
    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    /// True when the field carries no relationship annotation.
    pub fn is_attribute(&self) -> bool {
        self.tag.is_none()
    }

    /// Re-derives the raw record this descriptor was built from.
    pub fn to_raw(&self) -> RawField {
        RawField {
            name: self.name.clone(),
            declared_type: self.target_type.clone(),
            is_collection: self.is_collection(),
            relationship_tag: self.tag,
            has_explicit_join_key: self.explicit_join_key,
            orphan_removal: self.orphan_removal,
            container: self.container.clone(),
        }
    }
}

impl From<&RawField> for FieldDescriptor {
    fn from(raw: &RawField) -> Self {
        Self {
            name: raw.name.clone(),
            target_type: raw.declared_type.clone(),
            tag: raw.relationship_tag,
            cardinality: Cardinality::from_collection(raw.is_collection),
            explicit_join_key: raw.has_explicit_join_key,
            orphan_removal: raw.orphan_removal,
            container: raw.container.clone(),
        }
    }
}

/// A declared type and its ordered fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityDescriptor {
    id: String,
    fields: Vec<FieldDescriptor>,
}

impl EntityDescriptor {
    pub(crate) fn new(id: String, fields: Vec<FieldDescriptor>) -> Self {
        Self { id, fields }
    }

    /// The entity identifier (its type name).
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields that carry a relationship annotation, in declaration order.
    pub fn relationship_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.is_attribute())
    }

    pub fn to_raw(&self) -> RawEntity {
        RawEntity::new(
            self.id.clone(),
            self.fields.iter().map(FieldDescriptor::to_raw).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_descriptor_from_raw() {
        let raw = RawField::relation("cars", "Car", RelationshipTag::OneToMany).collection();
        let field = FieldDescriptor::from(&raw);

        assert_eq!(field.name(), "cars");
        assert_eq!(field.target_type(), "Car");
        assert_eq!(field.cardinality(), Cardinality::Collection);
        assert!(!field.is_attribute());
        assert_eq!(field.to_raw(), raw);
    }

    #[test]
    fn test_relationship_fields_skip_attributes() {
        let entity = EntityDescriptor::new(
            "Engine".to_string(),
            vec![
                FieldDescriptor::from(&RawField::attribute("power", "String")),
                FieldDescriptor::from(&RawField::relation(
                    "car",
                    "Car",
                    RelationshipTag::OneToOne,
                )),
            ],
        );

        let names: Vec<_> = entity.relationship_fields().map(|f| f.name()).collect();
        assert_eq!(names, vec!["car"]);
        assert!(entity.field("power").is_some());
        assert!(entity.field("fuel").is_none());
    }
}
