//! Relationship classification.
//!
//! A pure function over a field descriptor: the relationship tag decides the
//! kind, and the field's collection-ness must agree with it.

use crate::edge::RelationshipKind;
use erm_core::{ErmError, FieldDescriptor, RelationshipTag};

/// The kind assigned to a field and the entity it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: RelationshipKind,
    /// Declared type, or element type for collections.
    pub target: String,
}

/// Classifies one field of `entity`.
///
/// Fails with [`ErmError::CardinalityMismatch`] when a to-many tag sits on a
/// single value or a to-one tag sits on a collection.
pub fn classify(entity: &str, field: &FieldDescriptor) -> Result<Classification, ErmError> {
    let Some(tag) = field.tag() else {
        return Ok(Classification {
            kind: RelationshipKind::PlainAttribute,
            target: field.target_type().to_string(),
        });
    };

    if tag.expects_collection() != field.is_collection() {
        return Err(ErmError::CardinalityMismatch {
            entity: entity.to_string(),
            field: field.name().to_string(),
            tag: tag.to_string(),
            is_collection: field.is_collection(),
        });
    }

    let kind = match tag {
        RelationshipTag::OneToOne => RelationshipKind::OneToOne,
        RelationshipTag::OneToMany => RelationshipKind::OneToMany,
        RelationshipTag::ManyToOne => RelationshipKind::ManyToOne,
        RelationshipTag::ManyToMany => RelationshipKind::ManyToMany,
    };

    Ok(Classification {
        kind,
        target: field.target_type().to_string(),
    })
}
