//! Entity descriptor builder.
//!
//! Turns raw declarations into [`EntityDescriptor`]s. Every problem found
//! here aborts the run: the assembler cannot reason about ambiguous input.

use crate::declaration::{Declarations, RawEntity};
use crate::descriptor::{EntityDescriptor, FieldDescriptor};
use crate::error::{ErmError, Result};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Collects raw declarations and normalizes them into descriptors.
///
/// Declarations may arrive from several sources (one call per file, say).
/// Call [`add_entities`](Self::add_entities) for each batch, then
/// [`build`](Self::build) once everything is in.
#[derive(Debug, Default)]
pub struct DescriptorBuilder {
    pending: Vec<RawEntity>,
}

impl DescriptorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a batch of raw declarations.
    pub fn add_entities(&mut self, entities: impl IntoIterator<Item = RawEntity>) {
        self.pending.extend(entities);
    }

    /// Validates the queued declarations and produces descriptors in first
    /// declaration order.
    ///
    /// A type declared twice with the same fields collapses into one
    /// descriptor. A type declared twice with different fields fails with
    /// [`ErmError::DuplicateEntity`] and is never merged.
    pub fn build(self) -> Result<Vec<EntityDescriptor>> {
        let mut first_seen: HashMap<&str, &RawEntity> = HashMap::new();
        let mut ordered: Vec<&RawEntity> = Vec::new();

        for entity in &self.pending {
            match first_seen.get(entity.name.as_str()) {
                Some(previous) if previous.same_shape(entity) => {
                    debug!(entity = %entity.name, "identical re-declaration collapsed");
                }
                Some(_) => {
                    return Err(ErmError::DuplicateEntity {
                        entity: entity.name.clone(),
                    });
                }
                None => {
                    first_seen.insert(&entity.name, entity);
                    ordered.push(entity);
                }
            }
        }

        let descriptors = ordered
            .into_iter()
            .map(build_descriptor)
            .collect::<Result<Vec<_>>>()?;

        debug!(count = descriptors.len(), "built entity descriptors");
        Ok(descriptors)
    }
}

fn build_descriptor(entity: &RawEntity) -> Result<EntityDescriptor> {
    if entity.fields.is_empty() {
        return Err(ErmError::EmptyEntity {
            entity: entity.name.clone(),
        });
    }

    let mut names = HashSet::new();
    for field in &entity.fields {
        if !names.insert(field.name.as_str()) {
            return Err(ErmError::DuplicateFieldName {
                entity: entity.name.clone(),
                field: field.name.clone(),
            });
        }
    }

    let fields = entity.fields.iter().map(FieldDescriptor::from).collect();
    Ok(EntityDescriptor::new(entity.name.clone(), fields))
}

/// Builds descriptors for a complete declaration set.
pub fn build_descriptors(declarations: &Declarations) -> Result<Vec<EntityDescriptor>> {
    let mut builder = DescriptorBuilder::new();
    builder.add_entities(declarations.entities.iter().cloned());
    builder.build()
}
