//! Erm Core - Entity declarations and descriptors
//!
//! This crate holds everything that happens before a relationship graph
//! exists: the raw declaration contract, the normalized descriptors, and the
//! loaders that read declarations from JSON documents or JPA-annotated Java
//! sources.
//!
//! # Example
//!
//! ```
//! use erm_core::{build_descriptors, Declarations, RawEntity, RawField, RelationshipTag};
//!
//! let decls = Declarations::new(vec![RawEntity::new(
//!     "Seat",
//!     vec![
//!         RawField::attribute("name", "String"),
//!         RawField::relation("car", "Car", RelationshipTag::ManyToOne),
//!     ],
//! )]);
//!
//! let descriptors = build_descriptors(&decls).unwrap();
//! assert_eq!(descriptors[0].id(), "Seat");
//! ```

mod builder;
pub mod config;
mod declaration;
mod descriptor;
pub mod error;
pub mod languages;
mod loader;

pub use builder::{build_descriptors, DescriptorBuilder};
pub use config::ErmConfig;
pub use declaration::{Declarations, RawEntity, RawField, RelationshipTag};
pub use descriptor::{Cardinality, EntityDescriptor, FieldDescriptor};
pub use error::{ErmError, LoadError};
pub use loader::{flatten_classes, load_path, LoadResult, SourceLoader};
