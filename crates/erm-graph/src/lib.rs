//! Erm Graph - Entity relationship graph
//!
//! This crate turns entity descriptors into a validated relationship graph
//! and answers read-only queries over it.
//!
//! # Architecture
//!
//! An analysis run goes through four stages:
//! - Classification: each field gets a relationship kind
//! - Assembly: relationship fields become edges, inverses are paired
//! - Validation: a full sweep collects every consistency violation
//! - Queries: neighbors, field kinds and paths, once the graph is ready
//!
//! # Example
//!
//! ```
//! use erm_core::{Declarations, RawEntity, RawField, RelationshipTag};
//! use erm_graph::analyze;
//!
//! let decls = Declarations::new(vec![
//!     RawEntity::new(
//!         "Owner",
//!         vec![RawField::relation("cars", "Car", RelationshipTag::OneToMany).collection()],
//!     ),
//!     RawEntity::new(
//!         "Car",
//!         vec![RawField::relation("owner", "Owner", RelationshipTag::ManyToOne)],
//!     ),
//! ]);
//!
//! let analysis = analyze(&decls).unwrap();
//! assert!(analysis.violations.is_empty());
//! assert_eq!(analysis.graph.neighbors("Car", None).unwrap(), vec!["Owner"]);
//! ```

mod assembler;
mod classifier;
mod edge;
mod graph;
mod query;
mod render;
mod validator;

pub use assembler::GraphAssembler;
pub use classifier::{classify, Classification};
pub use edge::{EdgeId, RelationshipEdge, RelationshipKind};
pub use graph::{EntityGraph, GraphStats, GraphStatus};
pub use query::{QueryError, QueryResult};
pub use render::{export_graph, export_json, render_plantuml, DiagramOptions, GraphExport};
pub use validator::{check, FieldRef, Violation, ViolationKind};

use erm_core::{build_descriptors, Declarations, ErmError};
use tracing::debug;

/// The outcome of one analysis run.
#[derive(Debug)]
pub struct Analysis {
    pub graph: EntityGraph,
    /// Every violation found. Empty means the graph is ready for queries.
    pub violations: Vec<Violation>,
}

impl Analysis {
    pub fn is_ready(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Builds, assembles and validates a declaration set.
///
/// Malformed input (conflicting or empty entities, duplicate field names,
/// cardinality mismatches) aborts the run before a graph exists.
/// Consistency problems are returned as violations alongside the graph.
pub fn analyze(declarations: &Declarations) -> Result<Analysis, ErmError> {
    debug!(entities = declarations.len(), "starting analysis");

    let descriptors = build_descriptors(declarations)?;
    let mut graph = GraphAssembler::new().assemble(descriptors)?;
    let violations = graph.validate().to_vec();

    Ok(Analysis { graph, violations })
}
