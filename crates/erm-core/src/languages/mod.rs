//! Source languages that can supply entity declarations.

mod java;

pub use java::JavaParser;

use crate::declaration::RawField;
use tree_sitter::{Language, Tree};

/// A class-like declaration as it appears in one source file, before
/// inheritance is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedClass {
    pub name: String,
    /// Simple name of the direct superclass, if any.
    pub superclass: Option<String>,
    /// Whether the class is annotated as a persistent entity.
    pub is_entity: bool,
    /// Declared fields, in source order.
    pub fields: Vec<RawField>,
    pub file: String,
}

/// Extracts class declarations from a parsed syntax tree.
pub trait DeclarationParser {
    /// The tree-sitter grammar for this language.
    fn language(&self) -> Language;

    /// File extensions handled by this parser.
    fn extensions(&self) -> &[&str];

    /// Collects every class declared in the tree.
    fn extract_classes(&self, tree: &Tree, source: &str, file_path: &str) -> Vec<ParsedClass>;
}
