//! Error types for building entity descriptors and loading declarations.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Malformed input that aborts an analysis run.
///
/// These are raised before any graph exists: the assembler cannot reason
/// about declarations that are ambiguous or internally inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErmError {
    /// The same type name was declared twice with different field sets.
    #[error("entity `{entity}` is declared more than once with different fields")]
    DuplicateEntity { entity: String },

    /// A declared type has no fields at all.
    #[error("entity `{entity}` declares no fields")]
    EmptyEntity { entity: String },

    /// A single entity declares two fields with the same name.
    #[error("entity `{entity}` declares field `{field}` more than once")]
    DuplicateFieldName { entity: String, field: String },

    /// A relationship tag disagrees with the collection-ness of its field.
    #[error("field `{entity}.{field}` is tagged {tag} but isCollection={is_collection}")]
    CardinalityMismatch {
        entity: String,
        field: String,
        tag: String,
        is_collection: bool,
    },
}

/// Errors raised while reading declarations from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid declaration document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to walk {path}: {message}")]
    Walk { path: PathBuf, message: String },

    #[error("parser error: {0}")]
    Parser(String),

    #[error("unsupported input: {0} (expected a .json document, a .java file or a directory)")]
    UnsupportedInput(PathBuf),
}

impl LoadError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ErmError>;
