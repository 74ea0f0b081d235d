//! Declaration loading from disk.
//!
//! Accepts either a JSON declaration document or Java sources. Java
//! classes are parsed with tree-sitter, then inheritance is flattened:
//! superclass fields are embedded by value into every entity that extends
//! them, so descriptors never form a type hierarchy.

use crate::config::ErmConfig;
use crate::declaration::{Declarations, RawEntity, RawField};
use crate::error::LoadError;
use crate::languages::{DeclarationParser, JavaParser, ParsedClass};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Outcome of loading declarations from a path.
#[derive(Debug, Default)]
pub struct LoadResult {
    pub declarations: Declarations,
    pub files_scanned: usize,
    /// Files that could not be read or parsed, with the reason.
    pub errors: Vec<(String, String)>,
    pub duration_ms: u64,
}

/// Loads entity declarations from Java sources.
pub struct SourceLoader {
    parser: tree_sitter::Parser,
    java: JavaParser,
}

impl SourceLoader {
    pub fn new() -> Result<Self, LoadError> {
        let java = JavaParser;
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&java.language())
            .map_err(|e| LoadError::Parser(format!("Failed to set language: {}", e)))?;
        Ok(Self { parser, java })
    }

    /// Parses one source text into class declarations.
    pub fn parse_source(
        &mut self,
        source: &str,
        file_path: &str,
    ) -> Result<Vec<ParsedClass>, LoadError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| LoadError::Parser("Tree-sitter returned no tree".into()))?;

        if tree.root_node().has_error() {
            debug!(file = file_path, "syntax errors present, extracting what parsed");
        }

        Ok(self.java.extract_classes(&tree, source, file_path))
    }

    /// Parses one source file.
    pub fn parse_file(&mut self, path: &Path) -> Result<Vec<ParsedClass>, LoadError> {
        let source = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        self.parse_source(&source, &path.to_string_lossy())
    }

    fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.java.extensions().contains(&ext))
            .unwrap_or(false)
    }

    /// Walks `root` and loads every Java source, in sorted path order.
    ///
    /// Unreadable files and directories are recorded in
    /// [`LoadResult::errors`] and skipped.
    pub fn load_directory(
        &mut self,
        root: &Path,
        config: &ErmConfig,
    ) -> Result<LoadResult, LoadError> {
        let start = Instant::now();
        let mut files = Vec::new();
        let mut errors = Vec::new();

        let walker = WalkDir::new(root).sort_by_file_name().into_iter();
        for entry in walker.filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !config.is_ignored(&e.file_name().to_string_lossy())
        }) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                    let error = LoadError::Walk {
                        path: path.clone(),
                        message: e.to_string(),
                    };
                    errors.push((path.display().to_string(), error.to_string()));
                    continue;
                }
            };
            if entry.file_type().is_file() && self.handles(entry.path()) {
                files.push(entry.into_path());
            }
        }

        let mut classes = Vec::new();
        for file in &files {
            match self.parse_file(file) {
                Ok(parsed) => classes.extend(parsed),
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "skipping source file");
                    errors.push((file.display().to_string(), e.to_string()));
                }
            }
        }

        let declarations = flatten_classes(&classes);
        let result = LoadResult {
            declarations,
            files_scanned: files.len(),
            errors,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            files = result.files_scanned,
            entities = result.declarations.len(),
            "loaded java sources"
        );
        Ok(result)
    }
}

/// Loads declarations from a JSON document, a single Java file or a
/// directory of Java sources.
pub fn load_path(path: &Path, config: &ErmConfig) -> Result<LoadResult, LoadError> {
    if path.is_dir() {
        return SourceLoader::new()?.load_directory(path, config);
    }

    let start = Instant::now();
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let declarations = Declarations::load_json(path)?;
            Ok(LoadResult {
                declarations,
                files_scanned: 1,
                errors: Vec::new(),
                duration_ms: start.elapsed().as_millis() as u64,
            })
        }
        Some("java") => {
            let classes = SourceLoader::new()?.parse_file(path)?;
            Ok(LoadResult {
                declarations: flatten_classes(&classes),
                files_scanned: 1,
                errors: Vec::new(),
                duration_ms: start.elapsed().as_millis() as u64,
            })
        }
        _ => Err(LoadError::UnsupportedInput(PathBuf::from(path))),
    }
}

/// Turns parsed classes into entity declarations, embedding inherited
/// fields. Only `@Entity` classes become declarations.
pub fn flatten_classes(classes: &[ParsedClass]) -> Declarations {
    let mut by_name: HashMap<&str, &ParsedClass> = HashMap::new();
    for class in classes {
        by_name.entry(class.name.as_str()).or_insert(class);
    }

    let entities = classes
        .iter()
        .filter(|c| c.is_entity)
        .map(|class| {
            let mut fields = inherited_fields(class, &by_name);
            fields.extend(class.fields.iter().cloned());
            RawEntity::new(class.name.clone(), fields).with_origin(class.file.clone())
        })
        .collect();

    Declarations::new(entities)
}

/// Fields of every known ancestor, root-most ancestor first.
fn inherited_fields(class: &ParsedClass, by_name: &HashMap<&str, &ParsedClass>) -> Vec<RawField> {
    let mut chain = Vec::new();
    let mut seen = HashSet::from([class.name.as_str()]);
    let mut current = class.superclass.as_deref();

    while let Some(name) = current {
        if !seen.insert(name) {
            warn!(class = %class.name, ancestor = name, "inheritance cycle");
            break;
        }
        let Some(parent) = by_name.get(name) else {
            break;
        };
        chain.push(*parent);
        current = parent.superclass.as_deref();
    }

    chain
        .iter()
        .rev()
        .flat_map(|parent| parent.fields.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::RelationshipTag;
    use std::fs;
    use tempfile::tempdir;

    const PERSON: &str = r#"
public abstract class Person {
    protected String name;
}
"#;

    const DRIVER: &str = r#"
@Entity
public class Driver extends Person {
    @ManyToMany
    private List<Car> cars;
}
"#;

    const CAR: &str = r#"
@Entity
public class Car {
    @Column
    private String name;
    @ManyToMany
    private List<Driver> drivers;
}
"#;

    #[test]
    fn test_inherited_fields_are_embedded() {
        let mut loader = SourceLoader::new().unwrap();
        let mut classes = loader.parse_source(PERSON, "Person.java").unwrap();
        classes.extend(loader.parse_source(DRIVER, "Driver.java").unwrap());

        let decls = flatten_classes(&classes);
        assert_eq!(decls.len(), 1);

        let driver = &decls.entities[0];
        assert_eq!(driver.name, "Driver");
        assert_eq!(
            driver.fields,
            vec![
                RawField::attribute("name", "String"),
                RawField::relation("cars", "Car", RelationshipTag::ManyToMany).in_container("List"),
            ]
        );
        assert_eq!(driver.origin.as_deref(), Some("Driver.java"));
    }

    #[test]
    fn test_inheritance_cycle_terminates() {
        let classes = vec![
            ParsedClass {
                name: "A".to_string(),
                superclass: Some("B".to_string()),
                is_entity: true,
                fields: vec![RawField::attribute("a", "String")],
                file: "A.java".to_string(),
            },
            ParsedClass {
                name: "B".to_string(),
                superclass: Some("A".to_string()),
                is_entity: false,
                fields: vec![RawField::attribute("b", "String")],
                file: "B.java".to_string(),
            },
        ];

        let decls = flatten_classes(&classes);
        let names: Vec<_> = decls.entities[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_load_directory_skips_ignored() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let target = dir.path().join("target");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&target).unwrap();

        fs::write(src.join("Car.java"), CAR).unwrap();
        fs::write(src.join("Driver.java"), DRIVER).unwrap();
        fs::write(src.join("Person.java"), PERSON).unwrap();
        fs::write(src.join("README.md"), "not java").unwrap();
        fs::write(target.join("Stale.java"), "@Entity class Stale { String x; }").unwrap();

        let result = load_path(dir.path(), &ErmConfig::default()).unwrap();
        assert_eq!(result.files_scanned, 3);
        assert!(result.errors.is_empty());

        let names: Vec<_> = result
            .declarations
            .entities
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["Car", "Driver"]);
    }

    #[test]
    fn test_load_json_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("decls.json");
        fs::write(
            &path,
            r#"{ "entities": [{ "name": "Seat", "fields": [{ "name": "name", "declaredType": "String" }] }] }"#,
        )
        .unwrap();

        let result = load_path(&path, &ErmConfig::default()).unwrap();
        assert_eq!(result.declarations.len(), 1);
        assert_eq!(result.declarations.entities[0].name, "Seat");
    }

    #[test]
    fn test_load_single_java_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Driver.java");
        fs::write(&path, DRIVER).unwrap();

        let result = load_path(&path, &ErmConfig::default()).unwrap();
        assert_eq!(result.files_scanned, 1);
        assert_eq!(result.declarations.len(), 1);

        let driver = &result.declarations.entities[0];
        assert_eq!(driver.name, "Driver");
        assert_eq!(driver.fields.len(), 1);
        assert_eq!(driver.origin.as_deref(), Some(path.to_string_lossy().as_ref()));
    }

    #[test]
    fn test_walk_errors_are_recorded() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");

        let mut loader = SourceLoader::new().unwrap();
        let result = loader
            .load_directory(&missing, &ErmConfig::default())
            .unwrap();

        assert_eq!(result.files_scanned, 0);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].0.ends_with("missing"));
        assert!(result.declarations.is_empty());
    }

    #[test]
    fn test_unsupported_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "hello").unwrap();

        let err = load_path(&path, &ErmConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedInput(_)));
    }
}
