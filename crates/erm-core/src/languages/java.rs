//! Java language parser implementation.
//!
//! Handles .java files and extracts classes with their JPA-annotated fields.
//! Methods, constructors and imports carry no mapping metadata and are
//! skipped.

use super::{DeclarationParser, ParsedClass};
use crate::declaration::{RawField, RelationshipTag};
use tree_sitter::{Language, Node, Tree};

/// Raw type names treated as collections. The element type is the last type
/// argument, which also covers map values.
const COLLECTION_TYPES: &[&str] = &[
    "Collection",
    "Iterable",
    "List",
    "ArrayList",
    "LinkedList",
    "Set",
    "HashSet",
    "LinkedHashSet",
    "SortedSet",
    "NavigableSet",
    "TreeSet",
    "Queue",
    "Deque",
    "Map",
    "HashMap",
    "LinkedHashMap",
    "SortedMap",
    "TreeMap",
];

/// Grammar node kinds of primitive element types.
const PRIMITIVE_TYPES: &[&str] = &["integral_type", "floating_point_type", "boolean_type"];

const JOIN_ANNOTATIONS: &[&str] = &["JoinColumn", "JoinColumns", "JoinTable"];

pub struct JavaParser;

impl DeclarationParser for JavaParser {
    fn language(&self) -> Language {
        tree_sitter_java::language()
    }

    fn extensions(&self) -> &[&str] {
        &["java"]
    }

    fn extract_classes(&self, tree: &Tree, source: &str, file_path: &str) -> Vec<ParsedClass> {
        let mut classes = Vec::new();
        let root = tree.root_node();

        extract_from_node(&root, source, file_path, &mut classes);

        classes
    }
}

/// Recursively extracts class declarations from the Java AST.
fn extract_from_node(node: &Node, source: &str, file_path: &str, classes: &mut Vec<ParsedClass>) {
    if node.kind() == "class_declaration" {
        if let Some(class) = extract_class(node, source, file_path) {
            classes.push(class);
        }
    }

    // Nested classes live inside class bodies, so keep descending
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            extract_from_node(&child, source, file_path, classes);
        }
    }
}

/// Extracts a class declaration and its fields.
fn extract_class(node: &Node, source: &str, file_path: &str) -> Option<ParsedClass> {
    let name_node = node.child_by_field_name("name")?;
    let name = get_text(&name_node, source);

    let annotations = collect_annotations(node, source);
    let is_entity = annotations.iter().any(|a| a.name == "Entity");

    let superclass = node.child_by_field_name("superclass").and_then(|sc| {
        (0..sc.named_child_count())
            .filter_map(|i| sc.named_child(i))
            .next()
            .map(|ty| simple_type_name(&get_text(&ty, source)))
    });

    let mut fields = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        for i in 0..body.named_child_count() {
            if let Some(child) = body.named_child(i) {
                if child.kind() == "field_declaration" {
                    extract_fields(&child, source, &mut fields);
                }
            }
        }
    }

    Some(ParsedClass {
        name,
        superclass,
        is_entity,
        fields,
        file: file_path.to_string(),
    })
}

/// Extracts every declarator of a field declaration.
fn extract_fields(node: &Node, source: &str, fields: &mut Vec<RawField>) {
    if has_modifier(node, "static") || has_modifier(node, "transient") {
        return;
    }

    let annotations = collect_annotations(node, source);
    if annotations.iter().any(|a| a.name == "Transient") {
        return;
    }

    let Some(type_node) = node.child_by_field_name("type") else {
        return;
    };
    let (declared_type, is_collection, container) = resolve_type(&type_node, source);

    let mut tag = None;
    let mut orphan_removal = false;
    let mut join_key = false;
    for annotation in &annotations {
        if let Some(t) = RelationshipTag::from_annotation(&annotation.name) {
            tag = Some(t);
            orphan_removal |= annotation.argument("orphanRemoval") == Some("true");
        }
        if JOIN_ANNOTATIONS.contains(&annotation.name.as_str()) {
            join_key = true;
        }
    }

    for i in 0..node.named_child_count() {
        if let Some(child) = node.named_child(i) {
            if child.kind() != "variable_declarator" {
                continue;
            }
            if let Some(name_node) = child.child_by_field_name("name") {
                fields.push(RawField {
                    name: get_text(&name_node, source),
                    declared_type: declared_type.clone(),
                    is_collection,
                    relationship_tag: tag,
                    has_explicit_join_key: join_key,
                    orphan_removal,
                    container: container.clone(),
                });
            }
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// An annotation with its simple name and `key = value` arguments.
#[derive(Debug)]
struct Annotation {
    name: String,
    arguments: Vec<(String, String)>,
}

impl Annotation {
    fn argument(&self, key: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Gets text content of a node.
fn get_text(node: &Node, source: &str) -> String {
    source[node.byte_range()].to_string()
}

/// Finds the `modifiers` child of a declaration.
fn modifiers<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    (0..node.child_count())
        .filter_map(|i| node.child(i))
        .find(|child| child.kind() == "modifiers")
}

fn has_modifier(node: &Node, keyword: &str) -> bool {
    modifiers(node)
        .map(|mods| {
            (0..mods.child_count())
                .filter_map(|i| mods.child(i))
                .any(|child| child.kind() == keyword)
        })
        .unwrap_or(false)
}

/// Collects the annotations attached to a declaration.
fn collect_annotations(node: &Node, source: &str) -> Vec<Annotation> {
    let Some(mods) = modifiers(node) else {
        return Vec::new();
    };

    let mut annotations = Vec::new();
    for i in 0..mods.named_child_count() {
        let Some(child) = mods.named_child(i) else {
            continue;
        };
        if child.kind() != "marker_annotation" && child.kind() != "annotation" {
            continue;
        }
        let Some(name_node) = child.child_by_field_name("name") else {
            continue;
        };

        let mut arguments = Vec::new();
        if let Some(args) = child.child_by_field_name("arguments") {
            for j in 0..args.named_child_count() {
                let Some(pair) = args.named_child(j) else {
                    continue;
                };
                if pair.kind() != "element_value_pair" {
                    continue;
                }
                if let (Some(key), Some(value)) = (
                    pair.child_by_field_name("key"),
                    pair.child_by_field_name("value"),
                ) {
                    arguments.push((get_text(&key, source), get_text(&value, source)));
                }
            }
        }

        annotations.push(Annotation {
            name: simple_type_name(&get_text(&name_node, source)),
            arguments,
        });
    }
    annotations
}

/// Resolves a field type into its target type name, collection-ness and
/// container name.
///
/// Arrays of primitives (`byte[]`) are single values, not collections.
fn resolve_type(node: &Node, source: &str) -> (String, bool, Option<String>) {
    match node.kind() {
        "generic_type" => {
            let mut raw = None;
            let mut arguments = Vec::new();
            for i in 0..node.named_child_count() {
                let Some(child) = node.named_child(i) else {
                    continue;
                };
                if child.kind() == "type_arguments" {
                    for j in 0..child.named_child_count() {
                        if let Some(arg) = child.named_child(j) {
                            arguments.push(simple_type_name(&get_text(&arg, source)));
                        }
                    }
                } else if raw.is_none() {
                    raw = Some(simple_type_name(&get_text(&child, source)));
                }
            }

            let raw = raw.unwrap_or_default();
            match arguments.last() {
                Some(element) if COLLECTION_TYPES.contains(&raw.as_str()) => {
                    (element.clone(), true, Some(raw))
                }
                _ => (raw, false, None),
            }
        }
        "array_type" => {
            let Some(element) = node.child_by_field_name("element") else {
                return (get_text(node, source), false, None);
            };
            let name = simple_type_name(&get_text(&element, source));
            if PRIMITIVE_TYPES.contains(&element.kind()) {
                (format!("{}[]", name), false, None)
            } else {
                (name, true, Some("[]".to_string()))
            }
        }
        _ => (simple_type_name(&get_text(node, source)), false, None),
    }
}

/// Strips package qualifiers, wildcards and type arguments:
/// `java.util.List<Car>` -> `List`, `? extends Car` -> `Car`.
fn simple_type_name(text: &str) -> String {
    let without_args = text.split('<').next().unwrap_or(text);
    let last_token = without_args
        .split_whitespace()
        .last()
        .unwrap_or(without_args);
    last_token.rsplit('.').next().unwrap_or(last_token).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<ParsedClass> {
        let parser = JavaParser;
        let mut ts_parser = tree_sitter::Parser::new();
        ts_parser.set_language(&parser.language()).unwrap();
        let tree = ts_parser.parse(source, None).unwrap();
        parser.extract_classes(&tree, source, "Test.java")
    }

    #[test]
    fn test_parse_entity_fields() {
        let source = r#"
package playground.erm.jpa;

import javax.persistence.*;
import java.util.List;

@Entity
public class Car implements Vehicle {
    @Column
    private String name;
    @OneToOne
    private Engine engine;
    @ManyToMany
    private List<Driver> drivers;
    @ManyToOne
    private Owner owner;
    @OneToMany(orphanRemoval = true)
    private List<Seat> seats;

    public Sex getSex() {
        return owner.sex;
    }
}
"#;

        let classes = parse(source);
        assert_eq!(classes.len(), 1);

        let car = &classes[0];
        assert_eq!(car.name, "Car");
        assert!(car.is_entity);
        assert_eq!(car.superclass, None);

        assert_eq!(
            car.fields,
            vec![
                RawField::attribute("name", "String"),
                RawField::relation("engine", "Engine", RelationshipTag::OneToOne),
                RawField::relation("drivers", "Driver", RelationshipTag::ManyToMany)
                    .in_container("List"),
                RawField::relation("owner", "Owner", RelationshipTag::ManyToOne),
                RawField::relation("seats", "Seat", RelationshipTag::OneToMany)
                    .in_container("List")
                    .with_orphan_removal(),
            ]
        );
    }

    #[test]
    fn test_join_column_and_superclass() {
        let source = r#"
@Entity
public class Seat extends BaseSeat {
    @ManyToOne
    @JoinColumn
    private Car car;
}
"#;

        let classes = parse(source);
        let seat = &classes[0];
        assert_eq!(seat.superclass.as_deref(), Some("BaseSeat"));
        assert_eq!(
            seat.fields,
            vec![RawField::relation("car", "Car", RelationshipTag::ManyToOne).with_join_key()]
        );
    }

    #[test]
    fn test_static_and_transient_fields_are_skipped() {
        let source = r#"
@javax.persistence.Entity
public class Engine {
    private static final long serialVersionUID = 1L;
    private transient Object cache;
    @Transient
    private String label;
    public String power;
}
"#;

        let classes = parse(source);
        let engine = &classes[0];
        assert!(engine.is_entity);
        assert_eq!(engine.fields, vec![RawField::attribute("power", "String")]);
    }

    #[test]
    fn test_container_names_are_kept() {
        let source = r#"
@Entity
public class Owner {
    private byte[] photo;
    @OneToMany
    private Set<Car> cars;
    @ManyToMany
    private Driver[] drivers;
    @OneToMany
    private Map<String, Seat> seatsByRow;
}
"#;

        let classes = parse(source);
        assert_eq!(
            classes[0].fields,
            vec![
                RawField::attribute("photo", "byte[]"),
                RawField::relation("cars", "Car", RelationshipTag::OneToMany).in_container("Set"),
                RawField::relation("drivers", "Driver", RelationshipTag::ManyToMany)
                    .in_container("[]"),
                RawField::relation("seatsByRow", "Seat", RelationshipTag::OneToMany)
                    .in_container("Map"),
            ]
        );
    }

    #[test]
    fn test_non_entity_class() {
        let source = r#"
public abstract class Person {
    protected String name;
    protected Sex sex;
}
"#;

        let classes = parse(source);
        assert!(!classes[0].is_entity);
        assert_eq!(classes[0].fields.len(), 2);
    }

    #[test]
    fn test_simple_type_name() {
        assert_eq!(simple_type_name("java.util.List<Car>"), "List");
        assert_eq!(simple_type_name("javax.persistence.OneToMany"), "OneToMany");
        assert_eq!(simple_type_name("Car"), "Car");
        assert_eq!(simple_type_name("? extends Car"), "Car");
    }
}
