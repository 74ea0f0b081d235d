//! Diagram and JSON export.
//!
//! Renders a graph as a PlantUML entity-relationship diagram, or as a JSON
//! document listing entities, edges and statistics.

use crate::edge::{RelationshipEdge, RelationshipKind};
use crate::graph::{EntityGraph, GraphStats, GraphStatus};
use crate::validator::Violation;
use erm_core::{EntityDescriptor, FieldDescriptor};
use serde::Serialize;

/// Title, caption and visibility for a rendered diagram.
#[derive(Debug, Clone, Default)]
pub struct DiagramOptions {
    pub title: String,
    pub description: String,
    /// Entities left out of the diagram, along with every relation
    /// touching them.
    pub hidden: Vec<String>,
}

impl DiagramOptions {
    fn is_hidden(&self, entity: &str) -> bool {
        self.hidden.iter().any(|h| h == entity)
    }
}

/// Renders the graph as PlantUML.
///
/// Each bidirectional pair is drawn once with both field names. Edges to
/// undeclared or hidden entities are left out.
pub fn render_plantuml(graph: &EntityGraph, options: &DiagramOptions) -> String {
    let declarations: Vec<String> = graph
        .entities()
        .filter(|entity| !options.is_hidden(entity.id()))
        .map(render_entity)
        .collect();

    let mut relations: Vec<String> = graph
        .edges()
        .filter(|edge| !options.is_hidden(&edge.source) && !options.is_hidden(&edge.target))
        .filter_map(|edge| render_relation(graph, edge))
        .collect();
    relations.sort();
    relations.dedup();

    let mut out = String::from("@startuml\n");
    for declaration in &declarations {
        out.push_str(declaration);
        out.push('\n');
    }
    for relation in &relations {
        out.push_str(relation);
        out.push('\n');
    }
    out.push_str(&format!("title\n{}\nendtitle\n", options.title));
    out.push_str(&format!("caption\n{}\nendcaption\n", options.description));
    out.push_str("skinparam linetype polyline\n@enduml\n");
    out
}

fn render_entity(entity: &EntityDescriptor) -> String {
    let fields: Vec<String> = entity.fields().iter().map(render_field).collect();
    format!(
        "entity {} <<entity>> #afa{{\n{}\n}}",
        entity.id(),
        fields.join("\n")
    )
}

fn render_field(field: &FieldDescriptor) -> String {
    match (field.is_collection(), field.container()) {
        (true, Some("[]")) => format!("{}:{}[]", field.name(), field.target_type()),
        (true, Some(container)) => {
            format!("{}:{}<{}>", field.name(), container, field.target_type())
        }
        (true, None) => format!("{}:List<{}>", field.name(), field.target_type()),
        (false, _) => format!("{}:{}", field.name(), field.target_type()),
    }
}

fn render_relation(graph: &EntityGraph, edge: &RelationshipEdge) -> Option<String> {
    if !graph.contains_entity(&edge.source) || !graph.contains_entity(&edge.target) {
        return None;
    }

    let (from_mult, to_mult) = edge.kind.multiplicity();
    match graph.inverse_of(edge) {
        Some(inverse) => {
            // Draw the pair from its lower edge id only
            if inverse.id < edge.id {
                return None;
            }
            Some(format!(
                "{} \"{}\" -- \"{}\" {} : {} / {}",
                edge.source, from_mult, to_mult, edge.target, edge.field, inverse.field
            ))
        }
        None => Some(format!(
            "{} \"{}\" --> \"{}\" {} : {}",
            edge.source, from_mult, to_mult, edge.target, edge.field
        )),
    }
}

/// A JSON view of the graph.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphExport<'a> {
    pub version: &'static str,
    pub status: GraphStatus,
    pub stats: GraphStats,
    pub entities: Vec<EntityExport<'a>>,
    pub edges: Vec<&'a RelationshipEdge>,
    pub violations: &'a [Violation],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityExport<'a> {
    pub id: &'a str,
    pub fields: Vec<FieldExport<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldExport<'a> {
    pub name: &'a str,
    pub target_type: &'a str,
    pub is_collection: bool,
    pub kind: RelationshipKind,
}

/// Builds the JSON view of a graph.
pub fn export_graph(graph: &EntityGraph) -> GraphExport<'_> {
    let entities = graph
        .entities()
        .map(|entity| EntityExport {
            id: entity.id(),
            fields: entity
                .fields()
                .iter()
                .map(|field| FieldExport {
                    name: field.name(),
                    target_type: field.target_type(),
                    is_collection: field.is_collection(),
                    kind: graph
                        .field_kind(entity.id(), field.name())
                        .unwrap_or(RelationshipKind::PlainAttribute),
                })
                .collect(),
        })
        .collect();

    GraphExport {
        version: "1.0",
        status: graph.status(),
        stats: graph.stats(),
        entities,
        edges: graph.edges().collect(),
        violations: graph.violations(),
    }
}

/// Serializes the graph as pretty-printed JSON.
pub fn export_json(graph: &EntityGraph) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&export_graph(graph))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::GraphAssembler;
    use erm_core::{build_descriptors, Declarations, RawEntity, RawField, RelationshipTag};

    fn validated(entities: Vec<RawEntity>) -> EntityGraph {
        let descriptors = build_descriptors(&Declarations::new(entities)).unwrap();
        let mut graph = GraphAssembler::new().assemble(descriptors).unwrap();
        graph.validate();
        graph
    }

    #[test]
    fn test_plantuml_layout() {
        let graph = validated(vec![
            RawEntity::new(
                "Owner",
                vec![RawField::relation("cars", "Car", RelationshipTag::OneToMany).collection()],
            ),
            RawEntity::new(
                "Car",
                vec![
                    RawField::attribute("name", "String"),
                    RawField::relation("owner", "Owner", RelationshipTag::ManyToOne),
                ],
            ),
        ]);

        let options = DiagramOptions {
            title: "Erm-Diagram".to_string(),
            description: "Cars and owners".to_string(),
            ..DiagramOptions::default()
        };
        let uml = render_plantuml(&graph, &options);

        let expected = "@startuml\n\
entity Owner <<entity>> #afa{\n\
cars:List<Car>\n\
}\n\
entity Car <<entity>> #afa{\n\
name:String\n\
owner:Owner\n\
}\n\
Owner \"1\" -- \"*\" Car : cars / owner\n\
title\n\
Erm-Diagram\n\
endtitle\n\
caption\n\
Cars and owners\n\
endcaption\n\
skinparam linetype polyline\n\
@enduml\n";
        assert_eq!(uml, expected);
    }

    #[test]
    fn test_unidirectional_and_dangling_edges() {
        let graph = validated(vec![RawEntity::new(
            "Car",
            vec![
                RawField::relation("drivers", "Driver", RelationshipTag::ManyToMany).collection(),
                RawField::relation("fuel", "Fuel", RelationshipTag::ManyToOne),
            ],
        )]);

        let uml = render_plantuml(&graph, &DiagramOptions::default());
        assert!(uml.contains("fuel:Fuel\n"));
        assert!(!uml.contains("Fuel : fuel"));

        let graph = validated(vec![
            RawEntity::new(
                "Car",
                vec![RawField::relation("drivers", "Driver", RelationshipTag::ManyToMany).collection()],
            ),
            RawEntity::new("Driver", vec![RawField::attribute("name", "String")]),
        ]);
        let uml = render_plantuml(&graph, &DiagramOptions::default());
        assert!(uml.contains("Car \"*\" --> \"*\" Driver : drivers\n"));
    }

    #[test]
    fn test_declared_containers_are_rendered() {
        let graph = validated(vec![
            RawEntity::new(
                "Owner",
                vec![
                    RawField::attribute("photo", "byte[]"),
                    RawField::relation("cars", "Car", RelationshipTag::OneToMany).in_container("Set"),
                    RawField::relation("drivers", "Driver", RelationshipTag::ManyToMany)
                        .in_container("[]"),
                ],
            ),
            RawEntity::new(
                "Car",
                vec![RawField::relation("owner", "Owner", RelationshipTag::ManyToOne)],
            ),
            RawEntity::new("Driver", vec![RawField::attribute("name", "String")]),
        ]);

        let uml = render_plantuml(&graph, &DiagramOptions::default());
        assert!(uml.contains("photo:byte[]\n"));
        assert!(uml.contains("cars:Set<Car>\n"));
        assert!(uml.contains("drivers:Driver[]\n"));
    }

    #[test]
    fn test_hidden_entities_are_left_out() {
        let graph = validated(vec![
            RawEntity::new(
                "Car",
                vec![
                    RawField::relation("engine", "Engine", RelationshipTag::OneToOne),
                    RawField::relation("owner", "Owner", RelationshipTag::ManyToOne),
                ],
            ),
            RawEntity::new(
                "Engine",
                vec![RawField::relation("car", "Car", RelationshipTag::OneToOne)],
            ),
            RawEntity::new(
                "Owner",
                vec![RawField::relation("cars", "Car", RelationshipTag::OneToMany).collection()],
            ),
        ]);

        let options = DiagramOptions {
            hidden: vec!["Engine".to_string()],
            ..DiagramOptions::default()
        };
        let uml = render_plantuml(&graph, &options);

        assert!(!uml.contains("entity Engine"));
        assert!(!uml.contains("Engine :"));
        assert!(uml.contains("entity Car <<entity>>"));
        assert!(uml.contains("Car \"*\" -- \"1\" Owner : owner / cars\n"));
    }

    #[test]
    fn test_json_export() {
        let graph = validated(vec![
            RawEntity::new(
                "Engine",
                vec![
                    RawField::attribute("power", "String"),
                    RawField::relation("car", "Car", RelationshipTag::OneToOne),
                ],
            ),
            RawEntity::new(
                "Car",
                vec![RawField::relation("engine", "Engine", RelationshipTag::OneToOne)],
            ),
        ]);

        let json: serde_json::Value = serde_json::from_str(&export_json(&graph).unwrap()).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["stats"]["entityCount"], 2);
        assert_eq!(json["stats"]["bidirectionalPairs"], 1);
        assert_eq!(json["entities"][0]["fields"][1]["kind"], "one_to_one");
        assert_eq!(json["edges"][0]["inverse"], 1);
        assert_eq!(json["violations"].as_array().unwrap().len(), 0);
    }
}
