//! CLI command implementations.

use crate::ExportFormat;
use colored::Colorize;
use erm_core::{load_path, ErmConfig, LoadResult};
use erm_graph::{analyze as run_analysis, export_json, render_plantuml, Analysis, DiagramOptions};
use erm_graph::{RelationshipKind, Violation};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// How a command finished, mapped to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    /// The graph has violations; details were already printed.
    Violations,
}

/// Create `.erm/config.json` in a directory.
pub fn init(path: &Path) -> Result<Outcome> {
    let config_path = ErmConfig::path_for(path);

    if config_path.exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(Outcome::Clean);
    }

    let config = ErmConfig {
        title: "Erm-Diagram".to_string(),
        ..ErmConfig::default()
    };
    let written = config.save(path)?;

    println!("{} Wrote {}", "✓".green(), written.display());
    println!("  Run {} to check your entities", "erm analyze".cyan());

    Ok(Outcome::Clean)
}

/// Project root for a path: the directory itself, or the parent of a file.
fn project_root(path: &Path) -> &Path {
    if path.is_dir() {
        return path;
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Loads declarations and runs the full analysis, with a spinner while
/// sources are parsed.
fn load(path: &Path) -> Result<(ErmConfig, LoadResult, Analysis)> {
    let config = ErmConfig::load_or_default(project_root(path))?;
    debug!(path = %path.display(), ignore = ?config.ignore, "loading declarations");

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message("Loading declarations...");

    let loaded = load_path(path, &config);
    spinner.finish_and_clear();
    let loaded = loaded?;

    if !loaded.errors.is_empty() {
        eprintln!("{} files could not be parsed:", "⚠".yellow());
        for (file, error) in loaded.errors.iter().take(5) {
            eprintln!("  {} - {}", file.red(), error);
        }
        if loaded.errors.len() > 5 {
            eprintln!("  ... and {} more", loaded.errors.len() - 5);
        }
    }

    let analysis = run_analysis(&loaded.declarations)?;
    Ok((config, loaded, analysis))
}

fn print_violations(violations: &[Violation]) {
    eprintln!(
        "{} {} violation(s):",
        "✗".red(),
        violations.len().to_string().red().bold()
    );
    for violation in violations {
        let sites: Vec<String> = violation.sites.iter().map(ToString::to_string).collect();
        eprintln!(
            "  {} {} - {}",
            violation.kind.to_string().yellow(),
            sites.join(", ").cyan(),
            violation.detail
        );
    }
}

/// Loads and analyses `path`, printing violations when the graph is not
/// ready for queries.
fn load_ready(path: &Path) -> Result<Option<(ErmConfig, Analysis)>> {
    let (config, _, analysis) = load(path)?;
    if analysis.is_ready() {
        Ok(Some((config, analysis)))
    } else {
        print_violations(&analysis.violations);
        Ok(None)
    }
}

/// Build the graph and report its consistency.
pub fn analyze(path: &Path, json_output: bool) -> Result<Outcome> {
    let (_, loaded, analysis) = load(path)?;
    let stats = analysis.graph.stats();

    if json_output {
        let output = serde_json::json!({
            "filesScanned": loaded.files_scanned,
            "durationMs": loaded.duration_ms,
            "stats": stats,
            "violations": analysis.violations,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "{} Loaded {} entities from {} files in {}ms",
            "✓".green(),
            stats.entity_count.to_string().cyan(),
            loaded.files_scanned.to_string().cyan(),
            loaded.duration_ms
        );
        println!(
            "  {} {} ({} bidirectional pairs)",
            "Edges:".dimmed(),
            stats.edge_count,
            stats.bidirectional_pairs
        );
        println!("  {} {}", "Attributes:".dimmed(), stats.attribute_count);

        if analysis.is_ready() {
            println!("{} No violations", "✓".green());
        } else {
            print_violations(&analysis.violations);
        }
    }

    Ok(if analysis.is_ready() {
        Outcome::Clean
    } else {
        Outcome::Violations
    })
}

/// List the direct neighbors of an entity.
pub fn neighbors(path: &Path, entity: &str, kind: Option<RelationshipKind>) -> Result<Outcome> {
    let Some((_, analysis)) = load_ready(path)? else {
        return Ok(Outcome::Violations);
    };

    let related = analysis.graph.neighbors(entity, kind)?;
    if related.is_empty() {
        println!("{} has no related entities", entity.cyan());
        return Ok(Outcome::Clean);
    }

    for target in related {
        let fields: Vec<String> = analysis
            .graph
            .edges_from(entity)
            .filter(|edge| edge.target == target && kind.map_or(true, |k| k == edge.kind))
            .map(|edge| format!("{} ({})", edge.field, edge.kind))
            .collect();
        println!("  {} {}", target.cyan(), fields.join(", ").dimmed());
    }

    Ok(Outcome::Clean)
}

/// Show the relationship kind of one field.
pub fn field(path: &Path, entity: &str, field: &str) -> Result<Outcome> {
    let Some((_, analysis)) = load_ready(path)? else {
        return Ok(Outcome::Violations);
    };

    let kind = analysis.graph.cardinality_of(entity, field)?;
    print!("{}.{}: {}", entity, field.cyan(), kind.to_string().yellow());

    if let Some(edge) = analysis.graph.edge_for_field(entity, field) {
        print!(" -> {}", edge.target);
        if let Some(inverse) = analysis.graph.inverse_of(edge) {
            print!(" (inverse {}.{})", inverse.source, inverse.field);
        }
        if edge.owning {
            print!(" {}", "[owning]".green());
        }
    }
    println!();

    Ok(Outcome::Clean)
}

/// Find the shortest relationship path between two entities.
pub fn path(path: &Path, from: &str, to: &str, depth: Option<usize>) -> Result<Outcome> {
    let Some((config, analysis)) = load_ready(path)? else {
        return Ok(Outcome::Violations);
    };

    let max_depth = depth.unwrap_or(config.max_depth);
    let hops = analysis.graph.path(from, to, max_depth)?;

    if hops.is_empty() {
        println!(
            "No path from {} to {} within {} hops",
            from.cyan(),
            to.cyan(),
            max_depth
        );
    } else {
        println!("{}", hops.join(" -> "));
    }

    Ok(Outcome::Clean)
}

/// Render the graph as PlantUML or JSON.
pub fn export(path: &Path, format: ExportFormat, output: Option<&Path>) -> Result<Outcome> {
    let (config, _, analysis) = load(path)?;

    let rendered = match format {
        ExportFormat::Plantuml => {
            let options = DiagramOptions {
                title: config.title.clone(),
                description: config.description.clone(),
                hidden: config.hidden.clone(),
            };
            render_plantuml(&analysis.graph, &options)
        }
        ExportFormat::Json => export_json(&analysis.graph)?,
    };

    match output {
        Some(out_path) => {
            fs::write(out_path, rendered)?;
            eprintln!("{} Exported to {}", "✓".green(), out_path.display());
        }
        None => print!("{}", rendered),
    }

    if analysis.is_ready() {
        Ok(Outcome::Clean)
    } else {
        print_violations(&analysis.violations);
        Ok(Outcome::Violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erm_core::{Declarations, RawEntity, RawField, RelationshipTag};
    use tempfile::tempdir;

    fn write_declarations(dir: &Path, entities: Vec<RawEntity>) -> std::path::PathBuf {
        let file = dir.join("entities.json");
        fs::write(&file, Declarations::new(entities).to_json().unwrap()).unwrap();
        file
    }

    #[test]
    fn test_init_writes_config_once() {
        let dir = tempdir().unwrap();
        assert_eq!(init(dir.path()).unwrap(), Outcome::Clean);

        let config = ErmConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.title, "Erm-Diagram");

        assert_eq!(init(dir.path()).unwrap(), Outcome::Clean);
    }

    #[test]
    fn test_project_root_of_file() {
        let dir = tempdir().unwrap();
        let file = write_declarations(dir.path(), vec![]);
        assert_eq!(project_root(&file), dir.path());
        assert_eq!(project_root(Path::new("entities.json")), Path::new("."));
    }

    #[test]
    fn test_analyze_reports_violations() {
        let dir = tempdir().unwrap();
        let file = write_declarations(
            dir.path(),
            vec![RawEntity::new(
                "Seat",
                vec![RawField::relation("car", "Car", RelationshipTag::ManyToOne)],
            )],
        );

        assert_eq!(analyze(&file, true).unwrap(), Outcome::Violations);
        assert_eq!(field(&file, "Seat", "car").unwrap(), Outcome::Violations);
    }

    #[test]
    fn test_queries_on_consistent_graph() {
        let dir = tempdir().unwrap();
        let file = write_declarations(
            dir.path(),
            vec![
                RawEntity::new(
                    "Owner",
                    vec![RawField::relation("cars", "Car", RelationshipTag::OneToMany).collection()],
                ),
                RawEntity::new(
                    "Car",
                    vec![RawField::relation("owner", "Owner", RelationshipTag::ManyToOne)],
                ),
            ],
        );

        assert_eq!(analyze(&file, false).unwrap(), Outcome::Clean);
        assert_eq!(neighbors(&file, "Car", None).unwrap(), Outcome::Clean);
        assert_eq!(path(&file, "Car", "Owner", Some(1)).unwrap(), Outcome::Clean);
        assert!(field(&file, "Car", "wheels").is_err());

        let out = dir.path().join("diagram.puml");
        assert_eq!(
            export(&file, ExportFormat::Plantuml, Some(&out)).unwrap(),
            Outcome::Clean
        );
        let uml = fs::read_to_string(&out).unwrap();
        assert!(uml.contains("Owner \"1\" -- \"*\" Car : cars / owner"));
    }

    #[test]
    fn test_export_json_honours_config() {
        let dir = tempdir().unwrap();
        let file = write_declarations(
            dir.path(),
            vec![
                RawEntity::new(
                    "Engine",
                    vec![RawField::relation("car", "Car", RelationshipTag::OneToOne)],
                ),
                RawEntity::new(
                    "Car",
                    vec![RawField::relation("engine", "Engine", RelationshipTag::OneToOne)],
                ),
            ],
        );
        ErmConfig {
            hidden: vec!["Engine".to_string()],
            ..ErmConfig::default()
        }
        .save(dir.path())
        .unwrap();

        let out = dir.path().join("graph.json");
        assert_eq!(
            export(&file, ExportFormat::Json, Some(&out)).unwrap(),
            Outcome::Clean
        );
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["stats"]["bidirectionalPairs"], 1);
        assert_eq!(json["entities"][1]["id"], "Car");

        let uml = dir.path().join("graph.puml");
        export(&file, ExportFormat::Plantuml, Some(&uml)).unwrap();
        assert!(!fs::read_to_string(&uml).unwrap().contains("entity Engine"));
    }
}
