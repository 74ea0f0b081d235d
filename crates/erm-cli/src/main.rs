//! Erm CLI - Command-line interface for Erm
//!
//! Loads entity declarations from JSON or JPA-annotated Java sources,
//! checks them for relationship consistency, and answers queries over the
//! resulting graph.

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use erm_graph::RelationshipKind;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Outcome;

#[derive(Parser)]
#[command(name = "erm")]
#[command(author = "Erm Contributors")]
#[command(version)]
#[command(about = "Static entity-relationship graph checker", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default .erm/config.json
    Init {
        /// Project directory (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Build the graph and report every consistency violation
    Analyze {
        /// Declaration JSON, Java file or source directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// List entities directly related to an entity
    Neighbors {
        entity: String,

        /// Only follow edges of this kind (e.g. one-to-many)
        #[arg(short, long)]
        kind: Option<RelationshipKind>,

        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Show the relationship kind of one field
    Field {
        entity: String,
        field: String,

        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Find the shortest relationship path between two entities
    Path {
        from: String,
        to: String,

        /// Maximum hops (defaults to maxDepth from the config)
        #[arg(short, long)]
        depth: Option<usize>,

        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Render the graph as a PlantUML diagram or JSON document
    Export {
        #[arg(default_value = ".")]
        path: PathBuf,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Plantuml)]
        format: ExportFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Plantuml,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let result = match cli.command {
        Commands::Init { path } => commands::init(&path),
        Commands::Analyze { path, json } => commands::analyze(&path, json),
        Commands::Neighbors { entity, kind, path } => commands::neighbors(&path, &entity, kind),
        Commands::Field {
            entity,
            field,
            path,
        } => commands::field(&path, &entity, &field),
        Commands::Path {
            from,
            to,
            depth,
            path,
        } => commands::path(&path, &from, &to, depth),
        Commands::Export {
            path,
            format,
            output,
        } => commands::export(&path, format, output.as_deref()),
    };

    match result {
        Ok(Outcome::Clean) => {}
        Ok(Outcome::Violations) => std::process::exit(2),
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}
