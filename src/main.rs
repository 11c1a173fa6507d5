use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;

use tracing_subscriber::EnvFilter;

use docschema::catalog::SchemaCatalog;
use docschema::config::{get_config_path, load_config, save_config, DocSchemaConfig, LOG_ENV};
use docschema::types::*;

/// Schema resolution for document-mapped templates.
#[derive(Parser)]
#[command(name = "docschema", about = "Schema resolution for document-mapped templates")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default docschema.json
    Init {
        /// Project path (default: current directory)
        path: Option<String>,
    },
    /// Print resolved collection, table and references per template
    Resolve {
        /// Project path
        #[arg(short, long)]
        path: Option<String>,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Classify the properties of a template as embedded or cross-document
    Classify {
        /// Template name
        template: String,
        /// Only classify this property
        property: Option<String>,
        /// Project path
        #[arg(short, long)]
        path: Option<String>,
    },
    /// Load and validate the schema without printing it
    Check {
        /// Project path
        #[arg(short, long)]
        path: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Installs a stderr subscriber filtered by `DOCSCHEMA_LOG`, falling back to
/// the project's configured filter.
fn init_tracing(cli: &Cli) {
    let path = match &cli.command {
        Commands::Init { path } => path.clone(),
        Commands::Resolve { path, .. }
        | Commands::Classify { path, .. }
        | Commands::Check { path } => path.clone(),
    };
    let fallback = load_config(&resolve_path(path))
        .map(|c| c.log_filter)
        .unwrap_or_else(|_| "warn".to_string());
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> docschema::errors::Result<()> {
    match cli.command {
        Commands::Init { path } => {
            let project_path = resolve_path(path);
            save_config(&project_path, &DocSchemaConfig::default())?;
            println!(
                "Wrote {}",
                get_config_path(&project_path).display()
            );
        }
        Commands::Resolve { path, json } => {
            let project_path = resolve_path(path);
            let catalog = SchemaCatalog::open(&project_path)?;
            let report = build_report(&catalog);
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).unwrap_or_default()
                );
            } else {
                print_report(&report);
            }
        }
        Commands::Classify {
            template,
            property,
            path,
        } => {
            let project_path = resolve_path(path);
            let catalog = SchemaCatalog::open(&project_path)?;
            let properties = match property {
                Some(p) => vec![p],
                None => {
                    let id = catalog.template_id(&template)?;
                    catalog.registry().properties(id).into_keys().collect()
                }
            };
            for prop in &properties {
                let verdict = if catalog.is_cross_document_reference(&template, prop)? {
                    "cross-document"
                } else {
                    "embedded"
                };
                println!("{}.{}: {}", template, prop, verdict);
            }
        }
        Commands::Check { path } => {
            let project_path = resolve_path(path);
            let catalog = SchemaCatalog::open(&project_path)?;
            let snapshot = catalog.snapshot();
            println!(
                "Schema OK: {} of {} templates resolved",
                snapshot.resolved_count(),
                catalog.registry().len()
            );
        }
    }
    Ok(())
}

/// Resolved metadata rendered with template names instead of ids.
#[derive(Serialize)]
struct TemplateReport {
    collection: String,
    table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_owner: Option<String>,
    parent_refs: BTreeMap<String, Reference>,
    child_refs: BTreeMap<String, Reference>,
}

fn build_report(catalog: &SchemaCatalog) -> BTreeMap<String, TemplateReport> {
    let registry = catalog.registry();
    let snapshot = catalog.snapshot();
    snapshot
        .iter()
        .map(|(id, r)| {
            let report = TemplateReport {
                collection: r.collection_name.clone(),
                table: r.table_name.clone(),
                top_owner: r.top_owner.map(|o| registry.name(o).to_string()),
                parent_refs: r.parent_refs.clone(),
                child_refs: r.child_refs.clone(),
            };
            (registry.name(id).to_string(), report)
        })
        .collect()
}

fn print_report(report: &BTreeMap<String, TemplateReport>) {
    for (name, r) in report {
        println!("{}", name);
        println!("  collection: {}", r.collection);
        println!("  table:      {}", r.table);
        if let Some(owner) = &r.top_owner {
            println!("  top owner:  {}", owner);
        }
        for (prop, reference) in r.parent_refs.iter().chain(r.child_refs.iter()) {
            let side = match reference {
                Reference::Parent(_) => "parent",
                Reference::Child(_) => "child",
            };
            let cross = if reference.is_cross_document() {
                " (crossDocument)"
            } else {
                ""
            };
            println!("  {} ref {}{}", side, prop, cross);
        }
    }
}

/// Resolves an optional path argument to a `PathBuf`.
///
/// Defaults to the current working directory if no path is provided.
fn resolve_path(path: Option<String>) -> PathBuf {
    match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf()),
    }
}
