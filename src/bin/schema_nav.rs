//! Schema Navigation CLI
//!
//! Validates documents against a compiled schema and answers the editor
//! queries (resolve, insert keys, value suggestions, removal checks).
//!
//! Usage:
//!   schema-nav --schema schema.json validate config.json
//!   schema-nav insert-keys servers.0 --document config.json
//!   schema-nav diagnostics

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use schema_nav::{parse_path, NavigatorConfig, SchemaNavigator};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-nav")]
#[command(about = "Validate and navigate JSON documents against a compiled schema")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compiled schema file or directory (overrides config)
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Root definition name (overrides config)
    #[arg(short, long)]
    root: Option<String>,

    /// Fail on unresolved discriminator targets
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a document against the root definition
    Validate {
        document: PathBuf,
    },

    /// Show the schema node and template value at a path
    Resolve {
        path: String,
        #[arg(short, long)]
        document: Option<PathBuf>,
    },

    /// List keys that may be inserted under a path
    InsertKeys {
        path: String,
        #[arg(short, long)]
        document: PathBuf,
        /// Include the value template for each key
        #[arg(long)]
        templates: bool,
    },

    /// List enumerated values for the string at a path
    Suggest {
        path: String,
        #[arg(short, long)]
        document: Option<PathBuf>,
    },

    /// Check and perform removal of the value at a path
    Remove {
        path: String,
        #[arg(short, long)]
        document: PathBuf,
    },

    /// Report schema defects found while loading
    Diagnostics,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns false when the command found problems in the document
fn run(cli: Cli) -> Result<bool> {
    let mut config = NavigatorConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(schema) = cli.schema {
        config.schema.path = schema;
    }
    if let Some(root) = cli.root {
        config.schema.root = root;
    }
    config.schema.strict |= cli.strict;

    let navigator = SchemaNavigator::from_config(&config).with_context(|| {
        format!("Failed to load schema from {}", config.schema_path().display())
    })?;
    let format = config.output.format;

    match cli.command {
        Commands::Validate { document } => {
            let doc = read_document(&document)?;
            let errors = navigator.validate(&doc);
            if errors.is_empty() {
                eprintln!("✅ {} is valid", document.display());
            } else {
                eprintln!("❌ {} error(s) in {}", errors.len(), document.display());
            }
            println!("{}", format.render(&errors)?);
            Ok(errors.is_empty())
        }

        Commands::Resolve { path, document } => {
            let doc = document.as_deref().map(read_document).transpose()?;
            let resolved = navigator.resolve(&parse_path(&path), doc.as_ref())?;
            let report = json!({
                "kind": resolved.node.kind(),
                "description": resolved.node.description,
                "isRequired": resolved.node.is_required,
                "data": resolved.data,
            });
            println!("{}", format.render(&report)?);
            Ok(true)
        }

        Commands::InsertKeys {
            path,
            document,
            templates,
        } => {
            let doc = read_document(&document)?;
            let parent = parse_path(&path);
            let output = if templates {
                format.render(&navigator.insert_candidates(&parent, &doc)?)?
            } else {
                format.render(&navigator.valid_insert_keys(&parent, &doc)?)?
            };
            println!("{}", output);
            Ok(true)
        }

        Commands::Suggest { path, document } => {
            let doc = document.as_deref().map(read_document).transpose()?;
            let values = navigator.suggest_values(&parse_path(&path), doc.as_ref())?;
            println!("{}", format.render(&values)?);
            Ok(true)
        }

        Commands::Remove { path, document } => {
            let doc = read_document(&document)?;
            match navigator.remove(&doc, &parse_path(&path)) {
                Ok(edited) => {
                    println!("{}", format.render(&edited)?);
                    Ok(true)
                }
                Err(refused) => {
                    eprintln!("❌ {}", refused);
                    Ok(false)
                }
            }
        }

        Commands::Diagnostics => {
            let diagnostics = navigator.diagnostics();
            if diagnostics.is_empty() {
                eprintln!("✅ No schema defects");
            }
            for item in diagnostics.all() {
                println!("{}", item);
            }
            Ok(!diagnostics.has_errors())
        }
    }
}

fn read_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))
}
