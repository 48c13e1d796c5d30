//! kgsync CLI: validate, edit and export annotated documents.
//!
//! Usage:
//!   kgsync check <doc.json>
//!   kgsync apply <doc.json> <edits.yaml> [--out path]
//!   kgsync export <doc.json>

use clap::{Parser, Subcommand};
use kgsync::{export_triples, Config, Document, DocumentStore, Edit, KnowledgeGraph};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "kgsync",
    version,
    about = "Knowledge graph reconciliation for annotated text"
)]
struct Cli {
    /// Path to YAML config (default: ~/.config/kgsync/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a document and verify its graph invariants
    Check {
        /// Document JSON (text, entities, triples)
        doc: PathBuf,
    },
    /// Apply a YAML list of edits and write the resulting document
    Apply {
        doc: PathBuf,
        /// YAML sequence of edits
        edits: PathBuf,
        /// Output path (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the document's graph as N-Triples
    Export { doc: PathBuf },
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_document(path: &Path) -> Result<KnowledgeGraph, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("invalid document '{}': {}", path.display(), e))
}

fn load_edits(path: &Path) -> Result<Vec<Edit>, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    serde_yaml::from_str(&raw).map_err(|e| format!("invalid edits '{}': {}", path.display(), e))
}

fn cmd_check(doc: &Path) -> i32 {
    let kg = match load_document(doc) {
        Ok(kg) => kg,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if let Err(e) = kg.check_invariants() {
        eprintln!("Error: {}", e);
        return 1;
    }
    println!(
        "ok: {} entities, {} mentions, {} triples",
        kg.entity_count(),
        kg.mentions().len(),
        kg.triple_count()
    );
    0
}

fn cmd_apply(config: &Config, doc: &Path, edits: &Path, out: Option<&Path>) -> i32 {
    let kg = match load_document(doc) {
        Ok(kg) => kg,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let edits = match load_edits(edits) {
        Ok(edits) => edits,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let store = DocumentStore::with_reconciler(config.reconciler());
    let name = doc.display().to_string();
    let id = store.open(Document::new(name, kg));

    for (n, edit) in edits.iter().enumerate() {
        match store.apply(&id, edit) {
            Ok(applied) => {
                tracing::info!(
                    edit = n + 1,
                    kind = applied.change.kind(),
                    ops = applied.ops.len(),
                    "applied edit"
                );
            }
            Err(e) => {
                eprintln!("Error: edit {} rejected: {}", n + 1, e);
                return 1;
            }
        }
    }

    let Some(kg) = store.graph(&id) else {
        eprintln!("Error: document '{}' disappeared", id);
        return 1;
    };
    let json = match serde_json::to_string_pretty(&kg) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match out {
        Some(path) => {
            if let Err(e) = std::fs::write(path, json) {
                eprintln!("Error: cannot write '{}': {}", path.display(), e);
                return 1;
            }
            println!("Wrote {} ({} edits)", path.display(), edits.len());
        }
        None => println!("{}", json),
    }
    0
}

fn cmd_export(config: &Config, doc: &Path) -> i32 {
    match load_document(doc) {
        Ok(kg) => {
            println!("{}", export_triples(&kg, &config.namespaces));
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&config);

    let code = match cli.command {
        Commands::Check { doc } => cmd_check(&doc),
        Commands::Apply { doc, edits, out } => cmd_apply(&config, &doc, &edits, out.as_deref()),
        Commands::Export { doc } => cmd_export(&config, &doc),
    };
    std::process::exit(code);
}
