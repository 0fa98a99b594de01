//! Folio CLI: render notes and inspect the collection registry.
//!
//! Usage:
//!   folio render <dir> <title> [--language xx]
//!   folio tags <dir>
//!   folio registry <list|forget> [--registry path]

use clap::{Parser, Subcommand};
use folio::config::{default_config_path, FolioConfig};
use folio::federation::RegistrySnapshot;
use folio::reference::{render_note, unique_tags};
use folio::{CollectionKey, CollectionRegistry, CommonMarkRenderer, JsonFileRegistry, Language, Note};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "folio", version, about = "Federated note collections")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one note of a directory of markdown files as HTML
    Render {
        /// Directory whose *.md files form one collection
        dir: PathBuf,
        /// Title (file stem) of the note to render
        title: String,
        /// Language code for previews (en, nl, ro)
        #[arg(long)]
        language: Option<String>,
    },
    /// List the distinct tags of a directory of markdown files
    Tags {
        dir: PathBuf,
    },
    /// Inspect or edit the locally-known collection registry
    Registry {
        #[command(subcommand)]
        action: RegistryAction,
        /// Path to the registry file
        #[arg(long, global = true)]
        registry: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum RegistryAction {
    /// List known collections
    List,
    /// Remove a collection from the registry without touching its store
    Forget {
        /// Title of the collection
        title: String,
    },
}

/// Read every `*.md` file in `dir` as a note of one collection, sorted by title
fn load_dir(dir: &Path) -> Result<Vec<Note>, String> {
    let entries = std::fs::read_dir(dir).map_err(|e| format!("Failed to read {}: {}", dir.display(), e))?;
    let collection = CollectionKey::new();
    let mut notes = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| format!("Failed to read {}: {}", dir.display(), e))?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let Some(title) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let body = std::fs::read_to_string(&path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        notes.push(Note::new(title, body, collection));
    }
    notes.sort_by(|a, b| a.title.cmp(&b.title));
    Ok(notes)
}

fn dir_title(dir: &Path) -> String {
    dir.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

fn cmd_render(config: &FolioConfig, dir: &Path, title: &str, language: Option<&str>) -> i32 {
    let notes = match load_dir(dir) {
        Ok(notes) => notes,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let Some(note) = notes.iter().find(|n| n.title == title) else {
        eprintln!("Error: no note titled '{}' in {}", title, dir.display());
        return 1;
    };
    let language = language.map(Language::from_code).unwrap_or(config.language);
    let html = render_note(
        note,
        &notes,
        &dir_title(dir),
        &language.messages(),
        &CommonMarkRenderer::new(),
    );
    println!("{}", html);
    0
}

fn cmd_tags(dir: &Path) -> i32 {
    match load_dir(dir) {
        Ok(notes) => {
            for tag in unique_tags(&notes) {
                println!("#{}", tag);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_registry_list(registry: &JsonFileRegistry) -> i32 {
    let snapshot = match registry.load() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if snapshot.collections.is_empty() {
        println!("No collections in {}", registry.path().display());
        return 0;
    }
    for collection in &snapshot.collections {
        let marker = if snapshot.default_collection == Some(collection.key) {
            " (default)"
        } else {
            ""
        };
        let id = collection
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{}\t{}\t{}{}", collection.title, collection.server_url, id, marker);
    }
    0
}

fn cmd_registry_forget(registry: &JsonFileRegistry, title: &str) -> i32 {
    let snapshot = match registry.load() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let Some(found) = snapshot.find(title) else {
        eprintln!("Error: collection '{}' not found", title);
        return 1;
    };
    if snapshot.default_collection == Some(found.key) {
        eprintln!("Error: '{}' is the default collection", title);
        return 1;
    }
    let key = found.key;
    let updated = RegistrySnapshot {
        default_collection: snapshot.default_collection,
        collections: snapshot.collections.into_iter().filter(|c| c.key != key).collect(),
    };
    match registry.persist(&updated) {
        Ok(()) => {
            println!("Forgot collection '{}'", title);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = match FolioConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load {}: {}", config_path.display(), e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Render { dir, title, language } => cmd_render(&config, &dir, &title, language.as_deref()),
        Commands::Tags { dir } => cmd_tags(&dir),
        Commands::Registry { action, registry } => {
            let registry = JsonFileRegistry::new(registry.unwrap_or_else(|| config.registry_path.clone()));
            match action {
                RegistryAction::List => cmd_registry_list(&registry),
                RegistryAction::Forget { title } => cmd_registry_forget(&registry, &title),
            }
        }
    };
    std::process::exit(code);
}
