//! Command-line entry points: an interactive console REPL over a seeded
//! in-memory scene, and a standalone matrix validator.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::backend::NullBackend;
use crate::console::{ConsoleHandle, EntryKind};
use crate::fallback::LocalFallback;
use crate::matrix::{default_matrix, RelationshipMatrix};
use crate::router::ConsoleSession;
use crate::scene::{MemoryScene, PrimitiveKind};
use crate::scripts::ScriptOverrideStore;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive ontological console over an in-memory scene
    Repl {
        /// Relationship matrix JSON (concept -> concept -> verb label)
        #[arg(long)]
        matrix: Option<PathBuf>,

        /// Script override store JSON (sanitized triple -> source text)
        #[arg(long)]
        scripts: Option<PathBuf>,
    },
    /// Check a relationship matrix file for shape problems
    Validate {
        #[arg(long)]
        matrix: PathBuf,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Repl { matrix, scripts } => {
            let matrix = load_matrix(matrix.as_deref())?;
            let scripts = load_scripts(scripts.as_deref())?;
            repl(matrix, scripts)?;
        }
        Commands::Validate { matrix } => {
            let matrix = load_matrix(Some(matrix.as_path()))?;
            match matrix.validate_square() {
                Ok(()) => {
                    println!("matrix OK: {} concepts, square", matrix.concepts().count());
                }
                Err(problems) => {
                    for problem in &problems {
                        eprintln!("{problem}");
                    }
                    anyhow::bail!("{} problem(s) found", problems.len());
                }
            }
        }
    }
    Ok(())
}

fn load_matrix(path: Option<&Path>) -> Result<RelationshipMatrix> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading matrix file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing matrix file {}", path.display()))
        }
        None => Ok(default_matrix()),
    }
}

fn load_scripts(path: Option<&Path>) -> Result<ScriptOverrideStore> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading scripts file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing scripts file {}", path.display()))
        }
        None => Ok(ScriptOverrideStore::new()),
    }
}

fn kind_tag(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Input => "in",
        EntryKind::Output => "out",
        EntryKind::Error => "err",
        EntryKind::System => "sys",
        EntryKind::Info => "info",
        EntryKind::Success => "ok",
        EntryKind::Ai => "ai",
        EntryKind::Source => "src",
    }
}

fn repl(matrix: RelationshipMatrix, scripts: ScriptOverrideStore) -> Result<()> {
    let scene = MemoryScene::new(ConsoleHandle::new());
    let seeded = vec![
        scene.add_primitive(PrimitiveKind::Box),
        scene.add_primitive(PrimitiveKind::Sphere),
        scene.add_primitive(PrimitiveKind::Torus),
    ];

    let mut session = ConsoleSession::with_matrix(
        scene,
        Box::new(NullBackend),
        Box::new(LocalFallback::new()?),
        matrix,
        scripts,
    );
    session.set_selection(vec![seeded[0].clone()]);

    println!("ontoconsole - type a verb, 'oscillate', a question, or :help");
    for key in &seeded {
        println!("  seeded {key}");
    }
    println!("  selected: {}", seeded[0]);

    let started = Instant::now();
    let stdin = io::stdin();
    print!("> ");
    io::stdout().flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed == "exit" || trimmed == "quit" {
            break;
        }
        if let Some(meta) = trimmed.strip_prefix(':') {
            handle_meta(&mut session, meta);
        } else if !trimmed.is_empty() {
            let from = session.console().len();
            session.dispatch(trimmed);
            session.tick(started.elapsed().as_secs_f32());
            for entry in session.console().entries_since(from) {
                println!("[{:>4}] {}", kind_tag(entry.kind), entry.text);
            }
        }

        print!("> ");
        io::stdout().flush()?;
    }
    Ok(())
}

fn handle_meta(session: &mut ConsoleSession, meta: &str) {
    let mut parts = meta.split_whitespace();
    match parts.next() {
        Some("objects") => {
            for key in session.scene().keys() {
                let marker = if session.selection().contains(&key) { "*" } else { " " };
                println!("{marker} {key}");
            }
        }
        Some("select") => {
            let keys: Vec<String> = parts.map(str::to_string).collect();
            let missing: Vec<&String> =
                keys.iter().filter(|k| !session.scene().exists(k)).collect();
            if keys.is_empty() {
                println!("usage: :select <key> [key...]");
            } else if !missing.is_empty() {
                println!("unknown object(s): {missing:?}");
            } else {
                println!("selected {} object(s)", keys.len());
                session.set_selection(keys);
            }
        }
        Some("delete") => match parts.next() {
            Some(key) => {
                if session.delete_object(key) {
                    println!("deleted {key}");
                } else {
                    println!("no such object: {key}");
                }
            }
            None => println!("usage: :delete <key>"),
        },
        Some("oscillators") => {
            let mut any = false;
            for key in session.scene().keys() {
                for descriptor in session.oscillators().oscillators(&key) {
                    any = true;
                    println!(
                        "{key}: {} f={} a={} o={} base={}{}",
                        descriptor.path_raw,
                        descriptor.frequency,
                        descriptor.amplitude,
                        descriptor.offset,
                        descriptor.base_value,
                        if descriptor.enabled { "" } else { " (disabled)" },
                    );
                }
            }
            if !any {
                println!("no active oscillators");
            }
        }
        _ => {
            println!(":objects            list scene objects (* = selected)");
            println!(":select <key...>    set the selection");
            println!(":delete <key>       delete an object");
            println!(":oscillators        list active oscillators");
            println!("exit | quit         leave");
        }
    }
}
