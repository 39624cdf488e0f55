use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use refstitch_core::{Document, JoinConfig};

/// Reconstruct reference entries and sections from labeled document text
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the reconstructed reference entries
    Refs {
        /// Path to a .txt or .ttx file
        file: PathBuf,

        /// Emit a JSON array instead of one entry per line
        #[arg(long)]
        json: bool,

        /// Leading-whitespace width treated as a wrapped continuation
        #[arg(long)]
        hanging_indent: Option<f64>,

        /// Largest line-shape change still treated as a same-entry wrap
        #[arg(long)]
        max_delta: Option<f64>,
    },

    /// Print the document title
    Title {
        /// Path to a .txt or .ttx file
        file: PathBuf,
    },

    /// Print each section's text
    Sections {
        /// Path to a .txt or .ttx file
        file: PathBuf,

        /// Emit a JSON array of section line groups
        #[arg(long)]
        json: bool,
    },

    /// Print the page count and per-page line counts
    Pages {
        /// Path to a .txt or .ttx file
        file: PathBuf,
    },

    /// Re-serialize a document as plain or tagged text
    Convert {
        /// Path to a .txt or .ttx file
        file: PathBuf,

        /// Emit tagged text (default: plain values)
        #[arg(long)]
        tagged: bool,

        /// Record separator for the output (default: newline)
        #[arg(long, default_value = "\n")]
        delimiter: String,
    },

    /// Print a JSON summary (title, references, sections, pages)
    Summary {
        /// Path to a .txt or .ttx file
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Refs {
            file,
            json,
            hanging_indent,
            max_delta,
        } => refs(&file, json, hanging_indent, max_delta),
        Command::Title { file } => {
            println!("{}", load(&file)?.title());
            Ok(())
        }
        Command::Sections { file, json } => sections(&file, json),
        Command::Pages { file } => pages(&file),
        Command::Convert {
            file,
            tagged,
            delimiter,
        } => {
            println!("{}", load(&file)?.serialize_with_delimiter(&delimiter, tagged));
            Ok(())
        }
        Command::Summary { file } => {
            let summary = load(&file)?.summary();
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}

fn load(path: &Path) -> anyhow::Result<Document> {
    refstitch_ingest::open(path).with_context(|| format!("failed to open {}", path.display()))
}

fn refs(
    file: &Path,
    json: bool,
    hanging_indent: Option<f64>,
    max_delta: Option<f64>,
) -> anyhow::Result<()> {
    let doc = load(file)?;

    let mut config = JoinConfig::new();
    if let Some(width) = hanging_indent {
        config = config.hanging_indent(width);
    }
    if let Some(delta) = max_delta {
        config = config.max_delta(delta);
    }

    let entries = doc.references_with(&config);
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            println!("{entry}");
        }
    }
    Ok(())
}

fn sections(file: &Path, json: bool) -> anyhow::Result<()> {
    let doc = load(file)?;
    if json {
        let groups: Vec<Vec<&str>> = doc.sections().map(|s| s.values()).collect();
        println!("{}", serde_json::to_string_pretty(&groups)?);
    } else {
        for (idx, section) in doc.sections().enumerate() {
            println!("-- section {idx} ({} lines)", section.len());
            println!("{}", section.text(" "));
        }
    }
    Ok(())
}

fn pages(file: &Path) -> anyhow::Result<()> {
    let doc = load(file)?;
    let pages = doc.pages();
    println!("{} pages", pages.len());
    for page in pages {
        println!("page {}: {} lines", page.index(), page.len());
    }
    Ok(())
}
