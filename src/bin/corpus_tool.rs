use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use walkdir::WalkDir;

use finkb::chunking::{ChunkOptions, chunk_text};
use finkb::corpus::parse_corpus;

#[derive(Parser)]
#[command(
    name = "corpus-tool",
    about = "Inspect and preview knowledge-base corpus files"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate one corpus file and list its documents.
    Inspect {
        #[arg(long, default_value = "data/knowledge_base.json")]
        file: PathBuf,
    },
    /// Preview the chunks a corpus file would produce at build time.
    Chunks {
        #[arg(long, default_value = "data/knowledge_base.json")]
        file: PathBuf,
        /// Restrict the preview to one document id.
        #[arg(long)]
        doc: Option<String>,
        #[arg(long, default_value_t = 800)]
        max_chars: usize,
        #[arg(long, default_value_t = 120)]
        overlap_chars: usize,
    },
    /// Validate every `.json` corpus file under a directory tree.
    Scan {
        #[arg(long)]
        root: PathBuf,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Inspect { file } => inspect(&file),
        Command::Chunks {
            file,
            doc,
            max_chars,
            overlap_chars,
        } => preview_chunks(&file, doc.as_deref(), max_chars, overlap_chars),
        Command::Scan { root } => scan(&root),
    }
}

fn load_documents(file: &Path) -> Result<Vec<finkb::corpus::Document>> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed to read corpus file at {}", file.display()))?;
    let documents = parse_corpus(&raw, &file.display().to_string())
        .with_context(|| format!("corpus file {} failed validation", file.display()))?;
    Ok(documents)
}

fn inspect(file: &Path) -> Result<()> {
    let documents = load_documents(file)?;
    let mut total_chars = 0usize;
    for document in &documents {
        let chars = document.content.chars().count();
        total_chars += chars;
        println!(
            "{id}  [{tags}]  {chars} chars  {title}",
            id = document.id,
            tags = document.tags.join(", "),
            title = document.title,
        );
    }
    println!("{} documents, {} content chars", documents.len(), total_chars);
    Ok(())
}

fn preview_chunks(
    file: &Path,
    doc: Option<&str>,
    max_chars: usize,
    overlap_chars: usize,
) -> Result<()> {
    if max_chars == 0 {
        bail!("--max-chars must be greater than zero");
    }
    let documents = load_documents(file)?;
    let options = ChunkOptions {
        max_chars,
        overlap_chars,
    };

    let mut matched = false;
    for document in &documents {
        if let Some(wanted) = doc
            && document.id != wanted
        {
            continue;
        }
        matched = true;
        for (ordinal, chunk) in chunk_text(&document.content, &options).iter().enumerate() {
            println!(
                "{id}_{n}  ({chars} chars)  {preview}",
                id = document.id,
                n = ordinal + 1,
                chars = chunk.chars().count(),
                preview = preview(chunk),
            );
        }
    }

    if let Some(wanted) = doc
        && !matched
    {
        bail!("no document with id {wanted:?} in {}", file.display());
    }
    Ok(())
}

fn scan(root: &Path) -> Result<()> {
    let mut scanned = 0usize;
    let mut failures = 0usize;
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| {
            e.file_type().is_file() && e.path().extension().is_some_and(|ext| ext == "json")
        })
    {
        scanned += 1;
        let path = entry.path().to_path_buf();
        match load_documents(&path) {
            Ok(documents) => println!("ok    {}  ({} documents)", path.display(), documents.len()),
            Err(err) => {
                failures += 1;
                println!("fail  {}  ({err:#})", path.display());
            }
        }
    }

    if scanned == 0 {
        bail!("no .json files found under {}", root.display());
    }
    if failures > 0 {
        bail!("{failures} of {scanned} corpus files failed validation");
    }
    println!("{scanned} corpus files validated");
    Ok(())
}

fn preview(chunk: &str) -> String {
    let flat: String = chunk
        .chars()
        .map(|c| if c == '\n' { ' ' } else { c })
        .take(60)
        .collect();
    if chunk.chars().count() > 60 {
        format!("{flat}...")
    } else {
        flat
    }
}
