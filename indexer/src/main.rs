use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing_subscriber::{fmt, EnvFilter};
use unicore::catalog::FacetOptions;
use unicore::persist::{
    load_catalog, load_meta, normalize_all, read_raw_records, save_catalog, save_knowledge, save_meta, IndexPaths,
    MetaFile, SNAPSHOT_VERSION,
};
use unicore::{KnowledgeBase, KnowledgeDocument, UniversityRecord};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and inspect university catalog snapshots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize raw university records into a catalog snapshot
    Build {
        /// Input path (file or directory of .json/.jsonl files)
        #[arg(long)]
        input: String,
        /// Output snapshot directory
        #[arg(long)]
        output: String,
    },
    /// Store a knowledge corpus (JSON array of {title, content}) next to a snapshot
    Kb {
        #[arg(long)]
        input: String,
        #[arg(long)]
        output: String,
    },
    /// Print the facet values present in a snapshot
    Facets {
        #[arg(long)]
        index: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build_catalog(&input, &output),
        Commands::Kb { input, output } => store_knowledge(&input, &output),
        Commands::Facets { index } => print_facets(&index),
    }
}

fn input_files(input_path: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    }
    files
}

fn build_catalog(input: &str, output: &str) -> Result<()> {
    let files = input_files(Path::new(input));
    if files.is_empty() {
        bail!("no .json or .jsonl files found at {input}");
    }

    let mut records: Vec<UniversityRecord> = Vec::new();
    for file in &files {
        let raw = read_raw_records(file).with_context(|| format!("reading {}", file.display()))?;
        tracing::info!(file = %file.display(), count = raw.len(), "read raw records");
        let first_ordinal = records.len();
        records.extend(normalize_all(raw, first_ordinal));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for r in &records {
        if !seen.insert(r.id.as_str()) {
            tracing::warn!(id = %r.id, name = %r.name, "duplicate university id");
        }
    }
    let undated = records.iter().filter(|r| r.deadline.is_some() && r.deadline_date.is_none()).count();
    let open = records.iter().filter(|r| r.admission_open).count();
    tracing::info!(num_records = records.len(), open, undated, "normalized catalog");

    let paths = IndexPaths::new(output);
    save_catalog(&paths, &records)?;
    let meta = MetaFile {
        num_records: records.len() as u32,
        created_at: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| "".into()),
        version: SNAPSHOT_VERSION,
    };
    save_meta(&paths, &meta)?;

    tracing::info!(output, "snapshot build complete");
    Ok(())
}

fn store_knowledge(input: &str, output: &str) -> Result<()> {
    let reader = BufReader::new(File::open(input).with_context(|| format!("opening {input}"))?);
    let docs: Vec<KnowledgeDocument> = serde_json::from_reader(reader)?;
    if docs.is_empty() {
        bail!("knowledge corpus at {input} is empty");
    }
    let kb = KnowledgeBase::new(docs);
    tracing::info!(num_docs = kb.docs().len(), num_terms = kb.index().num_terms(), "knowledge corpus indexed");

    save_knowledge(&IndexPaths::new(output), kb.docs())?;
    tracing::info!(output, "knowledge corpus stored");
    Ok(())
}

#[derive(Serialize)]
struct FacetReport {
    num_records: usize,
    created_at: String,
    facets: FacetOptions,
}

fn print_facets(index: &str) -> Result<()> {
    let paths = IndexPaths::new(index);
    let meta = load_meta(&paths).with_context(|| format!("reading snapshot metadata in {index}"))?;
    if meta.version != SNAPSHOT_VERSION {
        tracing::warn!(found = meta.version, expected = SNAPSHOT_VERSION, "snapshot version mismatch");
    }
    let records = load_catalog(&paths)?;
    let report = FacetReport {
        num_records: records.len(),
        created_at: meta.created_at,
        facets: FacetOptions::collect(&records),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
