use crate::index::KnowledgeDocument;
use crate::record::{RawUniversity, UniversityRecord};
use anyhow::Result;
use bincode;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_records: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn catalog(&self) -> PathBuf { self.root.join("catalog.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    pub fn knowledge(&self) -> PathBuf { self.root.join("knowledge.json") }
}

pub fn save_catalog(paths: &IndexPaths, records: &[UniversityRecord]) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.catalog())?;
    let bytes = bincode::serialize(records)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_catalog(paths: &IndexPaths) -> Result<Vec<UniversityRecord>> {
    let mut f = File::open(paths.catalog())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let records = bincode::deserialize(&buf)?;
    Ok(records)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

pub fn save_knowledge(paths: &IndexPaths, docs: &[KnowledgeDocument]) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.knowledge())?;
    let json = serde_json::to_string_pretty(docs)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

/// `None` when the snapshot carries no corpus of its own.
pub fn load_knowledge(paths: &IndexPaths) -> Result<Option<Vec<KnowledgeDocument>>> {
    let path = paths.knowledge();
    if !path.exists() {
        return Ok(None);
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(Some(serde_json::from_reader(reader)?))
}

/// Read raw records from a `.jsonl` file (one object per line) or a `.json`
/// file holding an array or a single object. Entries that do not decode are
/// skipped with a warning; only I/O and whole-file syntax errors fail.
pub fn read_raw_records(file: &Path) -> Result<Vec<RawUniversity>> {
    let reader = BufReader::new(File::open(file)?);
    if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        let mut out = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            match serde_json::from_str(&line) {
                Ok(raw) => out.push(raw),
                Err(e) => tracing::warn!(file = %file.display(), line = line_no + 1, error = %e, "skipping malformed record"),
            }
        }
        return Ok(out);
    }
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    let entries = match json {
        serde_json::Value::Array(arr) => arr,
        serde_json::Value::Object(_) => vec![json],
        _ => Vec::new(),
    };
    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, v)| match serde_json::from_value(v) {
            Ok(raw) => Some(raw),
            Err(e) => {
                tracing::warn!(file = %file.display(), index, error = %e, "skipping malformed record");
                None
            }
        })
        .collect())
}

/// Normalize raw records, numbering id-less ones from `first_ordinal`.
pub fn normalize_all(raw: Vec<RawUniversity>, first_ordinal: usize) -> Vec<UniversityRecord> {
    raw.into_iter()
        .enumerate()
        .map(|(i, r)| UniversityRecord::from_raw(r, first_ordinal + i))
        .collect()
}
