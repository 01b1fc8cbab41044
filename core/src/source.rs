//! Where the catalog comes from.

use crate::persist::{load_catalog, normalize_all, read_raw_records, IndexPaths};
use crate::record::UniversityRecord;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("university not found: {0}")]
    NotFound(String),
    #[error("source returned no universities")]
    Empty,
    #[error("source unavailable: {0:#}")]
    Unavailable(anyhow::Error),
}

/// Fetch-all / fetch-by-id access to university records.
pub trait DataSource: Send + Sync {
    fn name(&self) -> &str;

    fn get_all(&self) -> Result<Vec<UniversityRecord>, SourceError>;

    fn get_by_id(&self, id: &str) -> Result<UniversityRecord, SourceError> {
        self.get_all()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }
}

/// Which source ended up serving the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceStrategy {
    Primary,
    Fallback,
}

/// Try `primary`; if it fails or is empty, try `fallback`.
pub fn load_with_fallback(
    primary: &dyn DataSource,
    fallback: Option<&dyn DataSource>,
) -> Result<(Vec<UniversityRecord>, DataSourceStrategy), SourceError> {
    let primary_err = match primary.get_all() {
        Ok(records) if !records.is_empty() => {
            tracing::info!(source = primary.name(), count = records.len(), "catalog loaded");
            return Ok((records, DataSourceStrategy::Primary));
        }
        Ok(_) => SourceError::Empty,
        Err(e) => e,
    };
    let Some(fallback) = fallback else {
        return Err(primary_err);
    };
    tracing::warn!(source = primary.name(), error = %primary_err, fallback = fallback.name(), "primary source failed, falling back");
    match fallback.get_all() {
        Ok(records) if !records.is_empty() => {
            tracing::info!(source = fallback.name(), count = records.len(), "catalog loaded");
            Ok((records, DataSourceStrategy::Fallback))
        }
        Ok(_) => Err(SourceError::Empty),
        Err(e) => Err(e),
    }
}

/// Binary snapshot written by the indexer.
pub struct SnapshotSource {
    paths: IndexPaths,
}

impl SnapshotSource {
    pub fn new(paths: IndexPaths) -> Self {
        Self { paths }
    }
}

impl DataSource for SnapshotSource {
    fn name(&self) -> &str { "snapshot" }

    fn get_all(&self) -> Result<Vec<UniversityRecord>, SourceError> {
        load_catalog(&self.paths).map_err(SourceError::Unavailable)
    }
}

/// Raw JSON or JSONL dump, normalized on every read.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataSource for JsonFileSource {
    fn name(&self) -> &str { "json" }

    fn get_all(&self) -> Result<Vec<UniversityRecord>, SourceError> {
        let raw = read_raw_records(&self.path).map_err(SourceError::Unavailable)?;
        Ok(normalize_all(raw, 0))
    }
}

#[derive(Default)]
pub struct InMemorySource {
    records: Vec<UniversityRecord>,
}

impl InMemorySource {
    pub fn new(records: Vec<UniversityRecord>) -> Self {
        Self { records }
    }
}

impl DataSource for InMemorySource {
    fn name(&self) -> &str { "memory" }

    fn get_all(&self) -> Result<Vec<UniversityRecord>, SourceError> {
        Ok(self.records.clone())
    }

    fn get_by_id(&self, id: &str) -> Result<UniversityRecord, SourceError> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawUniversity;

    fn one(name: &str) -> Vec<UniversityRecord> {
        let raw = RawUniversity { id: Some(name.to_lowercase()), name: Some(name.into()), ..Default::default() };
        vec![UniversityRecord::from_raw(raw, 0)]
    }

    #[test]
    fn primary_wins_when_populated() {
        let primary = InMemorySource::new(one("P"));
        let fallback = InMemorySource::new(one("F"));
        let (records, strategy) = load_with_fallback(&primary, Some(&fallback)).unwrap();
        assert_eq!(strategy, DataSourceStrategy::Primary);
        assert_eq!(records[0].name, "P");
    }

    #[test]
    fn empty_or_broken_primary_falls_back() {
        let fallback = InMemorySource::new(one("F"));
        let (_, strategy) = load_with_fallback(&InMemorySource::default(), Some(&fallback)).unwrap();
        assert_eq!(strategy, DataSourceStrategy::Fallback);

        let missing = JsonFileSource::new("/nonexistent/universities.json");
        let (records, strategy) = load_with_fallback(&missing, Some(&fallback)).unwrap();
        assert_eq!(strategy, DataSourceStrategy::Fallback);
        assert_eq!(records[0].id, "f");
    }

    #[test]
    fn both_empty_is_an_error() {
        let err = load_with_fallback(&InMemorySource::default(), Some(&InMemorySource::default())).unwrap_err();
        assert!(matches!(err, SourceError::Empty));
        let err = load_with_fallback(&InMemorySource::default(), None).unwrap_err();
        assert!(matches!(err, SourceError::Empty));
    }

    #[test]
    fn get_by_id_reports_missing() {
        let source = InMemorySource::new(one("P"));
        assert_eq!(source.get_by_id("p").unwrap().name, "P");
        assert!(matches!(source.get_by_id("q"), Err(SourceError::NotFound(id)) if id == "q"));
    }
}
