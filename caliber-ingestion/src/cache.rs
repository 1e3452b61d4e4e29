//! On-disk ingestion cache (C9, spec.md §4.8, §6 "Cache file format"),
//! grounded on `original_source/src/guard/utils/extraction.py`'s
//! `PolicyAgent.extract`: if `<path>.cache.json` exists it is used
//! verbatim and extraction is skipped entirely.

use caliber_core::IngestionError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One extracted policy record: `[name, description, keywords, default]`
/// per predicate, plus the rule's combined logic and description
/// (spec.md §6). A tuple struct serializes as a 4-element JSON array,
/// matching the cache file format exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateRecord(pub String, pub String, pub Vec<String>, pub bool);

impl PredicateRecord {
    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn description(&self) -> &str {
        &self.1
    }

    pub fn keywords(&self) -> &[String] {
        &self.2
    }

    pub fn default_value(&self) -> bool {
        self.3
    }
}

/// One `{predicates, logic, description}` record produced by the
/// ingestion pipeline's final stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionRecord {
    pub predicates: Vec<PredicateRecord>,
    pub logic: String,
    pub description: String,
}

fn cache_path(document_path: &Path) -> PathBuf {
    let mut s = document_path.as_os_str().to_os_string();
    s.push(".cache.json");
    PathBuf::from(s)
}

/// Load `<document_path>.cache.json` if it exists. Returns `Ok(None)`
/// when there is no cache file (the caller should run the pipeline);
/// an existing-but-unreadable cache file is an error rather than a
/// silent cache miss, since a corrupt cache usually means a prior write
/// was interrupted and the operator should know.
pub fn load_cache(document_path: &Path) -> Result<Option<Vec<IngestionRecord>>, IngestionError> {
    let path = cache_path(document_path);
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path).map_err(|e| IngestionError::CacheFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let records: Vec<IngestionRecord> =
        serde_json::from_str(&text).map_err(|e| IngestionError::CacheFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    Ok(Some(records))
}

/// Write the final extracted records to `<document_path>.cache.json`,
/// pretty-printed with a 4-space indent (spec.md §6: "Indent 4").
pub fn write_cache(document_path: &Path, records: &[IngestionRecord]) -> Result<(), IngestionError> {
    let path = cache_path(document_path);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    serde::Serialize::serialize(records, &mut serializer).map_err(|e| IngestionError::CacheFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    std::fs::write(&path, buf).map_err(|e| IngestionError::CacheFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> IngestionRecord {
        IngestionRecord {
            predicates: vec![PredicateRecord(
                "share_external".to_string(),
                "the agent is sharing data externally".to_string(),
                vec!["share".to_string(), "external".to_string()],
                false,
            )],
            logic: "share_external IMPLIES is_authorized".to_string(),
            description: "no unauthorized external sharing".to_string(),
        }
    }

    #[test]
    fn missing_cache_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("policy.md");
        assert!(load_cache(&doc_path).unwrap().is_none());
    }

    #[test]
    fn write_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("policy.md");
        let records = vec![sample_record()];
        write_cache(&doc_path, &records).unwrap();
        let loaded = load_cache(&doc_path).unwrap().unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn cache_file_uses_a_four_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("policy.md");
        write_cache(&doc_path, &[sample_record()]).unwrap();
        let text = std::fs::read_to_string(cache_path(&doc_path)).unwrap();
        assert!(text.contains("\n    {"));
    }
}
