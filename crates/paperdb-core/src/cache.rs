//! Flat CSV cache of the record store
//!
//! The first column is the row index, followed by the canonical columns and
//! then every extension field any record carries. The cache is always
//! re-derivable from the citation files, so a schema mismatch is reported as
//! [`PaperDbError::CacheSchema`] and resolved by a rebuild, never migrated.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::info;

use crate::error::{PaperDbError, Result};
use crate::normalize::normalize;
use crate::record::{RawRecord, Record, CANONICAL_COLUMNS};

/// Name of the leading row-index column
pub const INDEX_COLUMN: &str = "index";

/// Write `records` to `path`, replacing any existing file
pub fn write_cache(path: &Path, records: &[Record]) -> Result<()> {
    let extension: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.fields.keys().map(String::as_str))
        .collect();

    let columns: Vec<&str> = CANONICAL_COLUMNS
        .iter()
        .copied()
        .chain(extension.iter().copied())
        .collect();

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(std::iter::once(INDEX_COLUMN).chain(columns.iter().copied()))?;

    for (index, record) in records.iter().enumerate() {
        let mut row = vec![index.to_string()];
        row.extend(columns.iter().map(|c| record.value(c).into_owned()));
        writer.write_record(&row)?;
    }
    writer.flush().map_err(|e| PaperDbError::io(path, e))?;

    info!(path = %path.display(), records = records.len(), "wrote cache");
    Ok(())
}

/// Read the raw rows of a cache file, in file order
pub fn read_cache_raw(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();

    for required in std::iter::once(INDEX_COLUMN).chain(CANONICAL_COLUMNS) {
        if !headers.iter().any(|h| h == required) {
            return Err(PaperDbError::CacheSchema {
                path: path.to_path_buf(),
                column: required.to_string(),
            });
        }
    }

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row?;
        let raw: RawRecord = headers
            .iter()
            .zip(row.iter())
            .filter(|(h, _)| h.as_str() != INDEX_COLUMN)
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(raw);
    }
    Ok(rows)
}

/// Read and normalize a cache file
pub fn read_cache(path: &Path) -> Result<Vec<Record>> {
    let records: Vec<Record> = read_cache_raw(path)?.iter().map(normalize).collect();
    info!(path = %path.display(), records = records.len(), "read cache");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Record> {
        let mut a = Record {
            year: 2019,
            journal: "Nature Physics".into(),
            title: "Quoted, \"comma\" title".into(),
            keywords: vec!["optics".into(), "lasers".into()],
            read: true,
            entry_type: "article".into(),
            ..Default::default()
        };
        a.set_author("Smith, John and Doe, Jane");
        a.fields.insert("pages".into(), "1--10".into());

        let mut b = Record {
            year: 2020,
            local_url: "2020-Lee-Science.pdf".into(),
            sync: true,
            entry_type: "misc".into(),
            ..Default::default()
        };
        b.set_author("Lee");
        vec![a, b]
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.csv");
        let records = sample();

        write_cache(&path, &records).unwrap();
        let loaded = read_cache(&path).unwrap();

        assert_eq!(loaded, records);
    }

    #[test]
    fn test_header_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.csv");
        write_cache(&path, &sample()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("index,citekey,entrytype,year,author,author1"));
        assert!(header.ends_with(",pages"));
    }

    #[test]
    fn test_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.csv");
        std::fs::write(&path, "index,year,author\n0,2019,Smith\n").unwrap();

        let err = read_cache(&path).unwrap_err();
        assert!(matches!(err, PaperDbError::CacheSchema { ref column, .. } if column == "citekey"));
    }

    #[test]
    fn test_missing_file_is_cache_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_cache(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, PaperDbError::Cache(_)));
    }
}
