//! Bridge between BibTeX files and records

use std::collections::HashSet;
use std::path::Path;

use paperdb_bibtex::{format_entries, parse, BibEntry, EntryType};
use tracing::{debug, warn};

use crate::error::{PaperDbError, Result};
use crate::record::{column, RawRecord, Record};

/// Columns that are bookkeeping only and never written to a citation file
const NON_CITATION_COLUMNS: [&str; 7] = [
    column::CITE_KEY,
    column::ENTRY_TYPE,
    column::AUTHOR1,
    column::READ,
    column::HAS_BIB,
    column::SYNC,
    column::EXTRA,
];

/// Flatten a parsed entry into a raw record
pub fn entry_to_raw(entry: &BibEntry) -> RawRecord {
    let mut raw: RawRecord = entry
        .normalized_fields()
        .map(|(k, v)| (k, v.to_string()))
        .collect();
    raw.insert(column::CITE_KEY.to_string(), entry.cite_key.clone());
    raw.insert(column::ENTRY_TYPE.to_string(), entry.entry_type.to_string());
    raw
}

/// Parse a BibTeX file into raw records flagged `has_bib`
pub fn read_bib(path: &Path) -> Result<Vec<RawRecord>> {
    if !path.is_file() {
        return Err(PaperDbError::SourceNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|e| PaperDbError::io(path, e))?;
    let result = parse(&text);

    if result.entries.is_empty() {
        if let Some(first) = result.warnings.first() {
            return Err(PaperDbError::Bibtex {
                path: path.to_path_buf(),
                message: format!("line {}: {}", first.line, first.message),
            });
        }
    }
    for w in &result.warnings {
        warn!(path = %path.display(), line = w.line, "{}", w.message);
    }
    debug!(path = %path.display(), entries = result.entries.len(), "parsed bib file");

    Ok(result
        .entries
        .iter()
        .map(|entry| {
            let mut raw = entry_to_raw(entry);
            raw.insert(column::HAS_BIB.to_string(), "true".to_string());
            raw
        })
        .collect())
}

/// Build a BibTeX entry from a record. Empty and bookkeeping columns are
/// left out; an empty cite key stays empty.
pub fn record_to_entry(record: &Record) -> BibEntry {
    let entry_type = if record.entry_type.is_empty() {
        EntryType::Article
    } else {
        EntryType::parse(&record.entry_type)
    };
    let mut entry = BibEntry::new(record.cite_key.clone(), entry_type);
    for col in record.columns() {
        if NON_CITATION_COLUMNS.contains(&col) {
            continue;
        }
        let value = record.value(col);
        if !value.is_empty() {
            entry.set_field(col, value.into_owned());
        }
    }
    entry
}

/// Cite key in the `<Author1><year>` style, made unique against `taken`
pub fn generate_cite_key(record: &Record, taken: &HashSet<String>) -> String {
    let author: String = record
        .author1
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();
    let base = match (author.is_empty(), record.year) {
        (true, 0) => "anon".to_string(),
        (true, y) => format!("anon{y}"),
        (false, 0) => author,
        (false, y) => format!("{author}{y}"),
    };

    if !taken.contains(&base) {
        return base;
    }
    ('a'..='z')
        .map(|suffix| format!("{base}{suffix}"))
        .chain((2..).map(|n| format!("{base}_{n}")))
        .find(|key| !taken.contains(key))
        .unwrap_or_else(|| base.clone())
}

/// Render records as BibTeX, generating missing cite keys
pub fn records_to_bibtex(records: &[Record]) -> String {
    let mut taken: HashSet<String> = records
        .iter()
        .filter(|r| !r.cite_key.is_empty())
        .map(|r| r.cite_key.clone())
        .collect();

    let entries: Vec<BibEntry> = records
        .iter()
        .map(|r| {
            let mut entry = record_to_entry(r);
            if entry.cite_key.is_empty() {
                entry.cite_key = generate_cite_key(r, &taken);
                taken.insert(entry.cite_key.clone());
            }
            entry
        })
        .collect();

    format_entries(&entries)
}

/// Write records to a BibTeX file
pub fn write_bib(path: &Path, records: &[Record]) -> Result<()> {
    std::fs::write(path, records_to_bibtex(records)).map_err(|e| PaperDbError::io(path, e))?;
    debug!(path = %path.display(), entries = records.len(), "wrote bib file");
    Ok(())
}
