//! Record normalization
//!
//! Turns a heterogeneous [`RawRecord`] (BibTeX entry, cache row, file-name
//! parse, lookup result) into a canonical [`Record`]. Normalizing an already
//! normalized record's raw projection yields the same record.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::{NormalizeConfig, UrlPreference};
use crate::record::{
    collapse_whitespace, column, parse_flag, parse_year, split_keywords, RawRecord, Record,
    CANONICAL_COLUMNS,
};

/// Legacy combined-identifier field (resolver URL wrapped around the DOI)
pub const LEGACY_URI_FIELD: &str = "uri";

/// BibDesk backup URL fields, in field order
pub const BACKUP_URL_FIELDS: [&str; 2] = ["bdsk-url-1", "bdsk-url-2"];

/// Prefixes stripped from DOI values
pub const DOI_RESOLVER_PREFIXES: [&str; 6] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi.org/",
    "doi:",
];

/// Columns that exist only in the cache and are never treated as fields
const CACHE_ONLY_COLUMNS: [&str; 1] = ["index"];

/// Sentinels some exporters write for a missing value
const MISSING_SENTINELS: [&str; 2] = ["nan", "NaN"];

/// Normalizes raw records according to a [`NormalizeConfig`]
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizeConfig,
}

impl Normalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        Self { config }
    }

    /// Produce the canonical record for `raw`
    pub fn normalize(&self, raw: &RawRecord) -> Record {
        let mut fields: BTreeMap<String, String> = raw
            .iter()
            .map(|(k, v)| {
                let v = v.trim();
                let v = if is_sentinel(v) { "" } else { v };
                (k.trim().to_ascii_lowercase(), v.to_string())
            })
            .collect();

        if let Some(uri) = fields.remove(LEGACY_URI_FIELD) {
            if !fields.contains_key(column::DOI) {
                let doi = strip_legacy_prefix(&uri, self.config.legacy_uri_prefix_len);
                fields.insert(column::DOI.to_string(), doi);
            }
        }

        let url = self.reconcile_urls(&mut fields);
        fields.retain(|k, _| !is_transient(k));

        let mut take = |name: &str| fields.remove(name).unwrap_or_default();

        let mut record = Record {
            cite_key: take(column::CITE_KEY),
            entry_type: take(column::ENTRY_TYPE).to_ascii_lowercase(),
            year: parse_year(&take(column::YEAR)),
            journal: collapse_whitespace(&take(column::JOURNAL)),
            title: take(column::TITLE),
            volume: take(column::VOLUME),
            doi: blank_sentinel(normalize_doi(&take(column::DOI))),
            pmid: coerce_identifier(&take(column::PMID)),
            pmcid: coerce_identifier(&take(column::PMCID)),
            url,
            local_url: take(column::LOCAL_URL),
            keywords: split_keywords(&take(column::KEYWORDS))
                .into_iter()
                .filter(|k| !is_sentinel(k))
                .collect(),
            abstract_text: take(column::ABSTRACT),
            read: parse_flag(&take(column::READ)),
            has_bib: parse_flag(&take(column::HAS_BIB)),
            sync: parse_flag(&take(column::SYNC)),
            extra: take(column::EXTRA),
            ..Default::default()
        };
        if record.entry_type.is_empty() {
            record.entry_type = "article".to_string();
        }
        record.set_author(take(column::AUTHOR));

        // author1 is always derived; url was reconciled above
        fields.retain(|k, v| {
            !v.is_empty()
                && !CANONICAL_COLUMNS.contains(&k.as_str())
                && !CACHE_ONLY_COLUMNS.contains(&k.as_str())
        });
        record.fields = fields;

        record
    }

    /// Normalize a batch and put it in browsing order
    pub fn normalize_all<'a>(&self, raws: impl IntoIterator<Item = &'a RawRecord>) -> Vec<Record> {
        let mut records: Vec<Record> = raws.into_iter().map(|r| self.normalize(r)).collect();
        sort_records(&mut records);
        records
    }

    /// Collapse `url` and the backup URL fields into one value
    fn reconcile_urls(&self, fields: &mut BTreeMap<String, String>) -> String {
        let primary = fields.remove(column::URL).unwrap_or_default();
        let backups: Vec<String> = BACKUP_URL_FIELDS
            .iter()
            .map(|k| fields.remove(*k).unwrap_or_default())
            .collect();

        let ordered: Vec<&String> = match self.config.url_preference {
            UrlPreference::Primary => std::iter::once(&primary).chain(backups.iter()).collect(),
            UrlPreference::Backup => backups.iter().chain(std::iter::once(&primary)).collect(),
        };

        let mut distinct: Vec<&String> = Vec::new();
        for value in ordered.into_iter().filter(|v| !v.is_empty()) {
            if !distinct.contains(&value) {
                distinct.push(value);
            }
        }
        if distinct.len() > 1 {
            debug!(kept = %distinct[0], dropped = distinct.len() - 1, "url fields disagree");
        }

        distinct.first().map(|v| v.to_string()).unwrap_or_default()
    }
}

/// Normalize with the default configuration
pub fn normalize(raw: &RawRecord) -> Record {
    Normalizer::default().normalize(raw)
}

/// Sort by (`year`, `author1`), stable
pub fn sort_records(records: &mut [Record]) {
    records.sort_by(|a, b| (a.year, &a.author1).cmp(&(b.year, &b.author1)));
}

/// Strip resolver URL prefixes (repeatedly) from a DOI
pub fn normalize_doi(doi: &str) -> String {
    let mut doi = doi.trim();
    while let Some(rest) = DOI_RESOLVER_PREFIXES
        .iter()
        .find_map(|p| strip_prefix_ignore_case(doi, p))
    {
        doi = rest.trim_start();
    }
    doi.to_string()
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

/// `uri[prefix_len .. len-1]`, character based; empty when too short
fn strip_legacy_prefix(uri: &str, prefix_len: usize) -> String {
    let chars: Vec<char> = uri.chars().collect();
    if chars.len() <= prefix_len + 1 {
        return String::new();
    }
    chars[prefix_len..chars.len() - 1].iter().collect()
}

/// Numeric identifiers sometimes come back from spreadsheets as `123.0`
fn coerce_identifier(value: &str) -> String {
    match value.strip_suffix(".0") {
        Some(int) if !int.is_empty() && int.chars().all(|c| c.is_ascii_digit()) => int.to_string(),
        _ => value.to_string(),
    }
}

fn is_sentinel(value: &str) -> bool {
    MISSING_SENTINELS.contains(&value)
}

/// Derived values (a stripped DOI, a split keyword) can expose a sentinel
fn blank_sentinel(value: String) -> String {
    if is_sentinel(&value) {
        String::new()
    } else {
        value
    }
}

fn is_transient(key: &str) -> bool {
    key.starts_with("bdsk-url-") || key.starts_with("bdsk-file-") || key == "file" || key == "score"
}
