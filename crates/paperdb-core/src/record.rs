//! The canonical bibliographic record
//!
//! Every record carries the full set of canonical columns; a missing value is
//! the empty string (or 0 / `false` / empty list for typed columns). Citation
//! fields without a dedicated column (pages, publisher, ...) are kept in
//! `fields` so they survive a load/save cycle.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::author::{extract_first_author, NameMode};

/// A heterogeneous key/value record as produced by the citation codec, the
/// cache reader, the file scanner or a lookup service. Keys are lower case.
pub type RawRecord = BTreeMap<String, String>;

/// Column names as used by the citation store and the cache file
pub mod column {
    pub const CITE_KEY: &str = "citekey";
    pub const ENTRY_TYPE: &str = "entrytype";
    pub const YEAR: &str = "year";
    pub const AUTHOR: &str = "author";
    pub const AUTHOR1: &str = "author1";
    pub const JOURNAL: &str = "journal";
    pub const TITLE: &str = "title";
    pub const VOLUME: &str = "volume";
    pub const DOI: &str = "doi";
    pub const PMID: &str = "pmid";
    pub const PMCID: &str = "pmcid";
    pub const URL: &str = "url";
    pub const LOCAL_URL: &str = "local-url";
    pub const KEYWORDS: &str = "keywords";
    pub const ABSTRACT: &str = "abstract";
    pub const READ: &str = "read";
    pub const HAS_BIB: &str = "has_bib";
    pub const SYNC: &str = "sync";
    pub const EXTRA: &str = "extra";
}

/// Canonical columns in cache order. `author` precedes `author1` so that
/// column-wise updates derive `author1` before it is inspected.
pub const CANONICAL_COLUMNS: [&str; 19] = [
    column::CITE_KEY,
    column::ENTRY_TYPE,
    column::YEAR,
    column::AUTHOR,
    column::AUTHOR1,
    column::JOURNAL,
    column::TITLE,
    column::VOLUME,
    column::DOI,
    column::PMID,
    column::PMCID,
    column::URL,
    column::LOCAL_URL,
    column::KEYWORDS,
    column::ABSTRACT,
    column::READ,
    column::HAS_BIB,
    column::SYNC,
    column::EXTRA,
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub cite_key: String,
    pub entry_type: String,
    /// Publication year; 0 when unknown
    pub year: i32,
    /// Raw author list
    pub author: String,
    /// Surname of the first author, always derived from `author`
    pub author1: String,
    pub journal: String,
    pub title: String,
    pub volume: String,
    pub doi: String,
    pub pmid: String,
    pub pmcid: String,
    pub url: String,
    /// Path of the linked PDF; empty when unlinked
    pub local_url: String,
    pub keywords: Vec<String>,
    pub abstract_text: String,
    pub read: bool,
    pub has_bib: bool,
    pub sync: bool,
    /// Filename disambiguator ("1", "2", ...)
    pub extra: String,
    /// Non-canonical citation fields
    pub fields: BTreeMap<String, String>,
}

impl Record {
    /// Replace the author list and re-derive `author1`
    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
        self.author1 = if self.author.is_empty() {
            String::new()
        } else {
            extract_first_author(&self.author, NameMode::Surname)
        };
    }

    /// Whether this record points at a PDF on disk
    pub fn is_linked(&self) -> bool {
        !self.local_url.is_empty()
    }

    /// Value of a column rendered as text; unknown columns read as empty
    pub fn value(&self, column: &str) -> Cow<'_, str> {
        match column {
            column::CITE_KEY => Cow::Borrowed(&self.cite_key),
            column::ENTRY_TYPE => Cow::Borrowed(&self.entry_type),
            column::YEAR if self.year == 0 => Cow::Borrowed(""),
            column::YEAR => Cow::Owned(self.year.to_string()),
            column::AUTHOR => Cow::Borrowed(&self.author),
            column::AUTHOR1 => Cow::Borrowed(&self.author1),
            column::JOURNAL => Cow::Borrowed(&self.journal),
            column::TITLE => Cow::Borrowed(&self.title),
            column::VOLUME => Cow::Borrowed(&self.volume),
            column::DOI => Cow::Borrowed(&self.doi),
            column::PMID => Cow::Borrowed(&self.pmid),
            column::PMCID => Cow::Borrowed(&self.pmcid),
            column::URL => Cow::Borrowed(&self.url),
            column::LOCAL_URL => Cow::Borrowed(&self.local_url),
            column::KEYWORDS => Cow::Owned(self.keywords.join(", ")),
            column::ABSTRACT => Cow::Borrowed(&self.abstract_text),
            column::READ => Cow::Borrowed(flag_str(self.read)),
            column::HAS_BIB => Cow::Borrowed(flag_str(self.has_bib)),
            column::SYNC => Cow::Borrowed(flag_str(self.sync)),
            column::EXTRA => Cow::Borrowed(&self.extra),
            other => self
                .fields
                .get(other)
                .map(|v| Cow::Borrowed(v.as_str()))
                .unwrap_or(Cow::Borrowed("")),
        }
    }

    /// Set a column from its text form. Setting `author` re-derives `author1`;
    /// `author1` itself only takes a value while `author` is empty.
    pub fn set_value(&mut self, column: &str, value: &str) {
        match column {
            column::CITE_KEY => self.cite_key = value.to_string(),
            column::ENTRY_TYPE => self.entry_type = value.to_ascii_lowercase(),
            column::YEAR => self.year = parse_year(value),
            column::AUTHOR => self.set_author(value),
            column::AUTHOR1 => {
                if self.author.is_empty() {
                    self.author1 = value.to_string();
                }
            }
            column::JOURNAL => self.journal = collapse_whitespace(value),
            column::TITLE => self.title = value.to_string(),
            column::VOLUME => self.volume = value.to_string(),
            column::DOI => self.doi = value.to_string(),
            column::PMID => self.pmid = value.to_string(),
            column::PMCID => self.pmcid = value.to_string(),
            column::URL => self.url = value.to_string(),
            column::LOCAL_URL => self.local_url = value.to_string(),
            column::KEYWORDS => self.keywords = split_keywords(value),
            column::ABSTRACT => self.abstract_text = value.to_string(),
            column::READ => self.read = parse_flag(value),
            column::HAS_BIB => self.has_bib = parse_flag(value),
            column::SYNC => self.sync = parse_flag(value),
            column::EXTRA => self.extra = value.to_string(),
            other if value.is_empty() => {
                self.fields.remove(other);
            }
            other => {
                self.fields.insert(other.to_string(), value.to_string());
            }
        }
    }

    /// Every column this record has a slot for: the canonical set followed by
    /// its extension fields
    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        CANONICAL_COLUMNS
            .iter()
            .copied()
            .chain(self.fields.keys().map(String::as_str))
    }

    /// Project back to a raw key/value record (the inverse of normalization)
    pub fn to_raw(&self) -> RawRecord {
        self.columns()
            .map(|c| (c.to_string(), self.value(c).into_owned()))
            .collect()
    }
}

fn flag_str(flag: bool) -> &'static str {
    if flag {
        "true"
    } else {
        "false"
    }
}

/// `true`/`1`/`yes` (any case) are true; everything else is false
pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "y"
    )
}

/// Leading ASCII digits of the value; 0 when there are none
pub(crate) fn parse_year(value: &str) -> i32 {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Split on `,`/`;`, trim, drop empties and repeats, keep order
pub(crate) fn split_keywords(value: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for keyword in value.split([',', ';']).map(str::trim) {
        if !keyword.is_empty() && !out.iter().any(|k| k == keyword) {
            out.push(keyword.to_string());
        }
    }
    out
}

pub(crate) fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
