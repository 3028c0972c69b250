//! PDF file-name convention: `YEAR-AUTHOR-JOURNAL[-N].pdf`
//!
//! Segments are hyphen-delimited. Underscores inside the author token stand
//! for hyphens (`Smith_John` is the author token `Smith-John`); underscores
//! inside the journal stand for spaces. A trailing single-digit segment after
//! the journal disambiguates files sharing year, author and journal.

use std::path::{Component, Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{PaperDbError, Result};
use crate::normalize::normalize;
use crate::record::{column, RawRecord, Record};
use crate::sources::PdfMetadataSource;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).unwrap();
    static ref MULTIPLE_SPACES: Regex = Regex::new(r"\s+").unwrap();
    static ref MULTIPLE_UNDERSCORES: Regex = Regex::new(r"_+").unwrap();
    static ref DISAMBIGUATOR: Regex = Regex::new(r"^[0-9]$").unwrap();
    static ref YEAR: Regex = Regex::new(r"^[0-9]{1,4}$").unwrap();
}

/// Metadata carried by a conforming file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub path: PathBuf,
    pub year: i32,
    /// Author token with underscores turned into hyphens
    pub author1: String,
    pub journal: String,
    pub extra: String,
}

impl FileMetadata {
    /// Path as stored in `local-url`
    pub fn local_url(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Raw record for the normalizer. The author token doubles as the author
    /// list so that `author1` derives back to it.
    pub fn to_raw(&self) -> RawRecord {
        let mut raw = RawRecord::new();
        raw.insert(column::LOCAL_URL.into(), self.local_url());
        raw.insert(column::YEAR.into(), self.year.to_string());
        raw.insert(column::AUTHOR.into(), self.author1.clone());
        raw.insert(column::JOURNAL.into(), self.journal.clone());
        raw.insert(column::EXTRA.into(), self.extra.clone());
        raw.insert(column::SYNC.into(), "false".into());
        raw
    }

    pub fn to_record(&self) -> Record {
        normalize(&self.to_raw())
    }
}

/// Result of scanning a directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileScan {
    pub files: Vec<FileMetadata>,
    /// PDFs whose names do not follow the convention
    pub rejected: Vec<PathBuf>,
}

/// Parse a file name; `None` when it does not follow the convention
pub fn parse_filename(path: &Path) -> Option<FileMetadata> {
    let stem = path.file_stem()?.to_str()?;
    let segments: Vec<&str> = stem.split('-').collect();
    if segments.len() < 3 {
        return None;
    }

    let year_token = segments[0].trim();
    if !YEAR.is_match(year_token) {
        return None;
    }
    let year: i32 = year_token.parse().ok()?;

    let (journal_segments, extra) = match segments.split_last() {
        Some((last, _)) if segments.len() > 3 && DISAMBIGUATOR.is_match(last) => {
            (&segments[2..segments.len() - 1], last.to_string())
        }
        _ => (&segments[2..], String::new()),
    };

    let author1 = segments[1].trim().replace('_', "-");
    let journal = journal_segments
        .join("-")
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if author1.is_empty() || journal.is_empty() {
        return None;
    }

    Some(FileMetadata {
        path: path.to_path_buf(),
        year,
        author1,
        journal,
        extra,
    })
}

/// Parse every `*.pdf` in `dir` (not recursive), sorted by path.
///
/// Paths drop `.` components, so `./papers` and `papers` yield the same
/// `local-url` and files in `.` are reported by bare file name.
pub fn scan_directory(dir: &Path) -> Result<FileScan> {
    let entries = std::fs::read_dir(dir).map_err(|e| PaperDbError::io(dir, e))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PaperDbError::io(dir, e))?;
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf || !path.is_file() {
            continue;
        }
        paths.push(without_cur_dir(&path));
    }
    paths.sort();

    let mut scan = FileScan::default();
    for path in paths {
        match parse_filename(&path) {
            Some(meta) => scan.files.push(meta),
            None => {
                warn!(path = %path.display(), "file name does not match YEAR-AUTHOR-JOURNAL.pdf");
                scan.rejected.push(path);
            }
        }
    }
    debug!(
        dir = %dir.display(),
        parsed = scan.files.len(),
        rejected = scan.rejected.len(),
        "scanned pdf directory"
    );
    Ok(scan)
}

/// Conventional file name for a record
pub fn suggest_filename(record: &Record) -> String {
    let year = if record.year > 0 {
        format!("{:04}", record.year)
    } else {
        "0000".to_string()
    };
    let author = token_or_unknown(&sanitize_component(&record.author1));
    let journal = token_or_unknown(&sanitize_component(&record.journal));

    let mut name = format!("{year}-{author}-{journal}");
    if DISAMBIGUATOR.is_match(&record.extra) {
        name.push('-');
        name.push_str(&record.extra);
    }
    name.push_str(".pdf");
    name
}

/// Fill `doi`, `title`, `keywords` and `abstract` of scanned records from the
/// PDF collaborator. Returns how many records gained data. Failures are
/// logged and the record is left as it was.
pub fn enrich_file_records(records: &mut [Record], source: &dyn PdfMetadataSource) -> usize {
    let mut enriched = 0;
    for record in records.iter_mut().filter(|r| r.is_linked()) {
        let path = PathBuf::from(&record.local_url);
        let before = record.clone();

        match source.get_bibliography(&path) {
            Ok(Some(raw)) => {
                let found = normalize(&raw);
                for col in [column::DOI, column::TITLE, column::KEYWORDS, column::ABSTRACT] {
                    if record.value(col).is_empty() {
                        record.set_value(col, &found.value(col));
                    }
                }
            }
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "could not read pdf bibliography"),
        }

        if record.doi.is_empty() {
            match source.get_identifier(&path) {
                Ok(Some(doi)) => record.doi = crate::normalize::normalize_doi(&doi),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "could not read pdf identifier"),
            }
        }
        if record.keywords.is_empty() {
            match source.get_keywords(&path) {
                Ok(keywords) => record.keywords = keywords,
                Err(e) => warn!(path = %path.display(), error = %e, "could not read pdf keywords"),
            }
        }

        if *record != before {
            enriched += 1;
        }
    }
    enriched
}

fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn sanitize_component(input: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(input, "");
    let normalized = MULTIPLE_SPACES.replace_all(&cleaned, " ");

    // hyphens delimit segments, so they cannot appear inside one
    let result: String = normalized
        .trim()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();

    MULTIPLE_UNDERSCORES
        .replace_all(&result, "_")
        .trim_matches('_')
        .to_string()
}

fn token_or_unknown(token: &str) -> String {
    if token.is_empty() {
        "Unknown".to_string()
    } else {
        token.to_string()
    }
}
