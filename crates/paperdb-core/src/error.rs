//! Error types for paperdb-core

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for paperdb operations
pub type Result<T> = std::result::Result<T, PaperDbError>;

/// Main error type for paperdb operations.
///
/// Only conditions that must stop the current operation live here. Skippable
/// problems (unparsable file names, rejected merges, failed lookups) are
/// reported through `tracing` and returned as ordinary values.
#[derive(Error, Debug)]
pub enum PaperDbError {
    /// The citation-store file (or every file a glob names) is missing
    #[error("citation source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("BibTeX error in {path}: {message}")]
    Bibtex { path: PathBuf, message: String },

    #[error("cache error: {0}")]
    Cache(#[from] csv::Error),

    /// The cache file does not carry the expected columns; rebuild it
    #[error("cache schema mismatch in {path}: missing column {column}")]
    CacheSchema { path: PathBuf, column: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid bib file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("record index {index} out of range (store has {len} records)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("PDF error on {path}: {message}")]
    Pdf { path: PathBuf, message: String },

    #[error("lookup error: {0}")]
    Lookup(String),
}

impl PaperDbError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PaperDbError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<toml::de::Error> for PaperDbError {
    fn from(err: toml::de::Error) -> Self {
        PaperDbError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PaperDbError {
    fn from(err: toml::ser::Error) -> Self {
        PaperDbError::Config(err.to_string())
    }
}
