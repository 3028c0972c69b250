//! Configuration for paperdb
//!
//! Every setting has a default, so an empty or missing config file is valid.
//! Files are looked up in `./paperdb.toml`, then
//! `<config dir>/paperdb/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PaperDbError, Result};

/// Project-local config file name
pub const LOCAL_CONFIG_FILE: &str = "paperdb.toml";

/// System-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperDbConfig {
    pub library: LibraryConfig,
    pub normalize: NormalizeConfig,
    pub matching: MatchingConfig,
    pub lookup: LookupConfig,
}

/// Where the citation store, PDFs and archive live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Glob naming the BibTeX files that make up the library
    pub bib_files: String,
    /// CSV cache location; derived from the matched bib files when unset
    pub cache_file: Option<PathBuf>,
    /// Directory scanned for `YEAR-AUTHOR-JOURNAL.pdf` files
    pub pdf_dir: PathBuf,
    /// Destination of `paperdb archive`
    pub archive_dir: PathBuf,
    /// Order in which scanned files are reconciled
    pub scan_order: ScanOrder,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            bib_files: "*.bib".to_string(),
            cache_file: None,
            pdf_dir: PathBuf::from("."),
            archive_dir: PathBuf::from("../papers"),
            scan_order: ScanOrder::Descending,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanOrder {
    Ascending,
    #[default]
    Descending,
}

/// Record normalization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Length of the resolver prefix on legacy `uri` values
    pub legacy_uri_prefix_len: usize,
    /// Which URL field wins when `url` and the BibDesk backups disagree
    pub url_preference: UrlPreference,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            legacy_uri_prefix_len: 31,
            url_preference: UrlPreference::Primary,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlPreference {
    /// `url`, then `bdsk-url-1`, then `bdsk-url-2`
    #[default]
    Primary,
    /// `bdsk-url-1`, then `bdsk-url-2`, then `url`
    Backup,
}

/// Matching thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Scores above this are surfaced as candidates
    pub candidate_threshold: f64,
    /// Scores at or above this allow a merge
    pub merge_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            candidate_threshold: crate::scoring::DEFAULT_CANDIDATE_THRESHOLD,
            merge_threshold: crate::scoring::MERGE_THRESHOLD,
        }
    }
}

/// Identifier lookup service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub base_url: String,
    /// Contact address for the Crossref polite pool
    pub mailto: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.crossref.org".to_string(),
            mailto: None,
            timeout_secs: 30,
        }
    }
}

impl PaperDbConfig {
    /// Parse configuration from TOML
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PaperDbError::io(path, e))?;
        Self::from_toml(&content)
    }

    /// Load from the standard locations, falling back to defaults
    pub fn load() -> Result<Self> {
        for path in Self::search_paths() {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "loading config");
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    /// Candidate config files, most specific first
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("paperdb").join("config.toml"));
        }
        paths
    }

    fn validate(&self) -> Result<()> {
        let m = &self.matching;
        for (name, value) in [
            ("candidate_threshold", m.candidate_threshold),
            ("merge_threshold", m.merge_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PaperDbError::Config(format!(
                    "matching.{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}
