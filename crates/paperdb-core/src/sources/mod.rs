//! External metadata collaborators
//!
//! The reconciliation engine only talks to these traits. Production
//! implementations read PDFs through pdfium (`pdf` feature) and resolve DOIs
//! against Crossref (`crossref` feature); tests substitute doubles.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Result;
use crate::record::RawRecord;

#[cfg(feature = "crossref")]
mod crossref;
#[cfg(feature = "pdf")]
mod pdf;

#[cfg(feature = "crossref")]
pub use crossref::CrossrefLookup;
#[cfg(feature = "pdf")]
pub use pdf::PdfiumSource;

lazy_static! {
    static ref DOI_PATTERN: Regex = Regex::new(r"\b(10\.\d{4,9}/[-._;()/:A-Za-z0-9]+)").unwrap();
}

/// Bibliographic data read from a PDF file
pub trait PdfMetadataSource {
    /// Best available bibliographic record for the file
    fn get_bibliography(&self, path: &Path) -> Result<Option<RawRecord>>;

    /// DOI printed in or attached to the file
    fn get_identifier(&self, path: &Path) -> Result<Option<String>>;

    fn get_keywords(&self, path: &Path) -> Result<Vec<String>>;
}

/// Metadata lookup by identifier. Never fails: any problem is logged by the
/// implementation and reported as not found.
pub trait IdentifierLookup {
    fn lookup(&self, identifier: &str) -> Option<RawRecord>;
}

/// A PDF source that knows nothing; records are created from the file name
/// alone
#[derive(Debug, Clone, Copy, Default)]
pub struct FileNameOnly;

impl PdfMetadataSource for FileNameOnly {
    fn get_bibliography(&self, _path: &Path) -> Result<Option<RawRecord>> {
        Ok(None)
    }

    fn get_identifier(&self, _path: &Path) -> Result<Option<String>> {
        Ok(None)
    }

    fn get_keywords(&self, _path: &Path) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// First DOI-looking token in free text, trailing punctuation removed
pub fn find_doi(text: &str) -> Option<String> {
    let found = DOI_PATTERN.captures(text)?.get(1)?.as_str();
    let doi = found.trim_end_matches(['.', ',', ';', ':', ')']);
    Some(doi.to_string())
}
