//! PDF metadata through pdfium
//!
//! The DOI comes from the first page's text (falling back to the document
//! info dictionary). With an [`IdentifierLookup`] attached, the DOI is
//! resolved to a full record; otherwise the info dictionary is used.

use std::path::Path;

use pdfium_render::prelude::*;
use tracing::debug;

use super::{find_doi, IdentifierLookup, PdfMetadataSource};
use crate::error::{PaperDbError, Result};
use crate::record::{column, split_keywords, RawRecord};

pub struct PdfiumSource {
    pdfium: Pdfium,
    lookup: Option<Box<dyn IdentifierLookup>>,
}

impl PdfiumSource {
    /// Bind to the pdfium shared library installed on the system
    pub fn bind() -> Result<Self> {
        let bindings = Pdfium::bind_to_system_library().map_err(|e| PaperDbError::Pdf {
            path: "pdfium".into(),
            message: e.to_string(),
        })?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
            lookup: None,
        })
    }

    /// Resolve found DOIs through `lookup`
    pub fn with_lookup(mut self, lookup: Box<dyn IdentifierLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    fn open<'a>(&'a self, path: &Path) -> Result<PdfDocument<'a>> {
        self.pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| pdf_error(path, e))
    }

    fn first_page_text(&self, document: &PdfDocument<'_>, path: &Path) -> Result<String> {
        let pages = document.pages();
        if pages.is_empty() {
            return Ok(String::new());
        }
        let page = pages.first().map_err(|e| pdf_error(path, e))?;
        let text = page.text().map_err(|e| pdf_error(path, e))?;
        Ok(text.all())
    }

    /// Title, author, keywords and year from the info dictionary
    fn info(&self, document: &PdfDocument<'_>) -> RawRecord {
        let metadata = document.metadata();
        let tag = |kind| {
            metadata
                .get(kind)
                .map(|t| t.value().trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut raw = RawRecord::new();
        if let Some(title) = tag(PdfDocumentMetadataTagType::Title) {
            raw.insert(column::TITLE.into(), title);
        }
        if let Some(author) = tag(PdfDocumentMetadataTagType::Author) {
            raw.insert(column::AUTHOR.into(), author);
        }
        if let Some(keywords) = tag(PdfDocumentMetadataTagType::Keywords) {
            raw.insert(column::KEYWORDS.into(), keywords);
        }
        if let Some(year) = tag(PdfDocumentMetadataTagType::CreationDate).and_then(|d| pdf_date_year(&d)) {
            raw.insert(column::YEAR.into(), year);
        }
        if let Some(subject) = tag(PdfDocumentMetadataTagType::Subject) {
            if let Some(doi) = find_doi(&subject) {
                raw.insert(column::DOI.into(), doi);
            }
        }
        raw
    }

    fn identifier_in(&self, document: &PdfDocument<'_>, path: &Path) -> Result<Option<String>> {
        let text = self.first_page_text(document, path)?;
        Ok(find_doi(&text).or_else(|| self.info(document).remove(column::DOI)))
    }
}

impl PdfMetadataSource for PdfiumSource {
    fn get_bibliography(&self, path: &Path) -> Result<Option<RawRecord>> {
        let document = self.open(path)?;
        let doi = self.identifier_in(&document, path)?;

        if let (Some(doi), Some(lookup)) = (&doi, &self.lookup) {
            if let Some(mut raw) = lookup.lookup(doi) {
                raw.entry(column::DOI.to_string()).or_insert_with(|| doi.clone());
                return Ok(Some(raw));
            }
        }

        let mut raw = self.info(&document);
        if let Some(doi) = doi {
            raw.insert(column::DOI.into(), doi);
        }
        debug!(path = %path.display(), fields = raw.len(), "pdf info dictionary");
        Ok((!raw.is_empty()).then_some(raw))
    }

    fn get_identifier(&self, path: &Path) -> Result<Option<String>> {
        let document = self.open(path)?;
        self.identifier_in(&document, path)
    }

    fn get_keywords(&self, path: &Path) -> Result<Vec<String>> {
        let document = self.open(path)?;
        Ok(self
            .info(&document)
            .get(column::KEYWORDS)
            .map(|k| split_keywords(k))
            .unwrap_or_default())
    }
}

fn pdf_error(path: &Path, e: PdfiumError) -> PaperDbError {
    PaperDbError::Pdf {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Year of a PDF date string (`D:YYYYMMDDHHmmSS...`)
fn pdf_date_year(date: &str) -> Option<String> {
    let digits = date.strip_prefix("D:").unwrap_or(date);
    let year = digits.get(..4)?;
    year.chars().all(|c| c.is_ascii_digit()).then(|| year.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_date_year() {
        assert_eq!(pdf_date_year("D:20190514101500Z").as_deref(), Some("2019"));
        assert_eq!(pdf_date_year("2020-01-01").as_deref(), Some("2020"));
        assert_eq!(pdf_date_year("D:"), None);
        assert_eq!(pdf_date_year("unknown"), None);
    }

    // Reading real PDFs needs the pdfium shared library, which test machines
    // generally lack.
}
