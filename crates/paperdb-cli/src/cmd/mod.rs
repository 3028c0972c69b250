//! Subcommands and the helpers they share

use std::error::Error;

use clap::Args;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use tracing::warn;

use paperdb_core::sources::{CrossrefLookup, FileNameOnly, PdfiumSource};
use paperdb_core::{Library, PaperDbConfig, PdfMetadataSource, RecordQuery};

pub mod archive;
pub mod dedup;
pub mod export;
pub mod load;
pub mod lookup;
pub mod merge;
pub mod scan;
pub mod search;
pub mod sync;

pub type CmdResult = Result<(), Box<dyn Error>>;

/// Record filters shared by `search` and `export`
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Publication year
    #[arg(long)]
    pub year: Option<i32>,
    /// Substring of the author list
    #[arg(long)]
    pub author: Option<String>,
    /// Substring of the first author's name
    #[arg(long)]
    pub author1: Option<String>,
    /// Substring of the journal
    #[arg(long)]
    pub journal: Option<String>,
    /// Substring of the title
    #[arg(long)]
    pub title: Option<String>,
    /// Substring of the DOI
    #[arg(long)]
    pub doi: Option<String>,
    /// Substring of any keyword
    #[arg(long)]
    pub keyword: Option<String>,
}

impl FilterArgs {
    pub fn to_query(&self) -> RecordQuery {
        let mut query = RecordQuery::new();
        if let Some(year) = self.year {
            query = query.year(year);
        }
        if let Some(author) = &self.author {
            query = query.author(author);
        }
        if let Some(author1) = &self.author1 {
            query = query.author1(author1);
        }
        if let Some(journal) = &self.journal {
            query = query.journal(journal);
        }
        if let Some(title) = &self.title {
            query = query.title(title);
        }
        if let Some(doi) = &self.doi {
            query = query.doi(doi);
        }
        if let Some(keyword) = &self.keyword {
            query = query.keyword(keyword);
        }
        query
    }
}

pub fn open_library(config: &PaperDbConfig, rebuild: bool) -> Result<Library, Box<dyn Error>> {
    Ok(Library::open(config.clone(), rebuild)?)
}

/// The best available PDF reader: pdfium with Crossref resolution when the
/// shared library can be bound, file names only otherwise
pub fn pdf_source(config: &PaperDbConfig) -> Box<dyn PdfMetadataSource> {
    let pdfium = match PdfiumSource::bind() {
        Ok(source) => source,
        Err(e) => {
            warn!(error = %e, "pdfium unavailable; records will be built from file names");
            return Box::new(FileNameOnly);
        }
    };
    match CrossrefLookup::new(&config.lookup) {
        Ok(lookup) => Box::new(pdfium.with_lookup(Box::new(lookup))),
        Err(e) => {
            warn!(error = %e, "doi lookup unavailable");
            Box::new(pdfium)
        }
    }
}

pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    table
}

/// Render a projected view, index column first
pub fn render(projection: &paperdb_core::Table) -> Table {
    let mut headers = vec!["index"];
    headers.extend(projection.columns.iter().map(String::as_str));

    let mut table = new_table(&headers);
    for row in &projection.rows {
        let mut cells = vec![Cell::new(row.index)];
        cells.extend(row.values.iter().map(Cell::new));
        table.add_row(cells);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filters_match_everything() {
        assert!(FilterArgs::default().to_query().is_empty());
    }

    #[test]
    fn test_filters_build_query() {
        let args = FilterArgs {
            year: Some(2020),
            journal: Some("Nature".into()),
            ..Default::default()
        };
        let query = args.to_query();
        assert_eq!(query, RecordQuery::new().year(2020).journal("Nature"));
    }
}
