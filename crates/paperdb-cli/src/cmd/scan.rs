//! `paperdb scan` - parse PDF file names without touching the library

use std::path::PathBuf;

use clap::Args;
use comfy_table::{Cell, Color};

use paperdb_core::filename::enrich_file_records;
use paperdb_core::{scan_directory, suggest_filename, Normalizer, PaperDbConfig, Record};

use super::{new_table, pdf_source, CmdResult};

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directory to scan (default: library.pdf_dir)
    pub dir: Option<PathBuf>,

    /// Also read DOI, title and keywords from the PDFs
    #[arg(long)]
    pub metadata: bool,
}

pub fn run(args: ScanArgs, config: &PaperDbConfig) -> CmdResult {
    let dir = args.dir.unwrap_or_else(|| config.library.pdf_dir.clone());
    let scan = scan_directory(&dir)?;

    let mut records: Vec<Record> = scan.files.iter().map(|f| f.to_record()).collect();
    let needs_pdf = args.metadata || !scan.rejected.is_empty();
    let pdf = needs_pdf.then(|| pdf_source(config));
    if let Some(pdf) = pdf.as_deref().filter(|_| args.metadata) {
        let enriched = enrich_file_records(&mut records, pdf);
        eprintln!("{enriched} files gained metadata");
    }

    let mut headers = vec!["year", "author1", "journal", "extra", "file"];
    if args.metadata {
        headers.extend(["doi", "title"]);
    }
    let mut table = new_table(&headers);
    for record in &records {
        let mut row = vec![
            Cell::new(record.year),
            Cell::new(&record.author1),
            Cell::new(&record.journal),
            Cell::new(&record.extra),
            Cell::new(&record.local_url),
        ];
        if args.metadata {
            row.push(Cell::new(&record.doi));
            row.push(Cell::new(&record.title));
        }
        table.add_row(row);
    }
    println!("{table}");

    if let Some(pdf) = pdf.as_deref().filter(|_| !scan.rejected.is_empty()) {
        let normalizer = Normalizer::new(config.normalize.clone());
        let mut rejected = new_table(&["file", "suggested name"]);
        for path in &scan.rejected {
            let suggestion = match pdf.get_bibliography(path) {
                Ok(Some(raw)) => Cell::new(suggest_filename(&normalizer.normalize(&raw))),
                _ => Cell::new("?").fg(Color::DarkGrey),
            };
            rejected.add_row(vec![Cell::new(path.display()), suggestion]);
        }
        eprintln!("\nFile names not in YEAR-AUTHOR-JOURNAL.pdf form:\n{rejected}");
    }

    eprintln!("{} parsed, {} rejected", scan.files.len(), scan.rejected.len());
    Ok(())
}
