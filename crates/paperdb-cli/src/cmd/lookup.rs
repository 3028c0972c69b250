//! `paperdb lookup` - resolve a DOI through Crossref
//!
//! Network and service failures are logged and reported as not found.

use clap::Args;

use paperdb_core::bib::records_to_bibtex;
use paperdb_core::normalize::normalize_doi;
use paperdb_core::sources::CrossrefLookup;
use paperdb_core::{IdentifierLookup, Normalizer, PaperDbConfig};

use super::CmdResult;

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// DOI, bare or as a resolver URL
    pub doi: String,
}

pub fn run(args: LookupArgs, config: &PaperDbConfig) -> CmdResult {
    let doi = normalize_doi(&args.doi);
    let client = CrossrefLookup::new(&config.lookup)?;

    let normalizer = Normalizer::new(config.normalize.clone());
    match resolve(&client, &normalizer, &doi) {
        Some(bibtex) => print!("{bibtex}"),
        None => eprintln!("No record found for {doi}."),
    }
    Ok(())
}

/// BibTeX for `doi`, or `None` when the lookup finds nothing or fails
fn resolve(lookup: &dyn IdentifierLookup, normalizer: &Normalizer, doi: &str) -> Option<String> {
    let raw = lookup.lookup(doi)?;
    Some(records_to_bibtex(&[normalizer.normalize(&raw)]))
}
