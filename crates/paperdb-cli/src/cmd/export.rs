//! `paperdb export` - write records back to BibTeX

use std::path::PathBuf;

use clap::Args;

use paperdb_core::bib::write_bib;
use paperdb_core::PaperDbConfig;

use super::{open_library, CmdResult, FilterArgs};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output .bib file
    pub out: PathBuf,

    #[command(flatten)]
    pub filters: FilterArgs,
}

pub fn run(args: ExportArgs, config: &PaperDbConfig) -> CmdResult {
    let library = open_library(config, false)?;
    let records = library.store().filter(&args.filters.to_query()).to_records();

    write_bib(&args.out, &records)?;
    println!("Wrote {} records to {}", records.len(), args.out.display());
    Ok(())
}
