//! `paperdb load` - open the library and report what it holds

use clap::Args;

use paperdb_core::PaperDbConfig;

use super::{open_library, CmdResult};

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Ignore the cache and re-read the BibTeX files
    #[arg(long)]
    pub rebuild: bool,
}

pub fn run(args: LoadArgs, config: &PaperDbConfig) -> CmdResult {
    let library = open_library(config, args.rebuild)?;

    for source in library.sources() {
        eprintln!("source: {}", source.display());
    }
    eprintln!("cache:  {}", library.cache_path().display());
    println!("{} records", library.store().len());
    Ok(())
}
