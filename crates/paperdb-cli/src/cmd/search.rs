//! `paperdb search` - filtered, projected listing

use clap::Args;

use paperdb_core::PaperDbConfig;

use super::{open_library, render, CmdResult, FilterArgs};

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Columns to show (default: year, author1, author, title, journal, doi)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,
}

pub fn run(args: SearchArgs, config: &PaperDbConfig) -> CmdResult {
    let library = open_library(config, false)?;
    let view = library.store().filter(&args.filters.to_query());

    if view.is_empty() {
        eprintln!("No matching records.");
        return Ok(());
    }

    let columns: Vec<&str> = args.columns.iter().map(String::as_str).collect();
    let table = render(&view.project(&columns));
    println!("{table}");
    eprintln!("{} of {} records", view.len(), library.store().len());
    Ok(())
}
