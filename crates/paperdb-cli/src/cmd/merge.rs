//! `paperdb merge` - fold one record into another

use clap::Args;

use paperdb_core::scoring::MERGE_THRESHOLD;
use paperdb_core::{MergeOutcome, PaperDbConfig};

use super::{open_library, CmdResult};

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Index of the record to keep
    pub keep: usize,

    /// Index of the record merged into it and removed
    pub drop: usize,
}

pub fn run(args: MergeArgs, config: &PaperDbConfig) -> CmdResult {
    let mut library = open_library(config, false)?;
    match library.store_mut().merge(args.keep, args.drop)? {
        MergeOutcome::SameIndex => {
            eprintln!("Nothing to do: {} is the same record.", args.keep);
        }
        MergeOutcome::Rejected { score } => {
            eprintln!(
                "Not merged: records {} and {} score {score:.2}, below {MERGE_THRESHOLD:.2}.",
                args.keep, args.drop
            );
        }
        MergeOutcome::Merged { score, kept } => {
            library.persist()?;
            println!("Merged {} into {} (score {score:.2}); kept record is now {kept}.", args.drop, args.keep);
        }
    }
    Ok(())
}
