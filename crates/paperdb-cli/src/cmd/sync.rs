//! `paperdb sync` - link scanned PDFs to library records

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use tracing::{info, warn};

use paperdb_core::reconcile::order_files;
use paperdb_core::{scan_directory, Normalizer, PaperDbConfig, Reconciler, ScanOrder};

use super::{open_library, pdf_source, CmdResult};
use crate::prompt::TerminalPrompt;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OrderArg {
    Ascending,
    Descending,
}

impl From<OrderArg> for ScanOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Ascending => ScanOrder::Ascending,
            OrderArg::Descending => ScanOrder::Descending,
        }
    }
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Directory holding the PDFs (default: library.pdf_dir)
    pub dir: Option<PathBuf>,

    /// Processing order by file name (default: library.scan_order)
    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,
}

pub fn run(args: SyncArgs, config: &PaperDbConfig) -> CmdResult {
    let mut library = open_library(config, false)?;

    let dir = args.dir.unwrap_or_else(|| config.library.pdf_dir.clone());
    let mut scan = scan_directory(&dir)?;
    let order = args.order.map(ScanOrder::from).unwrap_or(config.library.scan_order);
    order_files(&mut scan.files, order);

    let pdf = pdf_source(config);
    let mut prompt = TerminalPrompt::stdin();
    let report = Reconciler::new(pdf.as_ref(), &mut prompt)
        .with_normalizer(Normalizer::new(config.normalize.clone()))
        .run(library.store_mut(), &scan.files);

    println!("{report}");
    if report.aborted {
        warn!("quit before the end; changes were not saved");
        return Ok(());
    }
    if library.persist()? {
        info!(path = %library.cache_path().display(), "cache updated");
    }
    Ok(())
}
