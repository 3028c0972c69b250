//! paperdb - personal research-paper library
//!
//! Keeps a BibTeX library in a CSV cache, finds and merges duplicate
//! records, and links `YEAR-AUTHOR-JOURNAL.pdf` files to their records.

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use paperdb_core::PaperDbConfig;

mod cmd;
mod prompt;

#[derive(Parser)]
#[command(name = "paperdb")]
#[command(about = "Personal research-paper library manager")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./paperdb.toml or ~/.config/paperdb/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Glob naming the library's BibTeX files (overrides the config)
    #[arg(long, global = true)]
    bib: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Load the library, rebuilding the cache when needed
    Load(cmd::load::LoadArgs),
    /// Show records matching the filters
    Search(cmd::search::SearchArgs),
    /// Merge duplicate records
    Dedup(cmd::dedup::DedupArgs),
    /// Merge one record into another
    Merge(cmd::merge::MergeArgs),
    /// Parse the PDF file names in a directory
    Scan(cmd::scan::ScanArgs),
    /// Link PDF files to library records interactively
    Sync(cmd::sync::SyncArgs),
    /// Write records as BibTeX
    Export(cmd::export::ExportArgs),
    /// Resolve a DOI and print it as BibTeX
    Lookup(cmd::lookup::LookupArgs),
    /// Move new PDFs and their bib files into the archive
    Archive(cmd::archive::ArchiveArgs),
    /// Show the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut config = match &cli.config {
        Some(path) => PaperDbConfig::from_file(path)?,
        None => PaperDbConfig::load()?,
    };
    if let Some(bib) = cli.bib {
        config.library.bib_files = bib;
    }

    match cli.command {
        Command::Load(args) => cmd::load::run(args, &config),
        Command::Search(args) => cmd::search::run(args, &config),
        Command::Dedup(args) => cmd::dedup::run(args, &config),
        Command::Merge(args) => cmd::merge::run(args, &config),
        Command::Scan(args) => cmd::scan::run(args, &config),
        Command::Sync(args) => cmd::sync::run(args, &config),
        Command::Export(args) => cmd::export::run(args, &config),
        Command::Lookup(args) => cmd::lookup::run(args, &config),
        Command::Archive(args) => cmd::archive::run(args, &config),
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

/// Logs go to stderr; stdout carries tables and BibTeX
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
