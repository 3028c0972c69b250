//! paperdb-core: personal research-paper library engine
//!
//! This library provides:
//! - Record normalization and first-author extraction
//! - Record similarity scoring with identifier short-circuits
//! - Store-wide deduplication and field-preserving merges
//! - Parsing of `YEAR-AUTHOR-JOURNAL.pdf` file names
//! - Reconciliation of scanned PDFs with store records
//! - An in-memory record store with filtered views and a CSV cache
//!
//! PDF metadata and DOI lookup are reached through the traits in [`sources`].

pub mod author;
pub mod bib;
pub mod cache;
pub mod config;
pub mod dedup;
pub mod error;
pub mod filename;
pub mod library;
pub mod normalize;
pub mod reconcile;
pub mod record;
pub mod scoring;
pub mod sources;
pub mod store;
pub mod view;

pub use author::{extract_first_author, NameMode};
pub use config::{PaperDbConfig, ScanOrder, UrlPreference};
pub use dedup::DedupReport;
pub use error::{PaperDbError, Result};
pub use filename::{parse_filename, scan_directory, suggest_filename, FileMetadata, FileScan};
pub use library::Library;
pub use normalize::{normalize, sort_records, Normalizer};
pub use reconcile::{
    parse_choice, Choice, Decision, DecisionOption, FileOutcome, LinkPlan, ReconcilePrompt,
    ReconcileReport, Reconciler,
};
pub use record::{RawRecord, Record};
pub use scoring::{compare, score, MatchScore, MatchThresholds};
pub use sources::{IdentifierLookup, PdfMetadataSource};
pub use store::{Candidate, MergeOutcome, RecordStore};
pub use view::{RecordQuery, Table, View};
