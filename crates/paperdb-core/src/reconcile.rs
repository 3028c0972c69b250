//! Linking scanned PDF files to store records
//!
//! Each file goes through the same steps:
//!
//! 1. exact lookup of its path in `local-url`: one hit means it is already
//!    linked; several hits need a human to pick one;
//! 2. otherwise candidates are the records sharing the file's year and first
//!    author, plus those sharing its year and journal;
//! 3. no candidates means a new record is created from the PDF's metadata;
//!    with candidates a human picks one, skips, adds a new record anyway or
//!    quits the whole pass.
//!
//! [`plan`] and [`decide`] are pure; the only I/O goes through
//! [`ReconcilePrompt`] and [`PdfMetadataSource`].

use std::fmt;

use tracing::{debug, info, warn};

use crate::config::ScanOrder;
use crate::filename::FileMetadata;
use crate::normalize::Normalizer;
use crate::record::Record;
use crate::sources::PdfMetadataSource;
use crate::store::RecordStore;
use crate::view::RecordQuery;

/// Journal placeholder that linking may overwrite
pub const JOURNAL_PLACEHOLDER: &str = "TODO";

/// What the store says about one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkPlan {
    /// Exactly one record already points at the file
    AlreadyLinked(usize),
    /// Several records point at the file
    AmbiguousExact(Vec<usize>),
    /// Records that may describe the file, ascending by index
    Candidates(Vec<usize>),
    NoCandidates,
}

/// A human's answer to a [`Decision`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Skip,
    Quit,
    /// Create a new record even though candidates exist
    Add,
    /// Position in the decision's candidate list
    Select(usize),
}

/// One labeled answer a prompt may offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionOption {
    /// What the user types
    pub key: String,
    pub label: String,
    pub choice: Choice,
}

/// A question for the human, with every acceptable answer
#[derive(Debug, Clone)]
pub struct Decision<'a> {
    pub file: &'a FileMetadata,
    pub plan: &'a LinkPlan,
    /// Store indices behind `Choice::Select(k)`
    pub candidates: Vec<usize>,
    pub options: Vec<DecisionOption>,
}

impl Decision<'_> {
    /// Number of selectable candidates
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }
}

/// Presents a decision and returns the answer
pub trait ReconcilePrompt {
    fn choose(&mut self, decision: &Decision<'_>) -> Choice;
}

/// What happened to one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    AlreadySynced(usize),
    Linked(usize),
    Created(usize),
    Skipped,
    Quit,
}

/// Totals of a reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub already_synced: usize,
    pub linked: usize,
    pub created: usize,
    pub skipped: usize,
    /// The user quit; remaining files were not looked at
    pub aborted: bool,
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} already synced, {} linked, {} created, {} skipped",
            self.already_synced, self.linked, self.created, self.skipped
        )?;
        if self.aborted {
            f.write_str(" (aborted)")?;
        }
        Ok(())
    }
}

/// Look the file up in the store
pub fn plan(store: &RecordStore, file: &FileMetadata) -> LinkPlan {
    let exact = store.find_by_local_url(&file.local_url());
    match exact.len() {
        1 => return LinkPlan::AlreadyLinked(exact[0]),
        n if n > 1 => return LinkPlan::AmbiguousExact(exact),
        _ => {}
    }

    let by_author = store.filter(&RecordQuery::new().year(file.year).author1(&file.author1));
    let by_journal = store.filter(&RecordQuery::new().year(file.year).journal(&file.journal));

    let mut candidates: Vec<usize> = by_author
        .indices()
        .iter()
        .chain(by_journal.indices())
        .copied()
        .collect();
    candidates.sort_unstable();
    candidates.dedup();

    if candidates.is_empty() {
        LinkPlan::NoCandidates
    } else {
        LinkPlan::Candidates(candidates)
    }
}

/// Build the question for plans that need a human; `None` otherwise
pub fn decide<'a>(
    store: &RecordStore,
    file: &'a FileMetadata,
    plan: &'a LinkPlan,
) -> Option<Decision<'a>> {
    let (candidates, allow_add) = match plan {
        LinkPlan::AmbiguousExact(indices) => (indices.clone(), false),
        LinkPlan::Candidates(indices) => (indices.clone(), true),
        LinkPlan::AlreadyLinked(_) | LinkPlan::NoCandidates => return None,
    };

    let mut options: Vec<DecisionOption> = candidates
        .iter()
        .enumerate()
        .filter_map(|(k, &index)| {
            store.get(index).map(|record| DecisionOption {
                key: k.to_string(),
                label: describe(record),
                choice: Choice::Select(k),
            })
        })
        .collect();

    if allow_add {
        options.push(fixed_option("a", "add as a new record", Choice::Add));
    }
    options.push(fixed_option("s", "skip this file", Choice::Skip));
    options.push(fixed_option("q", "quit", Choice::Quit));

    Some(Decision {
        file,
        plan,
        candidates,
        options,
    })
}

/// Map free-text input onto a choice; anything unrecognised skips
pub fn parse_choice(input: &str, candidate_count: usize) -> Choice {
    let input = input.trim().to_ascii_lowercase();
    match input.as_str() {
        "s" | "skip" => Choice::Skip,
        "q" | "quit" | "exit" => Choice::Quit,
        "a" | "add" => Choice::Add,
        other => match other.parse::<usize>() {
            Ok(k) if k < candidate_count => Choice::Select(k),
            _ => Choice::Skip,
        },
    }
}

/// Put files in processing order (names start with the year, so this is
/// chronological)
pub fn order_files(files: &mut [FileMetadata], order: ScanOrder) {
    files.sort_by(|a, b| a.path.cmp(&b.path));
    if order == ScanOrder::Descending {
        files.reverse();
    }
}

/// Drives reconciliation of scanned files against a store
pub struct Reconciler<'a> {
    pdf: &'a dyn PdfMetadataSource,
    prompt: &'a mut dyn ReconcilePrompt,
    normalizer: Normalizer,
}

impl<'a> Reconciler<'a> {
    pub fn new(pdf: &'a dyn PdfMetadataSource, prompt: &'a mut dyn ReconcilePrompt) -> Self {
        Self {
            pdf,
            prompt,
            normalizer: Normalizer::default(),
        }
    }

    /// Normalize created records with this normalizer
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Reconcile `files` in the given order. Stops at the first `Quit`.
    pub fn run(&mut self, store: &mut RecordStore, files: &[FileMetadata]) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for file in files {
            match self.reconcile_file(store, file) {
                FileOutcome::AlreadySynced(_) => report.already_synced += 1,
                FileOutcome::Linked(_) => report.linked += 1,
                FileOutcome::Created(_) => report.created += 1,
                FileOutcome::Skipped => report.skipped += 1,
                FileOutcome::Quit => {
                    report.aborted = true;
                    break;
                }
            }
        }
        info!(%report, "reconciliation finished");
        report
    }

    pub fn reconcile_file(&mut self, store: &mut RecordStore, file: &FileMetadata) -> FileOutcome {
        let plan = plan(store, file);
        debug!(path = %file.path.display(), ?plan, "reconciling file");

        match &plan {
            LinkPlan::AlreadyLinked(index) => {
                mark_synced(store, *index);
                FileOutcome::AlreadySynced(*index)
            }
            LinkPlan::NoCandidates => FileOutcome::Created(self.create(store, file)),
            LinkPlan::AmbiguousExact(indices) => {
                warn!(
                    path = %file.path.display(),
                    records = indices.len(),
                    "several records are linked to this file"
                );
                match self.ask(store, file, &plan) {
                    Some((Choice::Select(k), candidates)) => {
                        let index = candidates[k];
                        mark_synced(store, index);
                        FileOutcome::Linked(index)
                    }
                    Some((Choice::Quit, _)) => FileOutcome::Quit,
                    _ => FileOutcome::Skipped,
                }
            }
            LinkPlan::Candidates(_) => match self.ask(store, file, &plan) {
                Some((Choice::Select(k), candidates)) => {
                    let index = candidates[k];
                    link(store, index, file);
                    FileOutcome::Linked(index)
                }
                Some((Choice::Add, _)) => FileOutcome::Created(self.create(store, file)),
                Some((Choice::Quit, _)) => FileOutcome::Quit,
                _ => FileOutcome::Skipped,
            },
        }
    }

    /// Prompt and validate the answer against the candidate list
    fn ask(
        &mut self,
        store: &RecordStore,
        file: &FileMetadata,
        plan: &LinkPlan,
    ) -> Option<(Choice, Vec<usize>)> {
        let decision = decide(store, file, plan)?;
        let choice = match self.prompt.choose(&decision) {
            Choice::Select(k) if k >= decision.candidate_count() => Choice::Skip,
            other => other,
        };
        Some((choice, decision.candidates))
    }

    /// Insert a record for `file`, built from the PDF when possible
    fn create(&self, store: &mut RecordStore, file: &FileMetadata) -> usize {
        let found = match self.pdf.get_bibliography(&file.path) {
            Ok(found) => found,
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "could not read pdf metadata");
                None
            }
        };

        let mut record = match found {
            Some(raw) => self.normalizer.normalize(&raw),
            None => file.to_record(),
        };
        record.local_url = file.local_url();
        record.sync = true;
        if record.year == 0 {
            record.year = file.year;
        }
        if record.journal.is_empty() {
            record.journal = file.journal.clone();
        }
        if record.extra.is_empty() {
            record.extra = file.extra.clone();
        }
        if record.author.is_empty() {
            record.set_author(file.author1.clone());
        }

        let index = store.insert(record);
        info!(path = %file.path.display(), index, "created record for file");
        index
    }
}

fn mark_synced(store: &mut RecordStore, index: usize) {
    if let Some(record) = store.get(index) {
        if record.sync {
            return;
        }
    }
    if let Some(record) = store.get_mut(index) {
        record.sync = true;
    }
}

/// Point the record at the file and backfill a missing journal
fn link(store: &mut RecordStore, index: usize, file: &FileMetadata) {
    if let Some(record) = store.get_mut(index) {
        record.local_url = file.local_url();
        record.sync = true;
        if record.journal.is_empty() || record.journal == JOURNAL_PLACEHOLDER {
            record.journal = file.journal.clone();
        }
        info!(path = %file.path.display(), index, "linked file to record");
    }
}

fn describe(record: &Record) -> String {
    format!(
        "{} {} | {} | {}",
        record.year, record.author1, record.journal, record.title
    )
}

fn fixed_option(key: &str, label: &str, choice: Choice) -> DecisionOption {
    DecisionOption {
        key: key.to_string(),
        label: label.to_string(),
        choice,
    }
}
