//! End-to-end scenarios: library on disk, scanned PDFs, reconciliation

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use paperdb_core::filename::enrich_file_records;
use paperdb_core::reconcile::order_files;
use paperdb_core::{
    parse_filename, scan_directory, Choice, Decision, FileOutcome, IdentifierLookup, Library,
    PaperDbConfig, PdfMetadataSource, RawRecord, ReconcilePrompt, Reconciler, RecordStore,
    Result, ScanOrder,
};

/// PDF source answering from a fixed table keyed by path
#[derive(Default)]
struct FakePdf {
    bibliographies: HashMap<PathBuf, RawRecord>,
    identifiers: HashMap<PathBuf, String>,
    calls: RefCell<Vec<PathBuf>>,
}

impl FakePdf {
    fn with_bibliography(mut self, path: &str, pairs: &[(&str, &str)]) -> Self {
        let raw = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.bibliographies.insert(PathBuf::from(path), raw);
        self
    }

    fn with_identifier(mut self, path: &str, doi: &str) -> Self {
        self.identifiers.insert(PathBuf::from(path), doi.to_string());
        self
    }
}

impl PdfMetadataSource for FakePdf {
    fn get_bibliography(&self, path: &Path) -> Result<Option<RawRecord>> {
        self.calls.borrow_mut().push(path.to_path_buf());
        Ok(self.bibliographies.get(path).cloned())
    }

    fn get_identifier(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.identifiers.get(path).cloned())
    }

    fn get_keywords(&self, _path: &Path) -> Result<Vec<String>> {
        Ok(vec!["unread".to_string()])
    }
}

/// Answers prompts from a script and records what it was asked
#[derive(Default)]
struct ScriptedPrompt {
    answers: Vec<Choice>,
    asked: Vec<(PathBuf, Vec<String>)>,
}

impl ReconcilePrompt for ScriptedPrompt {
    fn choose(&mut self, decision: &Decision<'_>) -> Choice {
        let keys = decision.options.iter().map(|o| o.key.clone()).collect();
        self.asked.push((decision.file.path.clone(), keys));
        if self.answers.is_empty() {
            Choice::Skip
        } else {
            self.answers.remove(0)
        }
    }
}

struct StubLookup(HashMap<String, RawRecord>);

impl IdentifierLookup for StubLookup {
    fn lookup(&self, identifier: &str) -> Option<RawRecord> {
        self.0.get(identifier).cloned()
    }
}

const LIBRARY_BIB: &str = r#"
@article{Smith:2020,
  author = {Smith, John},
  title = {Coherent light},
  journal = {TODO},
  year = {2020}
}

@article{Doe:2019,
  author = {Doe, Jane},
  title = {Incoherent light},
  journal = {Science},
  year = {2019},
  local-url = {2019-Doe-Science.pdf}
}
"#;

#[test]
fn test_new_file_without_candidates_creates_one_synced_record() {
    let mut store = RecordStore::new();
    let file = parse_filename(Path::new("2021-Lee-Cell.pdf")).unwrap();
    let pdf = FakePdf::default().with_bibliography(
        "2021-Lee-Cell.pdf",
        &[("title", "Cells"), ("author", "Lee, Min"), ("doi", "https://doi.org/10.1/cell")],
    );
    let mut prompt = ScriptedPrompt::default();

    let outcome = Reconciler::new(&pdf, &mut prompt).reconcile_file(&mut store, &file);

    assert_eq!(outcome, FileOutcome::Created(0));
    assert_eq!(store.len(), 1);
    let record = store.get(0).unwrap();
    assert_eq!(record.local_url, "2021-Lee-Cell.pdf");
    assert!(record.sync);
    assert_eq!(record.doi, "10.1/cell");
    assert_eq!(record.author1, "Lee");
    assert_eq!(record.year, 2021);
    assert_eq!(record.journal, "Cell");
    assert!(prompt.asked.is_empty());
}

#[test]
fn test_new_file_without_pdf_metadata_uses_file_name() {
    let mut store = RecordStore::new();
    let file = parse_filename(Path::new("2020-Smith_John-Nature_Physics-2.pdf")).unwrap();
    let pdf = FakePdf::default();
    let mut prompt = ScriptedPrompt::default();

    Reconciler::new(&pdf, &mut prompt).reconcile_file(&mut store, &file);

    let record = store.get(0).unwrap();
    assert_eq!(record.year, 2020);
    assert_eq!(record.author1, "Smith-John");
    assert_eq!(record.journal, "Nature Physics");
    assert_eq!(record.extra, "2");
    assert!(record.sync);
}

#[test]
fn test_add_creates_even_with_candidates() {
    let mut store = RecordStore::new();
    let mut existing = paperdb_core::Record {
        year: 2020,
        journal: "Nature".into(),
        ..Default::default()
    };
    existing.set_author("Smith, J");
    store.insert(existing);

    let file = parse_filename(Path::new("2020-Smith-Nature.pdf")).unwrap();
    let pdf = FakePdf::default();
    let mut prompt = ScriptedPrompt {
        answers: vec![Choice::Add],
        ..Default::default()
    };

    let outcome = Reconciler::new(&pdf, &mut prompt).reconcile_file(&mut store, &file);
    assert_eq!(outcome, FileOutcome::Created(1));
    assert_eq!(prompt.asked[0].1, vec!["0", "a", "s", "q"]);
}

#[test]
fn test_library_sync_persists_links() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("library.bib"), LIBRARY_BIB).unwrap();
    for name in ["2020-Smith-Nature.pdf", "2019-Doe-Science.pdf", "2022-Roe-Cell.pdf", "misc.pdf"] {
        std::fs::write(dir.path().join(name), b"%PDF-1.4").unwrap();
    }

    let mut config = PaperDbConfig::default();
    config.library.bib_files = dir.path().join("*.bib").to_string_lossy().into_owned();

    let mut library = Library::open(config.clone(), false).unwrap();
    assert_eq!(library.store().len(), 2);

    // the library's local-url is relative; point it at the scanned path
    let doe = library.store().records().iter().position(|r| r.author1 == "Doe").unwrap();
    library.store_mut().get_mut(doe).unwrap().local_url = dir
        .path()
        .join("2019-Doe-Science.pdf")
        .to_string_lossy()
        .into_owned();

    let mut scan = scan_directory(dir.path()).unwrap();
    assert_eq!(scan.rejected, vec![dir.path().join("misc.pdf")]);
    order_files(&mut scan.files, ScanOrder::Descending);

    let pdf = FakePdf::default();
    let mut prompt = ScriptedPrompt {
        answers: vec![Choice::Select(0)],
        ..Default::default()
    };
    let report = Reconciler::new(&pdf, &mut prompt).run(library.store_mut(), &scan.files);

    assert_eq!(report.created, 1);
    assert_eq!(report.linked, 1);
    assert_eq!(report.already_synced, 1);
    assert!(!report.aborted);
    assert!(library.persist().unwrap());

    let reopened = Library::open(config, false).unwrap();
    let smith = reopened
        .store()
        .records()
        .iter()
        .find(|r| r.author1 == "Smith")
        .unwrap();
    assert!(smith.sync);
    assert_eq!(smith.journal, "Nature");
    assert!(smith.local_url.ends_with("2020-Smith-Nature.pdf"));
    assert_eq!(reopened.store().len(), 3);
}

#[test]
fn test_enrich_file_records_from_pdf() {
    let scan_names = ["2020-Smith-Nature.pdf", "2021-Lee-Cell.pdf"];
    let mut records: Vec<_> = scan_names
        .iter()
        .map(|n| parse_filename(Path::new(n)).unwrap().to_record())
        .collect();

    let pdf = FakePdf::default()
        .with_bibliography("2020-Smith-Nature.pdf", &[("title", "Light"), ("abstract", "We shine.")])
        .with_identifier("2021-Lee-Cell.pdf", "doi:10.5/cell");

    let enriched = enrich_file_records(&mut records, &pdf);
    assert_eq!(enriched, 2);
    assert_eq!(records[0].title, "Light");
    assert_eq!(records[0].abstract_text, "We shine.");
    assert_eq!(records[1].doi, "10.5/cell");
    assert_eq!(records[1].keywords, vec!["unread"]);
    assert_eq!(pdf.calls.borrow().len(), 2);
}

#[test]
fn test_lookup_double_feeds_normalizer() {
    let lookup = StubLookup(HashMap::from([(
        "10.1/x".to_string(),
        RawRecord::from([
            ("author".to_string(), "Curie, Marie".to_string()),
            ("year".to_string(), "1903".to_string()),
        ]),
    )]));

    let record = paperdb_core::normalize(&lookup.lookup("10.1/x").unwrap());
    assert_eq!(record.author1, "Curie");
    assert!(lookup.lookup("10.1/unknown").is_none());
}
