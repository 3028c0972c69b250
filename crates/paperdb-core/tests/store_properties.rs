//! Property tests for scoring, merging and deduplication

use paperdb_core::record::CANONICAL_COLUMNS;
use paperdb_core::scoring::{IDENTIFIER_COLUMNS, MAX_FIELD_SCORE};
use paperdb_core::{normalize, score, MatchThresholds, MergeOutcome, RawRecord, Record, RecordStore};
use proptest::prelude::*;

fn pick(values: &'static [&'static str]) -> impl Strategy<Value = String> {
    prop::sample::select(values).prop_map(String::from)
}

/// Normalized records drawn from small value pools so that collisions are
/// common
fn arb_record() -> impl Strategy<Value = Record> {
    (
        pick(&["", "2019", "2020"]),
        pick(&["", "Smith, John", "Doe, Jane", "John Smith"]),
        pick(&["", "Nature", "Science"]),
        pick(&["", "1", "2"]),
        pick(&["", "10.1/a", "10.1/b"]),
        pick(&["", "Alpha", "Beta"]),
        pick(&["", "optics", "optics, lasers"]),
        pick(&["", "1--10"]),
    )
        .prop_map(|(year, author, journal, volume, doi, title, keywords, pages)| {
            let raw: RawRecord = [
                ("year", year),
                ("author", author),
                ("journal", journal),
                ("volume", volume),
                ("doi", doi),
                ("title", title),
                ("keywords", keywords),
                ("pages", pages),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
            normalize(&raw)
        })
}

fn columns_of(a: &Record, b: &Record) -> Vec<String> {
    let mut columns: Vec<String> = a.columns().chain(b.columns()).map(String::from).collect();
    columns.sort();
    columns.dedup();
    columns
}

proptest! {
    #[test]
    fn prop_shared_doi_scores_one(mut a in arb_record(), mut b in arb_record(), doi in "10\\.[0-9]{4}/[a-z]{1,8}") {
        a.doi = doi.clone();
        b.doi = doi;
        prop_assert_eq!(score(&a, &b), 1.0);
    }

    #[test]
    fn prop_without_identifier_match_score_is_bounded(a in arb_record(), b in arb_record()) {
        let identifier_match = IDENTIFIER_COLUMNS
            .iter()
            .any(|c| !a.value(c).is_empty() && a.value(c) == b.value(c));
        let s = score(&a, &b);
        prop_assert!((0.0..=1.0).contains(&s));
        if !identifier_match {
            prop_assert!(s <= MAX_FIELD_SCORE);
        }
    }

    #[test]
    fn prop_score_is_symmetric(a in arb_record(), b in arb_record()) {
        prop_assert_eq!(score(&a, &b), score(&b, &a));
    }

    #[test]
    fn prop_merge_never_loses_populated_data(mut keep in arb_record(), mut drop in arb_record()) {
        keep.doi = "10.9/shared".into();
        drop.doi = "10.9/shared".into();
        let columns = columns_of(&keep, &drop);
        let before = keep.clone();

        let mut store = RecordStore::from_records(vec![keep, drop.clone()]);
        let outcome = store.merge(0, 1).unwrap();
        let merged_into_keep = matches!(outcome, MergeOutcome::Merged { kept: 0, .. });
        prop_assert!(merged_into_keep);
        prop_assert_eq!(store.len(), 1);

        let after = store.get(0).unwrap();
        for column in &columns {
            let was = before.value(column);
            if !was.is_empty() {
                prop_assert_eq!(after.value(column), was, "column {}", column);
            } else if !drop.value(column).is_empty() {
                prop_assert_eq!(after.value(column), drop.value(column), "column {}", column);
            }
        }
    }

    #[test]
    fn prop_deduplicate_reaches_fixed_point(records in prop::collection::vec(arb_record(), 0..12)) {
        let mut store = RecordStore::from_records(records);
        let first = store.deduplicate(MatchThresholds::default());
        let len_after_first = store.len();

        let second = store.deduplicate(MatchThresholds::default());
        prop_assert_eq!(second.merged, 0);
        prop_assert_eq!(store.len(), len_after_first);
        prop_assert!(first.merged <= 12);
    }

    #[test]
    fn prop_indices_stay_dense(records in prop::collection::vec(arb_record(), 1..10), remove in 0usize..10) {
        let mut store = RecordStore::from_records(records);
        store.deduplicate(MatchThresholds::default());
        if remove < store.len() {
            store.remove(remove).unwrap();
        }
        store.sort();

        let expected: Vec<usize> = (0..store.len()).collect();
        let view = store.view();
        prop_assert_eq!(view.indices(), &expected[..]);
        prop_assert_eq!(store.records().len(), store.len());
    }

    #[test]
    fn prop_every_record_has_canonical_columns(record in arb_record()) {
        let raw = record.to_raw();
        for column in CANONICAL_COLUMNS {
            prop_assert!(raw.contains_key(column));
        }
        prop_assert!(!raw.values().any(|v| v == "nan" || v == "NaN"));
    }
}

#[test]
fn test_identifier_requires_value_in_both_records() {
    let mut a = normalize(&RawRecord::from([
        ("doi".to_string(), "10.1/x".to_string()),
        ("title".to_string(), "First".to_string()),
        ("year".to_string(), "2019".to_string()),
        ("author".to_string(), "Smith, John".to_string()),
        ("journal".to_string(), "Nature".to_string()),
    ]));
    let b = Record {
        doi: String::new(),
        title: "Second".into(),
        ..a.clone()
    };

    // year + author + author1 + journal, no short-circuit
    assert_eq!(score(&a, &b), 0.7);

    a.doi.clear();
    assert_eq!(score(&a, &b), 0.7);
}
