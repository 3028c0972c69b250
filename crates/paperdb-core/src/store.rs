//! In-memory record store
//!
//! A record's index is its position. Every structural mutation (insert,
//! remove, merge, sort, deduplicate) keeps indices dense, so callers must
//! not hold on to an index across one.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache;
use crate::error::{PaperDbError, Result};
use crate::normalize::sort_records;
use crate::record::Record;
use crate::scoring::{compare, score, MERGE_THRESHOLD};
use crate::view::{RecordQuery, View};

/// A possible match for a record, best first when listed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub index: usize,
    pub score: f64,
    pub reason: String,
}

/// Result of [`RecordStore::merge`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergeOutcome {
    /// `keep` and `drop` were the same record; nothing happened
    SameIndex,
    /// The pair scored below the merge threshold; the store is unchanged
    Rejected { score: f64 },
    /// `drop` was folded into `keep` and removed; `kept` is keep's new index
    Merged { score: f64, kept: usize },
}

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    dirty: bool,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap already-ordered records; the store starts clean
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            records,
            dirty: false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Mutable access to one record; marks the store dirty
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Record> {
        let record = self.records.get_mut(index)?;
        self.dirty = true;
        Some(record)
    }

    /// Append a record and return its index
    pub fn insert(&mut self, record: Record) -> usize {
        self.records.push(record);
        self.dirty = true;
        self.records.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Result<Record> {
        self.check_index(index)?;
        self.dirty = true;
        Ok(self.records.remove(index))
    }

    /// Sort by (`year`, `author1`)
    pub fn sort(&mut self) {
        sort_records(&mut self.records);
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Every record, as a view
    pub fn view(&self) -> View<'_> {
        View::new(self, (0..self.records.len()).collect())
    }

    /// Records matching every non-empty predicate of `query`
    pub fn filter(&self, query: &RecordQuery) -> View<'_> {
        let indices = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| query.matches(r))
            .map(|(i, _)| i)
            .collect();
        View::new(self, indices)
    }

    /// Indices of records linked to exactly this path
    pub fn find_by_local_url(&self, path: &str) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.local_url == path)
            .map(|(i, _)| i)
            .collect()
    }

    /// Records scoring above `threshold` against `record`, best first
    pub fn candidates(&self, record: &Record, threshold: f64) -> Vec<Candidate> {
        let mut found: Vec<Candidate> = self
            .records
            .iter()
            .enumerate()
            .filter_map(|(index, other)| {
                let m = compare(record, other);
                (m.score > threshold).then(|| Candidate {
                    index,
                    score: m.score,
                    reason: m.reason,
                })
            })
            .collect();
        found.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));
        found
    }

    /// Fold `drop` into `keep` when they score at least [`MERGE_THRESHOLD`]
    pub fn merge(&mut self, keep: usize, drop: usize) -> Result<MergeOutcome> {
        self.merge_with_threshold(keep, drop, MERGE_THRESHOLD)
    }

    /// [`merge`](Self::merge) with a custom confirmation threshold
    pub fn merge_with_threshold(
        &mut self,
        keep: usize,
        drop: usize,
        threshold: f64,
    ) -> Result<MergeOutcome> {
        self.check_index(keep)?;
        self.check_index(drop)?;
        if keep == drop {
            return Ok(MergeOutcome::SameIndex);
        }

        let s = score(&self.records[keep], &self.records[drop]);
        if s < threshold {
            warn!(keep, drop, score = s, "merge rejected: records do not match closely enough");
            return Ok(MergeOutcome::Rejected { score: s });
        }

        let (kept, dropped) = pair_mut(&mut self.records, keep, drop);
        fill_empty(kept, dropped);
        self.records.remove(drop);
        self.dirty = true;

        let kept = if keep > drop { keep - 1 } else { keep };
        info!(kept, score = s, "merged records");
        Ok(MergeOutcome::Merged { score: s, kept })
    }

    /// Write the store to `path` if it changed since the last write.
    /// Returns whether a write happened.
    pub fn persist(&mut self, path: &Path) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        cache::write_cache(path, &self.records)?;
        self.dirty = false;
        Ok(true)
    }

    /// Raw access for whole-store passes; the caller decides about `dirty`
    pub(crate) fn records_mut(&mut self) -> &mut Vec<Record> {
        &mut self.records
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.records.len() {
            Ok(())
        } else {
            Err(PaperDbError::IndexOutOfRange {
                index,
                len: self.records.len(),
            })
        }
    }
}

/// Copy every column that is empty in `keep` but populated in `drop`
pub fn fill_empty(keep: &mut Record, drop: &Record) {
    for column in drop.columns() {
        let incoming = drop.value(column);
        if !incoming.is_empty() && keep.value(column).is_empty() {
            keep.set_value(column, &incoming);
        }
    }
}

/// Borrow two distinct records, the first mutably
pub(crate) fn pair_mut(records: &mut [Record], a: usize, b: usize) -> (&mut Record, &Record) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = records.split_at_mut(b);
        (&mut left[a], &right[0])
    } else {
        let (left, right) = records.split_at_mut(a);
        (&mut right[0], &left[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(year: i32, author: &str, journal: &str) -> Record {
        let mut r = Record {
            year,
            journal: journal.into(),
            ..Default::default()
        };
        r.set_author(author);
        r
    }

    #[test]
    fn test_insert_remove_keep_indices_dense() {
        let mut store = RecordStore::new();
        assert!(!store.is_dirty());
        for y in [2001, 2002, 2003] {
            store.insert(rec(y, "A", "J"));
        }
        assert!(store.is_dirty());

        let removed = store.remove(1).unwrap();
        assert_eq!(removed.year, 2002);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().year, 2003);
        assert!(store.get(2).is_none());
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut store = RecordStore::new();
        let err = store.remove(0).unwrap_err();
        assert!(matches!(err, PaperDbError::IndexOutOfRange { index: 0, len: 0 }));
    }

    #[test]
    fn test_merge_same_index_is_noop() {
        let mut store = RecordStore::from_records(vec![rec(2001, "A", "J")]);
        assert_eq!(store.merge(0, 0).unwrap(), MergeOutcome::SameIndex);
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_merge_rejected_leaves_store_unchanged() {
        let mut store =
            RecordStore::from_records(vec![rec(2001, "Smith, A", "J"), rec(2001, "Doe, B", "K")]);
        let before = store.records().to_vec();

        let outcome = store.merge(0, 1).unwrap();
        assert!(matches!(outcome, MergeOutcome::Rejected { score } if score < 0.8));
        assert_eq!(store.records(), &before[..]);
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_merge_fills_empty_fields_only() {
        let mut keep = rec(2001, "Smith, A", "J");
        keep.title = "Kept title".into();
        keep.volume = "3".into();
        let mut drop = rec(2001, "Smith, A", "J");
        drop.title = "Other title".into();
        drop.volume = "3".into();
        drop.doi = "10.1/x".into();
        drop.fields.insert("pages".into(), "1--2".into());

        let mut store = RecordStore::from_records(vec![rec(1990, "Z", "Q"), drop, keep]);
        let outcome = store.merge(2, 1).unwrap();
        assert_eq!(outcome, MergeOutcome::Merged { score: 0.8, kept: 1 });

        assert_eq!(store.len(), 2);
        let merged = store.get(1).unwrap();
        assert_eq!(merged.title, "Kept title");
        assert_eq!(merged.doi, "10.1/x");
        assert_eq!(merged.fields["pages"], "1--2");
    }

    #[test]
    fn test_candidates_sorted_by_score() {
        let mut exact = rec(2001, "Smith, A", "J");
        exact.doi = "10.1/x".into();
        let store = RecordStore::from_records(vec![
            rec(2001, "Smith, A", "Other"),
            rec(1999, "Doe", "X"),
            exact.clone(),
        ]);

        let found = store.candidates(&exact, 0.4);
        let indices: Vec<_> = found.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![2, 0]);
        assert_eq!(found[0].score, 1.0);
    }

    #[test]
    fn test_find_by_local_url() {
        let mut a = rec(2001, "A", "J");
        a.local_url = "2001-A-J.pdf".into();
        let store = RecordStore::from_records(vec![a.clone(), rec(2002, "B", "K"), a]);
        assert_eq!(store.find_by_local_url("2001-A-J.pdf"), vec![0, 2]);
        assert!(store.find_by_local_url("missing.pdf").is_empty());
    }

    #[test]
    fn test_persist_only_when_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.csv");
        let mut store = RecordStore::from_records(vec![rec(2001, "A", "J")]);

        assert!(!store.persist(&path).unwrap());
        assert!(!path.exists());

        store.get_mut(0).unwrap().read = true;
        assert!(store.persist(&path).unwrap());
        assert!(path.exists());
        assert!(!store.is_dirty());
    }
}
