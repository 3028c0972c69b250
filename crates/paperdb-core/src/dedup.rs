//! Store-wide deduplication
//!
//! Records are visited in index order. For the visited record every other
//! live record scoring above the candidate threshold is a candidate; a
//! candidate is merged into the visited record only if the pair also reaches
//! the merge threshold. Merging fills empty fields, which can lift scores
//! against records that were below the gate before, so the candidate scan is
//! repeated until it merges nothing. Dropped records are tombstoned and the
//! store is compacted once at the end.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::scoring::{score, MatchThresholds};
use crate::store::{fill_empty, pair_mut, RecordStore};

/// Outcome of a deduplication pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupReport {
    /// Records merged away
    pub merged: usize,
    /// Candidate pairs that failed the merge threshold
    pub rejected: usize,
}

impl RecordStore {
    /// Merge near-duplicate records in place
    pub fn deduplicate(&mut self, thresholds: MatchThresholds) -> DedupReport {
        let n = self.len();
        let mut live = vec![true; n];
        let mut working: BTreeSet<usize> = (0..n).collect();
        let mut seen_rejections: HashSet<(usize, usize)> = HashSet::new();
        let mut report = DedupReport::default();

        if n < 2 {
            return report;
        }

        let records = self.records_mut();

        while let Some(i) = working.pop_first() {
            loop {
                let candidates: Vec<usize> = (0..n)
                    .filter(|&j| j != i && live[j])
                    .filter(|&j| score(&records[i], &records[j]) > thresholds.candidate)
                    .collect();

                let mut merged_any = false;
                for j in candidates {
                    let s = score(&records[i], &records[j]);
                    if s >= thresholds.merge {
                        let (keep, drop) = pair_mut(records, i, j);
                        fill_empty(keep, drop);
                        live[j] = false;
                        working.remove(&j);
                        report.merged += 1;
                        merged_any = true;
                        debug!(keep = i, drop = j, score = s, "merged duplicate");
                    } else if seen_rejections.insert((i.min(j), i.max(j))) {
                        report.rejected += 1;
                        debug!(a = i, b = j, score = s, "candidate below merge threshold");
                    }
                }

                if !merged_any {
                    break;
                }
            }
        }

        if report.merged == 0 {
            info!(rejected = report.rejected, "no duplicates found");
            return report;
        }

        let mut flags = live.into_iter();
        records.retain(|_| flags.next().unwrap_or(false));
        info!(
            merged = report.merged,
            rejected = report.rejected,
            remaining = records.len(),
            "deduplication finished"
        );
        self.mark_dirty();

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn rec(year: i32, author: &str, journal: &str, volume: &str) -> Record {
        let mut r = Record {
            year,
            journal: journal.into(),
            volume: volume.into(),
            ..Default::default()
        };
        r.set_author(author);
        r
    }

    #[test]
    fn test_doi_duplicates_collapse() {
        let mut a = rec(2019, "Smith, J", "Nature", "");
        a.doi = "10.1/x".into();
        let mut b = rec(2019, "Smith, John", "", "4");
        b.doi = "10.1/x".into();
        b.title = "Title from b".into();

        let mut store = RecordStore::from_records(vec![a, rec(2000, "Doe, J", "Q", ""), b]);
        let report = store.deduplicate(MatchThresholds::default());

        assert_eq!(report.merged, 1);
        assert_eq!(store.len(), 2);
        let kept = store.get(0).unwrap();
        assert_eq!(kept.author, "Smith, J");
        assert_eq!(kept.volume, "4");
        assert_eq!(kept.title, "Title from b");
        assert!(store.is_dirty());
    }

    #[test]
    fn test_candidate_below_merge_gate_is_counted() {
        let mut store = RecordStore::from_records(vec![
            rec(2019, "Smith, J", "Nature", "1"),
            rec(2019, "Smith, J", "Nature", "2"),
        ]);
        let report = store.deduplicate(MatchThresholds::default());

        assert_eq!(report.merged, 0);
        assert_eq!(report.rejected, 1);
        assert_eq!(store.len(), 2);
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_second_pass_finds_nothing() {
        let mut records = Vec::new();
        for (author, volume) in [("Smith, J", "1"), ("Smith, J", "1"), ("Smith, J", ""), ("Doe, A", "1")] {
            records.push(rec(2019, author, "Nature", volume));
        }
        let mut store = RecordStore::from_records(records);

        let first = store.deduplicate(MatchThresholds::default());
        assert!(first.merged >= 1);
        let second = store.deduplicate(MatchThresholds::default());
        assert_eq!(second.merged, 0);
    }
}
