//! Record similarity scoring
//!
//! An exact match on any identifier column means certain identity. Without
//! one, equal non-empty values on a few descriptive columns add up to at most
//! [`MAX_FIELD_SCORE`]. All comparisons are case-sensitive string equality.

use serde::{Deserialize, Serialize};

use crate::config::MatchingConfig;
use crate::record::{column, Record};

/// Columns whose equality alone identifies a work
pub const IDENTIFIER_COLUMNS: [&str; 5] = [
    column::DOI,
    column::PMID,
    column::PMCID,
    column::TITLE,
    column::LOCAL_URL,
];

/// Weighted columns, in tenths so that sums are exact
pub const FIELD_WEIGHTS: [(&str, u32); 5] = [
    (column::YEAR, 2),
    (column::AUTHOR, 2),
    (column::AUTHOR1, 1),
    (column::JOURNAL, 2),
    (column::VOLUME, 1),
];

/// Best score reachable without an identifier match
pub const MAX_FIELD_SCORE: f64 = 0.8;

/// Scores at or above this confirm a merge
pub const MERGE_THRESHOLD: f64 = 0.8;

/// Scores above this are worth showing to a human
pub const DEFAULT_CANDIDATE_THRESHOLD: f64 = 0.5;

/// Similarity of two records with an explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    /// In `[0, 1]`
    pub score: f64,
    /// `"doi match"`, `"year + journal"`, `"no shared fields"`, ...
    pub reason: String,
}

impl MatchScore {
    pub fn is_identifier_match(&self) -> bool {
        self.score >= 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchThresholds {
    pub candidate: f64,
    pub merge: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            candidate: DEFAULT_CANDIDATE_THRESHOLD,
            merge: MERGE_THRESHOLD,
        }
    }
}

impl From<&MatchingConfig> for MatchThresholds {
    fn from(config: &MatchingConfig) -> Self {
        Self {
            candidate: config.candidate_threshold,
            merge: config.merge_threshold,
        }
    }
}

/// Similarity score in `[0, 1]`
pub fn score(a: &Record, b: &Record) -> f64 {
    compare(a, b).score
}

/// Score two records and say why
pub fn compare(a: &Record, b: &Record) -> MatchScore {
    for id in IDENTIFIER_COLUMNS {
        let value = a.value(id);
        if !value.is_empty() && value == b.value(id) {
            return MatchScore {
                score: 1.0,
                reason: format!("{id} match"),
            };
        }
    }

    let mut tenths = 0;
    let mut matched = Vec::new();
    for (col, weight) in FIELD_WEIGHTS {
        let value = a.value(col);
        if !value.is_empty() && value == b.value(col) {
            tenths += weight;
            matched.push(col);
        }
    }

    MatchScore {
        score: f64::from(tenths) / 10.0,
        reason: if matched.is_empty() {
            "no shared fields".to_string()
        } else {
            matched.join(" + ")
        },
    }
}
