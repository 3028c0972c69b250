//! Filtered, read-only views over a [`RecordStore`]
//!
//! A [`View`] borrows the store, so the store cannot change underneath it.
//! [`View::project`] and [`View::to_records`] hand out owned copies.

use serde::Serialize;

use crate::record::{column, Record};
use crate::store::RecordStore;

/// Columns shown when the caller does not choose any
pub const DEFAULT_PROJECTION: [&str; 6] = [
    column::YEAR,
    column::AUTHOR1,
    column::AUTHOR,
    column::TITLE,
    column::JOURNAL,
    column::DOI,
];

/// Simple predicate filter. Empty predicates match everything; string
/// predicates are substring tests, `year` is an equality test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    pub year: Option<i32>,
    pub author: Option<String>,
    pub author1: Option<String>,
    pub journal: Option<String>,
    pub title: Option<String>,
    pub doi: Option<String>,
    pub keyword: Option<String>,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn author1(mut self, author1: impl Into<String>) -> Self {
        self.author1 = Some(author1.into());
        self
    }

    pub fn journal(mut self, journal: impl Into<String>) -> Self {
        self.journal = Some(journal.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Whether no predicate is set
    pub fn is_empty(&self) -> bool {
        self.year.is_none()
            && [
                &self.author,
                &self.author1,
                &self.journal,
                &self.title,
                &self.doi,
                &self.keyword,
            ]
            .iter()
            .all(|p| p.as_deref().map_or(true, str::is_empty))
    }

    pub fn matches(&self, record: &Record) -> bool {
        if let Some(year) = self.year {
            if year != 0 && record.year != year {
                return false;
            }
        }

        let contains = |pattern: &Option<String>, value: &str| match pattern.as_deref() {
            None | Some("") => true,
            Some(p) => value.contains(p),
        };

        contains(&self.author, &record.author)
            && contains(&self.author1, &record.author1)
            && contains(&self.journal, &record.journal)
            && contains(&self.title, &record.title)
            && contains(&self.doi, &record.doi)
            && match self.keyword.as_deref() {
                None | Some("") => true,
                Some(k) => record.keywords.iter().any(|kw| kw.contains(k)),
            }
    }
}

/// A subset of store rows, identified by store index
#[derive(Debug, Clone)]
pub struct View<'a> {
    store: &'a RecordStore,
    indices: Vec<usize>,
}

impl<'a> View<'a> {
    pub(crate) fn new(store: &'a RecordStore, indices: Vec<usize>) -> Self {
        Self { store, indices }
    }

    /// Store indices of the rows in this view
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// `(store index, record)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a Record)> + '_ {
        let store = self.store;
        self.indices
            .iter()
            .filter_map(move |&i| store.get(i).map(|r| (i, r)))
    }

    /// Narrow this view further
    pub fn filter(&self, query: &RecordQuery) -> View<'a> {
        let indices = self
            .iter()
            .filter(|(_, r)| query.matches(r))
            .map(|(i, _)| i)
            .collect();
        View::new(self.store, indices)
    }

    /// Owned copies of the records in view
    pub fn to_records(&self) -> Vec<Record> {
        self.iter().map(|(_, r)| r.clone()).collect()
    }

    /// Column-restricted copy for display; an empty column list means
    /// [`DEFAULT_PROJECTION`]
    pub fn project(&self, columns: &[&str]) -> Table {
        let columns: Vec<String> = if columns.is_empty() {
            DEFAULT_PROJECTION.iter().map(|c| c.to_string()).collect()
        } else {
            columns.iter().map(|c| c.to_string()).collect()
        };

        let rows = self
            .iter()
            .map(|(index, record)| TableRow {
                index,
                values: columns
                    .iter()
                    .map(|c| record.value(c).into_owned())
                    .collect(),
            })
            .collect();

        Table { columns, rows }
    }
}

/// Owned projection of a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    /// Store index at the time of projection
    pub index: usize,
    pub values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RecordStore {
        let mut records = Vec::new();
        for (year, author, journal, kw) in [
            (2019, "Smith, John", "Nature Physics", "optics"),
            (2020, "Smith, Jane", "Science", "lasers, optics"),
            (2020, "Doe, Jim", "Nature", ""),
        ] {
            let mut r = Record {
                year,
                journal: journal.into(),
                keywords: crate::record::split_keywords(kw),
                ..Default::default()
            };
            r.set_author(author);
            records.push(r);
        }
        RecordStore::from_records(records)
    }

    #[test]
    fn test_empty_query_matches_all() {
        let store = store();
        assert!(RecordQuery::new().is_empty());
        assert_eq!(store.filter(&RecordQuery::new()).len(), 3);
    }

    #[test]
    fn test_year_equality_and_substring() {
        let store = store();
        let view = store.filter(&RecordQuery::new().year(2020).journal("Nat"));
        assert_eq!(view.indices(), &[2]);

        let view = store.filter(&RecordQuery::new().author1("Smi"));
        assert_eq!(view.indices(), &[0, 1]);
    }

    #[test]
    fn test_keyword_filter() {
        let store = store();
        let view = store.filter(&RecordQuery::new().keyword("optics"));
        assert_eq!(view.indices(), &[0, 1]);
    }

    #[test]
    fn test_view_filter_chains() {
        let store = store();
        let smiths = store.filter(&RecordQuery::new().author1("Smith"));
        let narrowed = smiths.filter(&RecordQuery::new().year(2020));
        assert_eq!(narrowed.indices(), &[1]);
    }

    #[test]
    fn test_default_projection() {
        let store = store();
        let table = store.view().project(&[]);
        assert_eq!(
            table.columns,
            vec!["year", "author1", "author", "title", "journal", "doi"]
        );
        assert_eq!(table.rows[0].values[0], "2019");
        assert_eq!(table.rows[0].values[1], "Smith");
    }

    #[test]
    fn test_project_is_a_copy() {
        let mut store = store();
        let table = store.view().project(&["journal"]);
        store.get_mut(0).unwrap().journal = "Changed".into();
        assert_eq!(table.rows[0].values, vec!["Nature Physics"]);
    }
}
