//! BibTeX entry data structures

use std::fmt;

/// BibTeX entry type.
///
/// Types outside the standard set are kept verbatim in `Other` so that a
/// parse/format cycle does not rewrite them to `misc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryType {
    Article,
    Book,
    InBook,
    InCollection,
    InProceedings,
    MastersThesis,
    Misc,
    PhdThesis,
    Proceedings,
    TechReport,
    Unpublished,
    Online,
    Other(String),
}

impl EntryType {
    /// Parse an entry type (case-insensitive)
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "article" => Self::Article,
            "book" => Self::Book,
            "inbook" => Self::InBook,
            "incollection" => Self::InCollection,
            "inproceedings" | "conference" => Self::InProceedings,
            "mastersthesis" => Self::MastersThesis,
            "misc" => Self::Misc,
            "phdthesis" => Self::PhdThesis,
            "proceedings" => Self::Proceedings,
            "techreport" => Self::TechReport,
            "unpublished" => Self::Unpublished,
            "online" | "electronic" | "www" => Self::Online,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Article => "article",
            Self::Book => "book",
            Self::InBook => "inbook",
            Self::InCollection => "incollection",
            Self::InProceedings => "inproceedings",
            Self::MastersThesis => "mastersthesis",
            Self::Misc => "misc",
            Self::PhdThesis => "phdthesis",
            Self::Proceedings => "proceedings",
            Self::TechReport => "techreport",
            Self::Unpublished => "unpublished",
            Self::Online => "online",
            Self::Other(name) => name,
        }
    }
}

impl Default for EntryType {
    fn default() -> Self {
        Self::Article
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `key = value` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibField {
    pub key: String,
    pub value: String,
}

/// A parsed BibTeX entry. Field order is the order of the source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibEntry {
    pub cite_key: String,
    pub entry_type: EntryType,
    pub fields: Vec<BibField>,
}

impl BibEntry {
    pub fn new(cite_key: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            cite_key: cite_key.into(),
            entry_type,
            fields: Vec::new(),
        }
    }

    /// Set a field, replacing an existing value with the same (case-insensitive) key
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self
            .fields
            .iter_mut()
            .find(|f| f.key.eq_ignore_ascii_case(&key))
        {
            Some(field) => field.value = value,
            None => self.fields.push(BibField { key, value }),
        }
    }

    /// Get a field value by key (case-insensitive)
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key.eq_ignore_ascii_case(key))
            .map(|f| f.value.as_str())
    }

    /// Iterate fields with lower-cased keys
    pub fn normalized_fields(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        self.fields
            .iter()
            .map(|f| (f.key.to_ascii_lowercase(), f.value.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_parsing() {
        assert_eq!(EntryType::parse("ARTICLE"), EntryType::Article);
        assert_eq!(EntryType::parse("conference"), EntryType::InProceedings);
        assert_eq!(
            EntryType::parse("patent"),
            EntryType::Other("patent".to_string())
        );
        assert_eq!(EntryType::parse("patent").as_str(), "patent");
    }

    #[test]
    fn test_field_access_is_case_insensitive() {
        let mut entry = BibEntry::new("Smith2024", EntryType::Article);
        entry.set_field("Title", "A Great Paper");
        entry.set_field("YEAR", "2024");

        assert_eq!(entry.get("title"), Some("A Great Paper"));
        assert_eq!(entry.get("year"), Some("2024"));
        assert_eq!(entry.get("doi"), None);
    }

    #[test]
    fn test_set_field_replaces() {
        let mut entry = BibEntry::new("k", EntryType::Misc);
        entry.set_field("title", "Old");
        entry.set_field("TITLE", "New");

        assert_eq!(entry.fields.len(), 1);
        assert_eq!(entry.get("title"), Some("New"));
    }
}
