//! Crossref DOI lookup
//!
//! API docs: https://api.crossref.org/swagger-ui/index.html
//! Polite pool: identify with a `mailto:` in the User-Agent.

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use super::IdentifierLookup;
use crate::config::LookupConfig;
use crate::error::{PaperDbError, Result};
use crate::record::{column, RawRecord};

lazy_static! {
    static ref JATS_TAG: Regex = Regex::new(r"</?jats:[^>]+>").unwrap();
}

#[derive(Debug, Deserialize)]
struct CrossrefResponse {
    message: CrossrefWork,
}

#[derive(Debug, Deserialize)]
struct CrossrefWork {
    #[serde(rename = "DOI")]
    doi: String,
    #[serde(rename = "type")]
    work_type: Option<String>,
    title: Option<Vec<String>>,
    author: Option<Vec<CrossrefAuthor>>,
    #[serde(rename = "container-title")]
    container_title: Option<Vec<String>>,
    #[serde(rename = "published-print")]
    published_print: Option<CrossrefDate>,
    #[serde(rename = "published-online")]
    published_online: Option<CrossrefDate>,
    issued: Option<CrossrefDate>,
    volume: Option<String>,
    page: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    subject: Option<Vec<String>>,
    #[serde(rename = "URL")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrossrefAuthor {
    given: Option<String>,
    family: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrossrefDate {
    #[serde(rename = "date-parts")]
    date_parts: Option<Vec<Vec<Option<i32>>>>,
}

impl CrossrefDate {
    fn year(&self) -> Option<i32> {
        self.date_parts.as_ref()?.first()?.first().copied().flatten()
    }
}

/// Resolves DOIs through the Crossref REST API
pub struct CrossrefLookup {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl CrossrefLookup {
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let user_agent = match &config.mailto {
            Some(mail) => format!("paperdb/{} (mailto:{mail})", env!("CARGO_PKG_VERSION")),
            None => format!("paperdb/{}", env!("CARGO_PKG_VERSION")),
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| PaperDbError::Lookup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch one work. `Ok(None)` when Crossref does not know the DOI.
    pub fn fetch(&self, doi: &str) -> Result<Option<RawRecord>> {
        let url = format!("{}/works/{}", self.base_url, doi.trim());
        debug!(%url, "crossref lookup");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| PaperDbError::Lookup(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(PaperDbError::Lookup(format!("crossref returned {status} for {doi}")));
        }

        let body = response
            .text()
            .map_err(|e| PaperDbError::Lookup(e.to_string()))?;
        parse_work_response(&body).map(Some)
    }
}

impl IdentifierLookup for CrossrefLookup {
    fn lookup(&self, identifier: &str) -> Option<RawRecord> {
        match self.fetch(identifier) {
            Ok(found) => found,
            Err(e) => {
                warn!(identifier, error = %e, "identifier lookup failed");
                None
            }
        }
    }
}

/// Turn a `/works/{doi}` response into a raw record
pub(crate) fn parse_work_response(json: &str) -> Result<RawRecord> {
    let response: CrossrefResponse = serde_json::from_str(json)
        .map_err(|e| PaperDbError::Lookup(format!("invalid Crossref JSON: {e}")))?;
    Ok(work_to_raw(response.message))
}

fn work_to_raw(work: CrossrefWork) -> RawRecord {
    let mut raw = RawRecord::new();
    let mut put = |key: &str, value: Option<String>| {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            raw.insert(key.to_string(), v);
        }
    };

    let authors: Vec<String> = work
        .author
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| match (a.family, a.given, a.name) {
            (Some(family), Some(given), _) => Some(format!("{family}, {given}")),
            (Some(family), None, _) => Some(family),
            (None, _, name) => name,
        })
        .collect();

    let year = [&work.published_print, &work.published_online, &work.issued]
        .into_iter()
        .flatten()
        .find_map(CrossrefDate::year);

    put(column::DOI, Some(work.doi));
    put(column::ENTRY_TYPE, Some(entry_type(work.work_type.as_deref()).to_string()));
    put(column::TITLE, work.title.and_then(|t| t.into_iter().next()));
    put(column::AUTHOR, Some(authors.join(" and ")));
    put(column::JOURNAL, work.container_title.and_then(|t| t.into_iter().next()));
    put(column::YEAR, year.map(|y| y.to_string()));
    put(column::VOLUME, work.volume);
    put("pages", work.page);
    put(column::ABSTRACT, work.abstract_text.map(|a| strip_jats_markup(&a)));
    put(column::KEYWORDS, work.subject.map(|s| s.join(", ")));
    put(column::URL, work.url);
    raw
}

fn entry_type(work_type: Option<&str>) -> &'static str {
    match work_type {
        Some("journal-article") => "article",
        Some("proceedings-article") => "inproceedings",
        Some("book") | Some("monograph") => "book",
        Some("book-chapter") => "incollection",
        Some("posted-content") => "unpublished",
        Some("dissertation") => "phdthesis",
        Some("report") => "techreport",
        _ => "misc",
    }
}

fn strip_jats_markup(text: &str) -> String {
    JATS_TAG.replace_all(text, "").trim().to_string()
}
