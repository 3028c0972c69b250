//! Library loading: BibTeX sources, CSV cache and the record store

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::bib::read_bib;
use crate::cache::read_cache;
use crate::config::PaperDbConfig;
use crate::error::{PaperDbError, Result};
use crate::normalize::{sort_records, Normalizer};
use crate::record::Record;
use crate::store::RecordStore;

/// Cache file name used when several bib files make up the library
pub const SHARED_CACHE_FILE: &str = "paperdb.csv";

/// An opened library: its record store plus where it came from
#[derive(Debug)]
pub struct Library {
    config: PaperDbConfig,
    sources: Vec<PathBuf>,
    cache_path: PathBuf,
    store: RecordStore,
}

impl Library {
    /// Open the library named by `config.library.bib_files`.
    ///
    /// The CSV cache is used when present unless `force_rebuild` is set; a
    /// cache with the wrong columns triggers a rebuild. A rebuild parses every
    /// bib file, normalizes, sorts and rewrites the cache.
    pub fn open(config: PaperDbConfig, force_rebuild: bool) -> Result<Self> {
        let sources = resolve_sources(&config.library.bib_files)?;
        let cache_path = config
            .library
            .cache_file
            .clone()
            .unwrap_or_else(|| default_cache_path(&sources));

        let mut library = Self {
            config,
            sources,
            cache_path,
            store: RecordStore::new(),
        };

        if !force_rebuild && library.cache_path.is_file() {
            match read_cache(&library.cache_path) {
                Ok(mut records) => {
                    sort_records(&mut records);
                    library.store = RecordStore::from_records(records);
                    return Ok(library);
                }
                Err(PaperDbError::CacheSchema { path, column }) => {
                    warn!(path = %path.display(), %column, "cache schema mismatch, rebuilding");
                }
                Err(e) => return Err(e),
            }
        }

        library.rebuild()?;
        Ok(library)
    }

    /// Re-derive the store from the bib files and rewrite the cache
    pub fn rebuild(&mut self) -> Result<()> {
        let normalizer = Normalizer::new(self.config.normalize.clone());
        let mut records: Vec<Record> = Vec::new();
        for source in &self.sources {
            let raws = read_bib(source)?;
            records.extend(raws.iter().map(|raw| normalizer.normalize(raw)));
        }
        sort_records(&mut records);
        info!(
            sources = self.sources.len(),
            records = records.len(),
            "rebuilt library from bib files"
        );

        self.store = RecordStore::from_records(records);
        self.store.mark_dirty();
        self.persist()?;
        Ok(())
    }

    /// Write the cache if the store changed
    pub fn persist(&mut self) -> Result<bool> {
        self.store.persist(&self.cache_path)
    }

    pub fn config(&self) -> &PaperDbConfig {
        &self.config
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut RecordStore {
        &mut self.store
    }
}

/// Bib files matching `pattern`, sorted. No match is a missing source.
pub fn resolve_sources(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut sources: Vec<PathBuf> = glob::glob(pattern)?
        .filter_map(|entry| match entry {
            Ok(path) if path.is_file() => Some(path),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "unreadable path while resolving bib files");
                None
            }
        })
        .collect();
    sources.sort();

    if sources.is_empty() {
        return Err(PaperDbError::SourceNotFound(PathBuf::from(pattern)));
    }
    Ok(sources)
}

/// `<stem>.csv` beside a single bib file, otherwise [`SHARED_CACHE_FILE`]
/// beside the first one
pub fn default_cache_path(sources: &[PathBuf]) -> PathBuf {
    match sources {
        [single] => single.with_extension("csv"),
        [first, ..] => first
            .parent()
            .map(|dir| dir.join(SHARED_CACHE_FILE))
            .unwrap_or_else(|| PathBuf::from(SHARED_CACHE_FILE)),
        [] => PathBuf::from(SHARED_CACHE_FILE),
    }
}
