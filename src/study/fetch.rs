//! study::fetch
//!
//! The seam between crawl orchestration and the library-database searchers.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::definition::{Database, StudyDefinition};
use super::entry::{DatabaseResults, LiteratureEntry};
use crate::core::types::slug;

/// Errors from fetching entries.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read results for {database} from '{path}': {source}")]
    Read {
        database: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed results for {database} in '{path}': {message}")]
    Malformed {
        database: String,
        path: PathBuf,
        message: String,
    },

    /// A searcher failed for its own reasons.
    #[error("search of {database} failed: {message}")]
    Search { database: String, message: String },
}

/// Produces literature entries for the databases of a study.
pub trait EntryFetcher {
    /// Fetch the entries `database` returns for `study`'s queries.
    fn fetch(
        &self,
        study: &StudyDefinition,
        database: &Database,
    ) -> Result<DatabaseResults, FetchError>;
}

/// Reads pre-fetched results from `<dir>/<database-slug>.json`.
///
/// Each file holds a JSON array of [`LiteratureEntry`] objects. A database
/// without a file has no results.
#[derive(Debug, Clone)]
pub struct JsonDirectoryFetcher {
    dir: PathBuf,
}

impl JsonDirectoryFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where results for `database` are expected.
    pub fn path_for(&self, database: &Database) -> PathBuf {
        self.dir.join(format!("{}.json", slug(&database.name)))
    }
}

impl EntryFetcher for JsonDirectoryFetcher {
    fn fetch(
        &self,
        _study: &StudyDefinition,
        database: &Database,
    ) -> Result<DatabaseResults, FetchError> {
        let path = self.path_for(database);
        if !path.exists() {
            log::debug!("no results file for {} at {}", database.name, path.display());
            return Ok(DatabaseResults::new(&database.name, Vec::new()));
        }

        let contents = fs::read_to_string(&path).map_err(|source| FetchError::Read {
            database: database.name.clone(),
            path: path.clone(),
            source,
        })?;
        let entries: Vec<LiteratureEntry> =
            serde_json::from_str(&contents).map_err(|e| FetchError::Malformed {
                database: database.name.clone(),
                path: path.clone(),
                message: e.to_string(),
            })?;

        log::debug!("read {} entries for {}", entries.len(), database.name);
        Ok(DatabaseResults::new(&database.name, entries))
    }
}
