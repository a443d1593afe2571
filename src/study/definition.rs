//! study::definition
//!
//! The study definition stored at the repository root.
//!
//! # Example
//!
//! ```toml
//! title = "Mining software repositories"
//! authors = ["Jane Doe"]
//! research_questions = ["How are commits classified?"]
//! queries = ["commit classification", "change intent"]
//!
//! [[databases]]
//! name = "ACM Portal"
//!
//! [[databases]]
//! name = "IEEE Xplore"
//! enabled = false
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the study definition, relative to the repository root.
pub const STUDY_FILE: &str = "study.toml";

/// Errors reading or writing the study definition.
#[derive(Debug, Error)]
pub enum StudyFileError {
    #[error("failed to read study file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse study file '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("failed to write study file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid study definition: {0}")]
    Invalid(String),
}

/// A systematic literature review definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyDefinition {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub research_questions: Vec<String>,
    pub queries: Vec<String>,
    pub databases: Vec<Database>,
}

/// A library database the study searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Database {
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
        }
    }
}

impl StudyDefinition {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            authors: Vec::new(),
            research_questions: Vec::new(),
            queries: Vec::new(),
            databases: Vec::new(),
        }
    }

    /// Databases that take part in a crawl, in definition order.
    pub fn enabled_databases(&self) -> impl Iterator<Item = &Database> {
        self.databases.iter().filter(|db| db.enabled)
    }

    /// Path of the study file under `root`.
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(STUDY_FILE)
    }

    /// Check that the definition can drive a crawl.
    ///
    /// A title, at least one query and at least one enabled database are
    /// required. Database names must stay distinct after slugging, since
    /// each one gets its own branch and result file.
    pub fn validate(&self) -> Result<(), StudyFileError> {
        if self.title.trim().is_empty() {
            return Err(StudyFileError::Invalid("title cannot be empty".into()));
        }
        if self.queries.iter().all(|q| q.trim().is_empty()) {
            return Err(StudyFileError::Invalid(
                "at least one query is required".into(),
            ));
        }
        if self.enabled_databases().next().is_none() {
            return Err(StudyFileError::Invalid(
                "at least one enabled database is required".into(),
            ));
        }

        let mut slugs: Vec<String> = self
            .databases
            .iter()
            .map(|db| crate::core::types::slug(&db.name))
            .collect();
        slugs.sort();
        if let Some(pair) = slugs.windows(2).find(|w| w[0] == w[1]) {
            return Err(StudyFileError::Invalid(format!(
                "database names collide as '{}'",
                pair[0]
            )));
        }
        Ok(())
    }

    /// Read and validate `study.toml` under `root`.
    pub fn load(root: &Path) -> Result<Self, StudyFileError> {
        let path = Self::path_in(root);
        let contents = fs::read_to_string(&path).map_err(|source| StudyFileError::Read {
            path: path.clone(),
            source,
        })?;
        let study: Self = toml::from_str(&contents).map_err(|e| StudyFileError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        study.validate()?;
        Ok(study)
    }

    /// Validate and write `study.toml` under `root`.
    pub fn save(&self, root: &Path) -> Result<PathBuf, StudyFileError> {
        self.validate()?;
        let path = Self::path_in(root);
        let contents =
            toml::to_string_pretty(self).map_err(|e| StudyFileError::Invalid(e.to_string()))?;

        let write_err = |source| StudyFileError::Write {
            path: path.clone(),
            source,
        };
        let mut file = fs::File::create(&path).map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        Ok(path)
    }
}
