//! study
//!
//! Systematic literature review studies on top of [`crate::git::GitStore`].
//!
//! # Modules
//!
//! - [`definition`] - The study definition (`study.toml`)
//! - [`entry`] - Literature entries and BibTeX rendering
//! - [`fetch`] - The [`EntryFetcher`] seam and a JSON-directory fetcher
//! - [`crawl`] - Crawl orchestration
//! - [`lock`] - Exclusive crawl lock
//!
//! # Repository layout
//!
//! ```text
//! <root>/
//!   study.toml              study definition, committed on the default branch
//!   results/<database>.bib  one result file per database
//!   .git/studyrepo/lock     crawl lock
//! ```
//!
//! In a linked worktree the lock lives in the main repository's git
//! directory, so every worktree shares it.
//!
//! Each database gets a search branch (`search/<database>` by default).
//! Results are committed there and integrated into the results branch.

pub mod crawl;
pub mod definition;
pub mod entry;
pub mod fetch;
pub mod lock;

pub use crawl::{
    CrawlError, CrawlReport, Crawler, DatabaseReport, Integration, IntegrationStrategy,
    RepositoryInit,
};
pub use definition::{Database, StudyDefinition, StudyFileError};
pub use entry::{DatabaseResults, LiteratureEntry};
pub use fetch::{EntryFetcher, FetchError, JsonDirectoryFetcher};
pub use lock::{CrawlLock, LockError};
