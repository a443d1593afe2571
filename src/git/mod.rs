//! git
//!
//! Git-backed persistence for study results.
//!
//! # Architecture
//!
//! [`GitStore`] is the only doorway to Git. Everything that reads or
//! writes the study repository goes through it, and no other module
//! imports `git2`. Each component lives in its own submodule as a set of
//! `GitStore` methods:
//!
//! - [`repository`] - Opening, bootstrap, history
//! - [`branches`] - Checkout, lookup, listing
//! - [`commit`] - Status and whole-tree commits
//! - [`diff`] - Head-against-parent patches
//! - [`apply`] - Patch application
//! - [`merge`] - Branch integration
//! - [`remote`] - Fetch, pull, push
//!
//! # Invariants
//!
//! - An opened repository always has at least one commit
//! - Exactly one branch is checked out; only `checkout` moves HEAD
//!   (`merge` moves it and puts it back)
//! - No operation leaves an uncommitted partial change behind on failure
//! - Remote failures are outcomes, never errors
//!
//! # Example
//!
//! ```no_run
//! use studyrepo::core::settings::StoreSettings;
//! use studyrepo::core::types::BranchName;
//! use studyrepo::git::GitStore;
//!
//! let store = GitStore::open("/path/to/study", StoreSettings::default())?;
//! let search = BranchName::new("search/acm")?;
//!
//! store.checkout(&search)?;
//! // ... write results into the working tree ...
//! if store.commit_all("Crawl acm")? {
//!     let patch = store.diff_head_against_parent(&search)?;
//!     println!("{} files changed", patch.paths().len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod apply;
pub mod branches;
pub mod commit;
pub mod diff;
mod errors;
pub mod merge;
pub mod remote;
pub mod repository;

pub use commit::WorkingTreeStatus;
pub use diff::Patch;
pub use errors::{ErrorCategory, RemoteError, StoreError};
pub use merge::MergeOutcome;
pub use remote::SyncOutcome;
pub use repository::{CommitInfo, GitStore};
