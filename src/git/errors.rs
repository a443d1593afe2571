//! git::errors
//!
//! Error types for store operations.
//!
//! # Taxonomy
//!
//! - [`StoreError`] covers everything local. Its [`ErrorCategory`] separates
//!   *Unavailable* (the repository or filesystem cannot be reached) from
//!   *Toolchain* (git itself refused the request: bad branch, conflict,
//!   malformed patch). Both propagate to the caller.
//! - [`RemoteError`] covers transport, authentication and rejected pushes.
//!   It never propagates as an `Err`; RemoteSync hands it back inside
//!   [`super::SyncOutcome::Failed`] so local work keeps going offline.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::{BranchName, TypeError};

/// Coarse classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Repository root or filesystem inaccessible.
    Unavailable,
    /// Git rejected the operation.
    Toolchain,
}

/// Errors from local store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure outside of libgit2.
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The root exists but is not a usable repository.
    #[error("not a git repository: {path}")]
    NotARepository { path: PathBuf },

    /// libgit2 could not reach the repository or its files.
    #[error("repository unavailable ({context}): {message}")]
    Unavailable { context: String, message: String },

    /// libgit2 rejected the request.
    #[error("git rejected {context}: {message}")]
    Toolchain { context: String, message: String },

    #[error(transparent)]
    InvalidBranchName(#[from] TypeError),

    /// HEAD does not point at a branch.
    #[error("HEAD is detached; no branch is checked out")]
    DetachedHead,

    /// Merging would leave conflicting paths.
    #[error("merging {source_branch} into {target} conflicts in {}", .paths.join(", "))]
    MergeConflict {
        source_branch: BranchName,
        target: BranchName,
        paths: Vec<String>,
    },

    /// The patch could not be parsed or does not apply to the checked-out tree.
    #[error("patch rejected: {message}")]
    PatchRejected { message: String },

    /// The index holds unresolved conflict entries.
    #[error("unresolved conflicts in {}", .paths.join(", "))]
    UnresolvedConflicts { paths: Vec<String> },
}

impl StoreError {
    /// Classify a libgit2 error raised while doing `context`.
    pub(crate) fn git(context: impl Into<String>, err: git2::Error) -> Self {
        let context = context.into();
        let message = err.message().to_string();
        match err.class() {
            git2::ErrorClass::Os | git2::ErrorClass::Filesystem => {
                StoreError::Unavailable { context, message }
            }
            _ if err.code() == git2::ErrorCode::Locked => {
                StoreError::Unavailable { context, message }
            }
            _ => StoreError::Toolchain { context, message },
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Which half of the taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            StoreError::Io { .. }
            | StoreError::NotARepository { .. }
            | StoreError::Unavailable { .. } => ErrorCategory::Unavailable,
            _ => ErrorCategory::Toolchain,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::MergeConflict { .. } | StoreError::UnresolvedConflicts { .. }
        )
    }
}

/// Attach an operation description to libgit2 results.
pub(crate) trait GitResultExt<T> {
    fn during(self, context: &str) -> Result<T, StoreError>;
}

impl<T> GitResultExt<T> for Result<T, git2::Error> {
    fn during(self, context: &str) -> Result<T, StoreError> {
        self.map_err(|e| StoreError::git(context, e))
    }
}

/// Failures of fetch, pull and push transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Network, TLS or protocol failure.
    #[error("transport to '{remote}' failed: {message}")]
    Transport { remote: String, message: String },

    /// Credentials missing or refused.
    #[error("authentication with '{remote}' failed: {message}")]
    Authentication { remote: String, message: String },

    /// The remote refused a ref update.
    #[error("'{remote}' rejected {refname}: {message}")]
    Rejected {
        remote: String,
        refname: String,
        message: String,
    },
}

impl RemoteError {
    pub(crate) fn from_git2(remote: &str, err: &git2::Error) -> Self {
        let remote = remote.to_string();
        let message = err.message().to_string();
        match (err.code(), err.class()) {
            (git2::ErrorCode::Auth, _)
            | (git2::ErrorCode::Certificate, _)
            | (_, git2::ErrorClass::Ssh) => RemoteError::Authentication { remote, message },
            _ => RemoteError::Transport { remote, message },
        }
    }

    pub fn remote(&self) -> &str {
        match self {
            RemoteError::Transport { remote, .. }
            | RemoteError::Authentication { remote, .. }
            | RemoteError::Rejected { remote, .. } => remote,
        }
    }
}
