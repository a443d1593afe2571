//! study::lock
//!
//! Exclusive crawl lock for a study repository.
//!
//! # Storage
//!
//! - `<common_dir>/studyrepo/lock` - Lock file holding an OS-level exclusive lock
//!
//! `<common_dir>` is the repository's shared git directory, so every
//! worktree of one repository contends for the same lock.
//!
//! # Invariants
//!
//! - Held for the whole crawl run
//! - Released on drop
//! - Acquisition never blocks; a second crawl of the same repository fails fast

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("{0} is held by another crawl")]
    AlreadyLocked(PathBuf),

    /// Failed to create the lock file or its directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// An exclusive lock on a study repository.
#[derive(Debug)]
pub struct CrawlLock {
    path: PathBuf,
    file: Option<File>,
}

impl CrawlLock {
    /// Lock file location inside the git directory `common_dir`.
    pub fn path_for(common_dir: &Path) -> PathBuf {
        common_dir.join("studyrepo").join("lock")
    }

    /// Take the lock for the repository whose git directory is `common_dir`.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another process holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS refuses the lock
    pub fn acquire(common_dir: &Path) -> Result<Self, LockError> {
        let path = Self::path_for(common_dir);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                LockError::CreateFailed(format!("cannot create {}: {}", dir.display(), e))
            })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                log::debug!("acquired crawl lock {}", path.display());
                Ok(Self {
                    path,
                    file: Some(file),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                Err(LockError::AlreadyLocked(path))
            }
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CrawlLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}
