//! git::repository
//!
//! Opening and bootstrapping the study repository.
//!
//! # Lifecycle
//!
//! [`GitStore::open`] is idempotent. A root without `.git` is initialised
//! with HEAD on the configured default branch, given a default
//! `.gitignore`, and committed once as `Initial commit`. A repository
//! whose HEAD is still unborn gets the same bootstrap commit. Anything
//! else is left untouched.
//!
//! # Handles
//!
//! The store keeps only the root and its settings. Every operation opens
//! a fresh `git2::Repository` through [`GitStore::repository`] and drops it
//! before returning; composite operations pass the one handle down to
//! their helpers.

use std::fs;
use std::path::{Path, PathBuf};

use git2::{Repository, RepositoryInitOptions, Signature};

use super::errors::{GitResultExt, StoreError};
use crate::core::settings::StoreSettings;
use crate::core::types::{BranchName, Oid};

/// Message of the commit every study repository starts from.
pub const BOOTSTRAP_MESSAGE: &str = "Initial commit";

/// Name of the ignore-rules file installed at bootstrap.
pub const IGNORE_FILE: &str = ".gitignore";

/// Default ignore rules: editor droppings, OS metadata, and the scratch
/// files a crawl leaves behind.
pub const DEFAULT_IGNORE_RULES: &str = "\
# Installed by studyrepo. Keeps transient crawl artifacts out of history.
*.tmp
*.bak
*.sav
*.log
*~
.DS_Store
Thumbs.db
.idea/
.vscode/
";

/// Information about a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub oid: Oid,
    /// First line of the commit message
    pub summary: String,
    /// Full commit message
    pub message: String,
    pub parents: Vec<Oid>,
    pub author_name: String,
    pub author_time: chrono::DateTime<chrono::Utc>,
}

/// Handle to a study repository.
///
/// Cheap to clone; holds no open repository between calls.
#[derive(Debug, Clone)]
pub struct GitStore {
    root: PathBuf,
    settings: StoreSettings,
}

impl GitStore {
    // =========================================================================
    // Repository Opening
    // =========================================================================

    /// Open the repository at `root`, bootstrapping it if necessary.
    ///
    /// # Errors
    ///
    /// Any failure while creating the directory, initialising the
    /// repository, installing ignore rules or writing the bootstrap commit.
    /// These are logged and returned; a half-bootstrapped repository is
    /// never reported as usable.
    pub fn open(root: impl AsRef<Path>, settings: StoreSettings) -> Result<Self, StoreError> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|e| StoreError::io(root, e))?;
        let root = root.canonicalize().map_err(|e| StoreError::io(root, e))?;
        let store = Self { root, settings };

        if let Err(err) = store.bootstrap() {
            log::error!(
                "bootstrapping repository at {} failed: {}",
                store.root.display(),
                err
            );
            return Err(err);
        }

        Ok(store)
    }

    /// Whether `root` already holds a repository (has a `.git` entry).
    pub fn is_repository(root: impl AsRef<Path>) -> bool {
        root.as_ref().join(".git").exists()
    }

    fn bootstrap(&self) -> Result<(), StoreError> {
        let repo = if Self::is_repository(&self.root) {
            self.repository()?
        } else {
            log::info!(
                "initialising repository at {} on {}",
                self.root.display(),
                self.settings.default_branch
            );
            let mut opts = RepositoryInitOptions::new();
            opts.initial_head(self.settings.default_branch.as_str());
            Repository::init_opts(&self.root, &opts).during("init")?
        };

        match repo.head() {
            Ok(_) => return Ok(()),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {}
            Err(e) if e.code() == git2::ErrorCode::NotFound => {}
            Err(e) => return Err(StoreError::git("read HEAD", e)),
        }

        self.install_ignore_rules()?;
        self.write_bootstrap_commit(&repo)
    }

    fn install_ignore_rules(&self) -> Result<(), StoreError> {
        let path = self.root.join(IGNORE_FILE);
        if !path.exists() {
            fs::write(&path, DEFAULT_IGNORE_RULES).map_err(|e| StoreError::io(&path, e))?;
        }
        Ok(())
    }

    /// The bootstrap tree holds only the ignore file, so later patches
    /// never carry it.
    fn write_bootstrap_commit(&self, repo: &Repository) -> Result<(), StoreError> {
        let mut index = repo.index().during("read index")?;
        index
            .add_path(Path::new(IGNORE_FILE))
            .during("stage ignore rules")?;
        index.write().during("write index")?;
        let tree_id = index.write_tree().during("write bootstrap tree")?;
        let tree = repo.find_tree(tree_id).during("find bootstrap tree")?;

        let signature = self.signature(repo)?;
        let oid = repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                BOOTSTRAP_MESSAGE,
                &tree,
                &[],
            )
            .during("bootstrap commit")?;

        log::info!("created bootstrap commit {}", oid);
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Absolute, canonical root of the working tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// The git directory shared by every worktree of this repository.
    ///
    /// For a linked worktree `<root>/.git` is a file; this resolves to the
    /// main repository's git directory instead.
    pub fn common_dir(&self) -> Result<PathBuf, StoreError> {
        let repo = self.repository()?;
        let dir = repo.commondir().to_path_buf();
        Ok(dir)
    }

    /// Open a scoped handle to the repository.
    pub(crate) fn repository(&self) -> Result<Repository, StoreError> {
        Repository::open(&self.root).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound => StoreError::NotARepository {
                path: self.root.clone(),
            },
            _ => StoreError::git("open repository", e),
        })
    }

    /// Commit identity: repository config first, configured author second.
    pub(crate) fn signature(&self, repo: &Repository) -> Result<Signature<'static>, StoreError> {
        repo.signature().or_else(|_| {
            let author = &self.settings.author;
            Signature::now(&author.name, &author.email).during("build signature")
        })
    }

    // =========================================================================
    // History
    // =========================================================================

    /// First-parent history of `branch` (or HEAD), newest first.
    ///
    /// A branch that does not exist has no history.
    pub fn log(
        &self,
        branch: Option<&BranchName>,
        limit: usize,
    ) -> Result<Vec<CommitInfo>, StoreError> {
        let repo = self.repository()?;
        let start = match branch {
            Some(name) => match super::branches::find_local(&repo, name)? {
                Some(b) => b.get().peel_to_commit().during("resolve branch")?,
                None => return Ok(Vec::new()),
            },
            None => repo
                .head()
                .and_then(|h| h.peel_to_commit())
                .during("resolve HEAD")?,
        };

        let mut commits = Vec::new();
        let mut next = Some(start);
        while let Some(commit) = next {
            if commits.len() >= limit {
                break;
            }
            next = commit.parent(0).ok();
            commits.push(commit_info(&commit)?);
        }
        Ok(commits)
    }
}

pub(crate) fn to_oid(oid: git2::Oid) -> Result<Oid, StoreError> {
    Ok(Oid::new(oid.to_string())?)
}

pub(crate) fn commit_info(commit: &git2::Commit<'_>) -> Result<CommitInfo, StoreError> {
    let author = commit.author();
    let author_time = chrono::DateTime::from_timestamp(author.when().seconds(), 0)
        .unwrap_or(chrono::DateTime::UNIX_EPOCH);

    Ok(CommitInfo {
        oid: to_oid(commit.id())?,
        summary: commit.summary().unwrap_or("").to_string(),
        message: commit.message().unwrap_or("").to_string(),
        parents: commit
            .parent_ids()
            .map(to_oid)
            .collect::<Result<Vec<_>, _>>()?,
        author_name: author.name().unwrap_or("").to_string(),
        author_time,
    })
}
