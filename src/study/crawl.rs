//! study::crawl
//!
//! One crawl run over a study repository.
//!
//! # Lifecycle
//!
//! 1. Prepare the repository per [`RepositoryInit`]
//! 2. Take the crawl lock and pull
//! 3. Make sure the results branch exists
//! 4. Per enabled database: switch to its search branch, write the fetched
//!    entries, commit, and integrate the branch into the results branch
//! 5. Push the results branch
//!
//! A database whose results did not change produces no commit. Integration
//! is decided by branch state rather than by this run's commit, so a search
//! commit left behind by an interrupted run is integrated on the next one.
//! Remote trouble shows up in the report; local failures abort the run.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::definition::{StudyDefinition, StudyFileError};
use super::entry::DatabaseResults;
use super::fetch::{EntryFetcher, FetchError};
use super::lock::{CrawlLock, LockError};
use crate::core::settings::StoreSettings;
use crate::core::types::BranchName;
use crate::git::{GitStore, MergeOutcome, StoreError, SyncOutcome};

/// Commit message for the study definition of a new study.
pub const INIT_MESSAGE: &str = "Initialize study";

/// Errors that abort a crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    StudyFile(#[from] StudyFileError),

    /// Another crawl holds the lock.
    #[error("another crawl holds {0}")]
    Locked(PathBuf),

    #[error(transparent)]
    Lock(LockError),

    #[error("a study already exists at {0}")]
    StudyExists(PathBuf),

    #[error("no study definition found at {0}")]
    MissingStudy(PathBuf),

    #[error("failed to write results to '{path}': {source}")]
    WriteResults {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<LockError> for CrawlError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::AlreadyLocked(path) => CrawlError::Locked(path),
            other => CrawlError::Lock(other),
        }
    }
}

/// How the repository is prepared before crawling.
#[derive(Debug, Clone)]
pub enum RepositoryInit {
    /// The study already exists; read its definition.
    OpenExisting,
    /// Write this definition into a fresh study and commit it.
    CreateNew(StudyDefinition),
}

/// How a search branch's new commit reaches the results branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntegrationStrategy {
    /// Merge the search branch into the results branch.
    #[default]
    Merge,
    /// Apply the search branch's head-against-parent patch.
    ApplyPatch,
}

/// What happened to one database's results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integration {
    /// The results branch already held the search branch's content.
    Unchanged,
    Merged(MergeOutcome),
    /// Whether applying the patch produced a commit.
    Patched(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseReport {
    pub database: String,
    pub branch: BranchName,
    pub entries: usize,
    pub committed: bool,
    /// Paths changed by the integrated search commit, in patch order.
    pub paths: Vec<String>,
    pub integration: Integration,
}

/// Summary of a crawl run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub pull: SyncOutcome,
    pub databases: Vec<DatabaseReport>,
    pub push: SyncOutcome,
}

impl CrawlReport {
    /// Databases that produced a new commit or moved the results branch.
    pub fn changed(&self) -> impl Iterator<Item = &DatabaseReport> {
        self.databases
            .iter()
            .filter(|db| db.committed || db.integration != Integration::Unchanged)
    }
}

/// Drives crawl runs for the study rooted at one directory.
pub struct Crawler<F> {
    root: PathBuf,
    settings: StoreSettings,
    fetcher: F,
    strategy: IntegrationStrategy,
}

impl<F: EntryFetcher> Crawler<F> {
    pub fn new(root: impl Into<PathBuf>, settings: StoreSettings, fetcher: F) -> Self {
        Self {
            root: root.into(),
            settings,
            fetcher,
            strategy: IntegrationStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: IntegrationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run one crawl.
    ///
    /// Leaves the results branch checked out.
    pub fn run(&self, init: RepositoryInit) -> Result<CrawlReport, CrawlError> {
        let (store, study, _lock) = self.prepare(init)?;

        self.save_local_changes(&store)?;
        let pull = store.pull()?;

        let results = &self.settings.results_branch;
        let default = &self.settings.default_branch;
        if store.resolve_branch(results)?.is_none() {
            store.checkout(default)?;
            store.checkout(results)?;
        }

        let mut databases = Vec::new();
        for database in study.enabled_databases() {
            let branch =
                BranchName::for_database(&self.settings.search_branch_prefix, &database.name)
                    .map_err(StoreError::from)?;

            // New search branches start from the study definition alone.
            store.checkout(default)?;
            store.checkout(&branch)?;

            let fetched = self.fetcher.fetch(&study, database)?;
            self.write_results(store.root(), &fetched)?;

            let committed = store.commit_all(&format!("Crawl {}", database.name))?;
            if !committed {
                log::info!("{}: no new results", database.name);
            }
            // A commit left by an interrupted run still needs integrating.
            let (paths, integration) = self.integrate(&store, &branch, &database.name)?;

            databases.push(DatabaseReport {
                database: database.name.clone(),
                branch,
                entries: fetched.entries.len(),
                committed,
                paths,
                integration,
            });
        }

        store.checkout(results)?;
        let push = store.push()?;

        Ok(CrawlReport {
            pull,
            databases,
            push,
        })
    }

    fn prepare(
        &self,
        init: RepositoryInit,
    ) -> Result<(GitStore, StudyDefinition, CrawlLock), CrawlError> {
        let study_path = StudyDefinition::path_in(&self.root);

        match init {
            RepositoryInit::OpenExisting => {
                if !study_path.exists() {
                    return Err(CrawlError::MissingStudy(study_path));
                }
                let store = GitStore::open(&self.root, self.settings.clone())?;
                let lock = CrawlLock::acquire(&store.common_dir()?)?;
                let study = StudyDefinition::load(store.root())?;
                Ok((store, study, lock))
            }
            RepositoryInit::CreateNew(study) => {
                if study_path.exists() {
                    return Err(CrawlError::StudyExists(study_path));
                }
                study.validate()?;
                let store = GitStore::open(&self.root, self.settings.clone())?;
                let lock = CrawlLock::acquire(&store.common_dir()?)?;

                store.checkout(&self.settings.default_branch)?;
                study.save(store.root())?;
                store.commit_all(INIT_MESSAGE)?;
                log::info!("created study '{}' at {}", study.title, store.root().display());
                Ok((store, study, lock))
            }
        }
    }

    /// Commit stray edits on the checked-out branch so they never leak into
    /// a search branch commit.
    fn save_local_changes(&self, store: &GitStore) -> Result<(), CrawlError> {
        if !store.status()?.is_clean() {
            let branch = store.current_branch()?;
            log::warn!("committing local changes on {} before crawling", branch);
            store.commit_all("Save local changes before crawl")?;
        }
        Ok(())
    }

    fn write_results(&self, root: &Path, results: &DatabaseResults) -> Result<(), CrawlError> {
        let path = root.join(results.relative_path());
        let text = results.render_bibtex();
        if text.is_empty() && !path.exists() {
            return Ok(());
        }

        let write_err = |source| CrawlError::WriteResults {
            path: path.clone(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        fs::write(&path, text).map_err(write_err)
    }

    fn integrate(
        &self,
        store: &GitStore,
        branch: &BranchName,
        database: &str,
    ) -> Result<(Vec<String>, Integration), CrawlError> {
        let patch = store.diff_head_against_parent(branch)?;
        let results = &self.settings.results_branch;

        let integration = match self.strategy {
            IntegrationStrategy::Merge => match store.merge(results, branch)? {
                MergeOutcome::UpToDate | MergeOutcome::NothingToMerge => Integration::Unchanged,
                outcome => Integration::Merged(outcome),
            },
            IntegrationStrategy::ApplyPatch => {
                if store.same_content(results, branch, &patch.paths())? {
                    Integration::Unchanged
                } else {
                    store.checkout(results)?;
                    let message = format!("Integrate {}", database);
                    Integration::Patched(store.apply_patch(&patch, &message)?)
                }
            }
        };

        if integration == Integration::Unchanged {
            log::debug!("{}: {} already holds {}", database, results, branch);
            return Ok((Vec::new(), integration));
        }

        let paths = patch.paths();
        log::info!("{}: integrated {} path(s) into {}", database, paths.len(), results);
        Ok((paths, integration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::definition::Database;
    use crate::study::entry::LiteratureEntry;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Serves canned entries and counts calls.
    #[derive(Default)]
    struct StaticFetcher {
        results: HashMap<String, Vec<LiteratureEntry>>,
        calls: RefCell<Vec<String>>,
    }

    impl StaticFetcher {
        fn with(mut self, database: &str, titles: &[&str]) -> Self {
            let entries = titles
                .iter()
                .map(|t| {
                    LiteratureEntry::new("article")
                        .with_field("title", *t)
                        .with_field("author", "Doe, Jane")
                        .with_field("year", "2021")
                })
                .collect();
            self.results.insert(database.to_string(), entries);
            self
        }
    }

    impl EntryFetcher for StaticFetcher {
        fn fetch(
            &self,
            _study: &StudyDefinition,
            database: &Database,
        ) -> Result<DatabaseResults, FetchError> {
            self.calls.borrow_mut().push(database.name.clone());
            let entries = self.results.get(&database.name).cloned().unwrap_or_default();
            Ok(DatabaseResults::new(&database.name, entries))
        }
    }

    fn study(databases: &[&str]) -> StudyDefinition {
        let mut study = StudyDefinition::new("Review");
        study.queries.push("git".into());
        study.databases = databases.iter().map(|d| Database::new(*d)).collect();
        study
    }

    fn branch(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    #[test]
    fn open_existing_requires_study_file() {
        let temp = TempDir::new().unwrap();
        let crawler = Crawler::new(temp.path(), StoreSettings::default(), StaticFetcher::default());
        let err = crawler.run(RepositoryInit::OpenExisting).unwrap_err();
        assert!(matches!(err, CrawlError::MissingStudy(_)));
    }

    #[test]
    fn create_new_refuses_existing_study() {
        let temp = TempDir::new().unwrap();
        study(&["ACM"]).save(temp.path()).unwrap();
        let crawler = Crawler::new(temp.path(), StoreSettings::default(), StaticFetcher::default());
        let err = crawler
            .run(RepositoryInit::CreateNew(study(&["ACM"])))
            .unwrap_err();
        assert!(matches!(err, CrawlError::StudyExists(_)));
    }

    #[test]
    fn create_new_commits_definition_and_results() {
        let temp = TempDir::new().unwrap();
        let fetcher = StaticFetcher::default().with("ACM", &["Commit Mining"]);
        let crawler = Crawler::new(temp.path(), StoreSettings::default(), fetcher);

        let report = crawler
            .run(RepositoryInit::CreateNew(study(&["ACM"])))
            .unwrap();

        assert!(matches!(report.pull, SyncOutcome::Skipped(_)));
        assert!(matches!(report.push, SyncOutcome::Skipped(_)));
        assert_eq!(report.databases.len(), 1);
        let acm = &report.databases[0];
        assert_eq!(acm.branch, branch("search/acm"));
        assert!(acm.committed);
        assert_eq!(acm.paths, ["results/acm.bib"]);

        let store = GitStore::open(temp.path(), StoreSettings::default()).unwrap();
        assert_eq!(store.current_branch().unwrap(), branch("results"));
        assert!(temp.path().join("results/acm.bib").exists());
        let main_log = store.log(Some(&branch("main")), 10).unwrap();
        assert_eq!(main_log[0].summary, INIT_MESSAGE);
    }

    #[test]
    fn rerun_without_changes_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let fetcher = StaticFetcher::default().with("ACM", &["Commit Mining"]);
        let crawler = Crawler::new(temp.path(), StoreSettings::default(), fetcher);
        crawler
            .run(RepositoryInit::CreateNew(study(&["ACM"])))
            .unwrap();
        let store = GitStore::open(temp.path(), StoreSettings::default()).unwrap();
        let before = store.log(Some(&branch("results")), 20).unwrap();

        let report = crawler.run(RepositoryInit::OpenExisting).unwrap();

        assert_eq!(report.changed().count(), 0);
        assert_eq!(report.databases[0].integration, Integration::Unchanged);
        assert_eq!(store.log(Some(&branch("results")), 20).unwrap(), before);
    }

    #[test]
    fn second_crawl_holds_lock() {
        let temp = TempDir::new().unwrap();
        let crawler = Crawler::new(temp.path(), StoreSettings::default(), StaticFetcher::default());
        crawler
            .run(RepositoryInit::CreateNew(study(&["ACM"])))
            .unwrap();

        let _held = CrawlLock::acquire(&temp.path().join(".git")).unwrap();
        let err = crawler.run(RepositoryInit::OpenExisting).unwrap_err();
        assert!(matches!(err, CrawlError::Locked(_)));
    }

    #[test]
    fn linked_worktree_shares_the_lock() {
        let temp = TempDir::new().unwrap();
        let crawler = Crawler::new(temp.path(), StoreSettings::default(), StaticFetcher::default());
        crawler
            .run(RepositoryInit::CreateNew(study(&["ACM"])))
            .unwrap();

        let trees = TempDir::new().unwrap();
        let worktree = trees.path().join("second");
        git2::Repository::open(temp.path())
            .unwrap()
            .worktree("second", &worktree, None)
            .unwrap();
        assert!(worktree.join(".git").is_file());

        let store = GitStore::open(&worktree, StoreSettings::default()).unwrap();
        let held = CrawlLock::acquire(&store.common_dir().unwrap()).unwrap();
        let main_git_dir = temp.path().canonicalize().unwrap().join(".git");
        assert!(held.path().canonicalize().unwrap().starts_with(&main_git_dir));
        assert!(!worktree.join(".git").join("studyrepo").exists());

        let err = crawler.run(RepositoryInit::OpenExisting).unwrap_err();
        assert!(matches!(err, CrawlError::Locked(_)));
    }

    #[test]
    fn apply_patch_strategy_integrates_each_database() {
        let temp = TempDir::new().unwrap();
        let fetcher = StaticFetcher::default()
            .with("ACM", &["Commit Mining"])
            .with("IEEE", &["Change Intent"]);
        let crawler = Crawler::new(temp.path(), StoreSettings::default(), fetcher)
            .with_strategy(IntegrationStrategy::ApplyPatch);

        let report = crawler
            .run(RepositoryInit::CreateNew(study(&["ACM", "IEEE"])))
            .unwrap();

        for db in &report.databases {
            assert_eq!(db.integration, Integration::Patched(true));
        }
        let store = GitStore::open(temp.path(), StoreSettings::default()).unwrap();
        let log = store.log(Some(&branch("results")), 1).unwrap();
        assert_eq!(log[0].summary, "Integrate IEEE");
        assert!(temp.path().join("results/acm.bib").exists());
        assert!(temp.path().join("results/ieee.bib").exists());
    }

    #[test]
    fn commit_left_by_interrupted_run_is_integrated() {
        for strategy in [IntegrationStrategy::Merge, IntegrationStrategy::ApplyPatch] {
            let temp = TempDir::new().unwrap();
            let empty = Crawler::new(temp.path(), StoreSettings::default(), StaticFetcher::default())
                .with_strategy(strategy);
            empty
                .run(RepositoryInit::CreateNew(study(&["ACM"])))
                .unwrap();

            // The search commit exists but never reached the results branch.
            let fetcher = StaticFetcher::default().with("ACM", &["Commit Mining"]);
            let store = GitStore::open(temp.path(), StoreSettings::default()).unwrap();
            store.checkout(&branch("search/acm")).unwrap();
            let fetched = fetcher.fetch(&study(&["ACM"]), &Database::new("ACM")).unwrap();
            empty.write_results(store.root(), &fetched).unwrap();
            assert!(store.commit_all("Crawl ACM").unwrap());
            store.checkout(&branch("results")).unwrap();
            assert!(!temp.path().join("results/acm.bib").exists());

            let crawler = Crawler::new(temp.path(), StoreSettings::default(), fetcher)
                .with_strategy(strategy);
            let report = crawler.run(RepositoryInit::OpenExisting).unwrap();

            let acm = &report.databases[0];
            assert!(!acm.committed, "{strategy:?}");
            assert_ne!(acm.integration, Integration::Unchanged, "{strategy:?}");
            assert_eq!(acm.paths, ["results/acm.bib"], "{strategy:?}");
            assert_eq!(report.changed().count(), 1, "{strategy:?}");
            assert!(temp.path().join("results/acm.bib").exists(), "{strategy:?}");

            let again = crawler.run(RepositoryInit::OpenExisting).unwrap();
            assert_eq!(again.databases[0].integration, Integration::Unchanged, "{strategy:?}");
        }
    }

    #[test]
    fn disabled_databases_are_not_fetched() {
        let temp = TempDir::new().unwrap();
        let mut definition = study(&["ACM", "IEEE"]);
        definition.databases[1].enabled = false;
        let fetcher = StaticFetcher::default();
        let crawler = Crawler::new(temp.path(), StoreSettings::default(), fetcher);

        crawler.run(RepositoryInit::CreateNew(definition)).unwrap();
        assert_eq!(*crawler.fetcher.calls.borrow(), ["ACM"]);
    }
}
