//! git::branches
//!
//! Branch lookup, creation and switching.
//!
//! [`GitStore::checkout`] is the only operation that moves HEAD between
//! branches. Lookup ([`GitStore::resolve_branch`]) never creates anything;
//! the create-if-missing decision lives in `checkout` alone.

use git2::build::CheckoutBuilder;
use git2::{Branch, BranchType, Repository};

use super::errors::{GitResultExt, StoreError};
use super::repository::{to_oid, GitStore};
use crate::core::types::{BranchName, Oid};

impl GitStore {
    /// Switch to `name`, creating it from HEAD first if it does not exist.
    ///
    /// Uses a safe checkout: local modifications that do not collide with
    /// the target tree are carried over; colliding ones abort the switch
    /// with [`StoreError::Toolchain`] and leave HEAD where it was.
    pub fn checkout(&self, name: &BranchName) -> Result<(), StoreError> {
        let repo = self.repository()?;
        checkout_with(&repo, name)
    }

    /// The checked-out branch.
    ///
    /// # Errors
    ///
    /// [`StoreError::DetachedHead`] if HEAD points at a commit directly.
    pub fn current_branch(&self) -> Result<BranchName, StoreError> {
        let repo = self.repository()?;
        current_with(&repo)
    }

    /// Tip of `name`, or `None` if no such local branch exists.
    pub fn resolve_branch(&self, name: &BranchName) -> Result<Option<Oid>, StoreError> {
        let repo = self.repository()?;
        let tip = match find_local(&repo, name)? {
            Some(branch) => {
                let commit = branch.get().peel_to_commit().during("resolve branch")?;
                Some(to_oid(commit.id())?)
            }
            None => None,
        };
        Ok(tip)
    }

    /// All local branches, sorted by name.
    pub fn list_branches(&self) -> Result<Vec<BranchName>, StoreError> {
        let repo = self.repository()?;
        let mut names = Vec::new();
        for entry in repo
            .branches(Some(BranchType::Local))
            .during("list branches")?
        {
            let (branch, _) = entry.during("read branch")?;
            if let Some(name) = branch.name().during("read branch name")? {
                names.push(BranchName::new(name)?);
            }
        }
        names.sort();
        Ok(names)
    }
}

pub(crate) fn find_local<'r>(
    repo: &'r Repository,
    name: &BranchName,
) -> Result<Option<Branch<'r>>, StoreError> {
    match repo.find_branch(name.as_str(), BranchType::Local) {
        Ok(branch) => Ok(Some(branch)),
        Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
        Err(e) => Err(StoreError::git("find branch", e)),
    }
}

pub(crate) fn current_with(repo: &Repository) -> Result<BranchName, StoreError> {
    let head = repo.head().during("read HEAD")?;
    if !head.is_branch() {
        return Err(StoreError::DetachedHead);
    }
    let name = head.shorthand().ok_or(StoreError::DetachedHead)?;
    Ok(BranchName::new(name)?)
}

pub(crate) fn checkout_with(repo: &Repository, name: &BranchName) -> Result<(), StoreError> {
    if find_local(repo, name)?.is_none() {
        let head = repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .during("resolve HEAD")?;
        repo.branch(name.as_str(), &head, false)
            .during("create branch")?;
        log::info!("created branch {} at {}", name, head.id());
    }

    let refname = name.refname();
    let target = repo.revparse_single(&refname).during("resolve branch")?;
    let mut opts = CheckoutBuilder::new();
    opts.safe();
    repo.checkout_tree(&target, Some(&mut opts))
        .during("checkout")?;
    repo.set_head(&refname).during("update HEAD")?;

    log::debug!("checked out {}", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::StoreSettings;
    use std::fs;
    use tempfile::TempDir;

    fn store() -> (TempDir, GitStore) {
        let dir = TempDir::new().unwrap();
        let store = GitStore::open(dir.path(), StoreSettings::default()).unwrap();
        (dir, store)
    }

    fn branch(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    #[test]
    fn checkout_creates_missing_branch_from_head() {
        let (_dir, store) = store();
        let main_tip = store.resolve_branch(&branch("main")).unwrap().unwrap();

        store.checkout(&branch("search/acm")).unwrap();

        assert_eq!(store.current_branch().unwrap(), branch("search/acm"));
        assert_eq!(
            store.resolve_branch(&branch("search/acm")).unwrap(),
            Some(main_tip)
        );
    }

    #[test]
    fn checkout_switches_existing_branch_and_tree() {
        let (dir, store) = store();
        store.checkout(&branch("feature")).unwrap();
        fs::write(dir.path().join("only-on-feature.txt"), "x\n").unwrap();
        assert!(store.commit_all("add file").unwrap());

        store.checkout(&branch("main")).unwrap();
        assert!(!dir.path().join("only-on-feature.txt").exists());

        store.checkout(&branch("feature")).unwrap();
        assert!(dir.path().join("only-on-feature.txt").exists());
    }

    #[test]
    fn resolve_never_creates() {
        let (_dir, store) = store();
        assert_eq!(store.resolve_branch(&branch("ghost")).unwrap(), None);
        assert_eq!(store.resolve_branch(&branch("ghost")).unwrap(), None);
        assert_eq!(store.list_branches().unwrap(), vec![branch("main")]);
    }

    #[test]
    fn list_branches_is_sorted() {
        let (_dir, store) = store();
        for name in ["search/zeta", "results", "search/acm"] {
            store.checkout(&branch(name)).unwrap();
        }
        let names: Vec<String> = store
            .list_branches()
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(names, ["main", "results", "search/acm", "search/zeta"]);
    }

    #[test]
    fn detached_head_is_an_error() {
        let (dir, store) = store();
        let repo = Repository::open(dir.path()).unwrap();
        let head = repo.head().unwrap().target().unwrap();
        repo.set_head_detached(head).unwrap();

        let err = store.current_branch().unwrap_err();
        assert!(matches!(err, StoreError::DetachedHead));
    }

    #[test]
    fn untracked_files_carry_over() {
        let (dir, store) = store();
        fs::write(dir.path().join("scratch.txt"), "keep me\n").unwrap();
        store.checkout(&branch("other")).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("scratch.txt")).unwrap(),
            "keep me\n"
        );
    }

    #[test]
    fn conflicting_local_change_blocks_switch() {
        let (dir, store) = store();
        let file = dir.path().join("data.txt");

        fs::write(&file, "base\n").unwrap();
        store.commit_all("base").unwrap();
        store.checkout(&branch("other")).unwrap();
        fs::write(&file, "other\n").unwrap();
        store.commit_all("other").unwrap();
        store.checkout(&branch("main")).unwrap();

        fs::write(&file, "dirty\n").unwrap();
        let err = store.checkout(&branch("other")).unwrap_err();
        assert_eq!(err.category(), crate::git::ErrorCategory::Toolchain);
        assert_eq!(store.current_branch().unwrap(), branch("main"));
        assert_eq!(fs::read_to_string(&file).unwrap(), "dirty\n");
    }
}
