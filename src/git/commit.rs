//! git::commit
//!
//! Working tree inspection and whole-tree commits.

use std::path::Path;

use git2::{IndexAddOption, Status, StatusOptions};
use serde::Serialize;

use super::errors::{GitResultExt, StoreError};
use super::repository::GitStore;

/// Snapshot of the working tree and index.
///
/// Every list is sorted. Ignored files never appear. A path can show up
/// in both `staged` and `modified` when the index and the working tree
/// each differ from the previous stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkingTreeStatus {
    /// Paths git does not track yet.
    pub untracked: Vec<String>,
    /// Tracked paths whose working copy differs from the index.
    pub modified: Vec<String>,
    /// Tracked paths deleted from the working tree.
    pub missing: Vec<String>,
    /// Paths whose index entry differs from HEAD.
    pub staged: Vec<String>,
    /// Paths with unresolved merge conflicts.
    pub conflicted: Vec<String>,
}

impl WorkingTreeStatus {
    pub fn is_clean(&self) -> bool {
        self.untracked.is_empty()
            && self.modified.is_empty()
            && self.missing.is_empty()
            && self.staged.is_empty()
            && self.conflicted.is_empty()
    }

    fn sort(&mut self) {
        for list in [
            &mut self.untracked,
            &mut self.modified,
            &mut self.missing,
            &mut self.staged,
            &mut self.conflicted,
        ] {
            list.sort();
        }
    }
}

const STAGED: Status = Status::INDEX_NEW
    .union(Status::INDEX_MODIFIED)
    .union(Status::INDEX_DELETED)
    .union(Status::INDEX_RENAMED)
    .union(Status::INDEX_TYPECHANGE);

const MODIFIED: Status = Status::WT_MODIFIED
    .union(Status::WT_TYPECHANGE)
    .union(Status::WT_RENAMED);

impl GitStore {
    /// Inspect the working tree.
    pub fn status(&self) -> Result<WorkingTreeStatus, StoreError> {
        let repo = self.repository()?;
        status_with(&repo)
    }

    /// Stage everything and commit it.
    ///
    /// Returns `false` without committing when there is nothing to record,
    /// either because the tree is clean or because staging produces HEAD's
    /// own tree.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnresolvedConflicts`] while the index holds conflict
    /// entries.
    pub fn commit_all(&self, message: &str) -> Result<bool, StoreError> {
        let repo = self.repository()?;
        let status = status_with(&repo)?;

        if !status.conflicted.is_empty() {
            return Err(StoreError::UnresolvedConflicts {
                paths: status.conflicted,
            });
        }
        if status.is_clean() {
            log::debug!("working tree clean; nothing to commit");
            return Ok(false);
        }

        let mut index = repo.index().during("read index")?;
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .during("stage changes")?;
        // add_all only picks up paths that still exist on disk.
        for path in &status.missing {
            index
                .remove_path(Path::new(path))
                .during("stage deletion")?;
        }
        index.write().during("write index")?;

        let tree_id = index.write_tree().during("write tree")?;
        let head = repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .during("resolve HEAD")?;
        if head.tree_id() == tree_id {
            log::debug!("staged tree matches HEAD; nothing to commit");
            return Ok(false);
        }

        let tree = repo.find_tree(tree_id).during("find tree")?;
        let signature = self.signature(&repo)?;
        let oid = repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &[&head])
            .during("commit")?;

        log::info!("committed {}: {}", oid, message);
        Ok(true)
    }
}

pub(crate) fn status_with(repo: &git2::Repository) -> Result<WorkingTreeStatus, StoreError> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .renames_head_to_index(false);

    let statuses = repo.statuses(Some(&mut opts)).during("read status")?;
    let mut result = WorkingTreeStatus::default();

    for entry in statuses.iter() {
        let Some(path) = entry.path() else { continue };
        let path = path.to_string();
        let s = entry.status();

        if s.is_conflicted() {
            result.conflicted.push(path);
            continue;
        }
        if s.intersects(STAGED) {
            result.staged.push(path.clone());
        }
        if s.is_wt_new() {
            result.untracked.push(path);
        } else if s.is_wt_deleted() {
            result.missing.push(path);
        } else if s.intersects(MODIFIED) {
            result.modified.push(path);
        }
    }

    result.sort();
    Ok(result)
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

    mod status {
        use super::*;

        #[test]
        fn fresh_repository_is_clean() {
            let (_dir, store) = store();
            assert!(store.status().unwrap().is_clean());
        }

        #[test]
        fn classifies_paths() {
            let (dir, store) = store();
            fs::write(dir.path().join("kept.txt"), "1\n").unwrap();
            fs::write(dir.path().join("gone.txt"), "1\n").unwrap();
            store.commit_all("seed").unwrap();

            fs::write(dir.path().join("kept.txt"), "2\n").unwrap();
            fs::remove_file(dir.path().join("gone.txt")).unwrap();
            fs::write(dir.path().join("b-new.txt"), "n\n").unwrap();
            fs::write(dir.path().join("a-new.txt"), "n\n").unwrap();

            let status = store.status().unwrap();
            assert_eq!(status.untracked, ["a-new.txt", "b-new.txt"]);
            assert_eq!(status.modified, ["kept.txt"]);
            assert_eq!(status.missing, ["gone.txt"]);
            assert!(status.staged.is_empty());
            assert!(!status.is_clean());
        }

        #[test]
        fn ignored_files_are_hidden() {
            let (dir, store) = store();
            fs::write(dir.path().join("scratch.tmp"), "x").unwrap();
            assert!(store.status().unwrap().is_clean());
        }

        #[test]
        fn nested_untracked_files_are_listed() {
            let (dir, store) = store();
            fs::create_dir_all(dir.path().join("results")).unwrap();
            fs::write(dir.path().join("results/acm.bib"), "@article{}\n").unwrap();
            assert_eq!(store.status().unwrap().untracked, ["results/acm.bib"]);
        }
    }

    mod commit_all {
        use super::*;

        #[test]
        fn clean_tree_makes_no_commit() {
            let (_dir, store) = store();
            assert!(!store.commit_all("nothing").unwrap());
            assert_eq!(store.log(None, 10).unwrap().len(), 1);
        }

        #[test]
        fn commits_additions_modifications_and_deletions() {
            let (dir, store) = store();
            fs::write(dir.path().join("a.txt"), "a\n").unwrap();
            fs::write(dir.path().join("b.txt"), "b\n").unwrap();
            assert!(store.commit_all("add").unwrap());

            fs::write(dir.path().join("a.txt"), "a2\n").unwrap();
            fs::remove_file(dir.path().join("b.txt")).unwrap();
            assert!(store.commit_all("change").unwrap());

            assert!(store.status().unwrap().is_clean());
            let log = store.log(None, 10).unwrap();
            assert_eq!(log[0].summary, "change");
            assert_eq!(log[0].parents, vec![log[1].oid.clone()]);
        }

        #[test]
        fn second_commit_is_a_no_op() {
            let (dir, store) = store();
            fs::write(dir.path().join("a.txt"), "a\n").unwrap();
            assert!(store.commit_all("first").unwrap());
            assert!(!store.commit_all("second").unwrap());
        }

        #[test]
        fn reverting_to_head_content_makes_no_commit() {
            let (dir, store) = store();
            fs::write(dir.path().join("a.txt"), "a\n").unwrap();
            store.commit_all("first").unwrap();

            // Touch the index without changing content.
            fs::write(dir.path().join("a.txt"), "b\n").unwrap();
            let repo = git2::Repository::open(dir.path()).unwrap();
            let mut index = repo.index().unwrap();
            index.add_path(Path::new("a.txt")).unwrap();
            index.write().unwrap();
            fs::write(dir.path().join("a.txt"), "a\n").unwrap();

            assert!(!store.commit_all("noop").unwrap());
        }
    }
}
