//! git::apply
//!
//! Applying a [`Patch`] onto the checked-out branch and committing it.

use git2::build::CheckoutBuilder;
use git2::{ApplyLocation, Diff, Repository};

use super::diff::Patch;
use super::errors::{GitResultExt, StoreError};
use super::repository::GitStore;

impl GitStore {
    /// Apply `patch` to the index and working tree, then commit it.
    ///
    /// Returns `false` for an empty patch, `true` once the commit exists.
    ///
    /// # Errors
    ///
    /// [`StoreError::PatchRejected`] if the patch is malformed or does not
    /// apply cleanly; nothing on disk changes in that case. If the commit
    /// itself fails, the touched paths are restored from HEAD before the
    /// error is returned.
    pub fn apply_patch(&self, patch: &Patch, message: &str) -> Result<bool, StoreError> {
        if patch.is_empty() {
            log::debug!("empty patch; nothing to apply");
            return Ok(false);
        }

        let repo = self.repository()?;
        let diff = Diff::from_buffer(patch.as_str().as_bytes()).map_err(rejected)?;
        if diff.deltas().len() == 0 {
            return Err(StoreError::PatchRejected {
                message: "no file changes found in patch".to_string(),
            });
        }
        repo.apply(&diff, ApplyLocation::Both, None)
            .map_err(|e| match e.class() {
                git2::ErrorClass::Patch => rejected(e),
                _ if e.code() == git2::ErrorCode::ApplyFail => rejected(e),
                _ => StoreError::git("apply patch", e),
            })?;

        if let Err(err) = self.commit_applied(&repo, message) {
            let paths = patch.paths();
            if let Err(restore) = restore_from_head(&repo, &paths) {
                log::warn!(
                    "could not restore {} after failed commit: {}",
                    paths.join(", "),
                    restore
                );
            }
            return Err(err);
        }
        Ok(true)
    }

    fn commit_applied(&self, repo: &Repository, message: &str) -> Result<(), StoreError> {
        let mut index = repo.index().during("read index")?;
        let tree_id = index.write_tree().during("write tree")?;
        let tree = repo.find_tree(tree_id).during("find tree")?;
        let head = repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .during("resolve HEAD")?;

        let signature = self.signature(repo)?;
        let oid = repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &[&head])
            .during("commit patch")?;

        log::info!("applied patch as {}: {}", oid, message);
        Ok(())
    }
}

fn rejected(err: git2::Error) -> StoreError {
    StoreError::PatchRejected {
        message: err.message().to_string(),
    }
}

/// Put `paths` back to their HEAD state in both index and working tree.
fn restore_from_head(repo: &Repository, paths: &[String]) -> Result<(), StoreError> {
    if paths.is_empty() {
        return Ok(());
    }

    let head = repo
        .head()
        .and_then(|h| h.peel(git2::ObjectType::Commit))
        .during("resolve HEAD")?;
    repo.reset_default(Some(&head), paths.iter())
        .during("restore index")?;

    // Paths the patch added are untracked now and get removed here.
    let mut opts = CheckoutBuilder::new();
    opts.force().remove_untracked(true);
    for path in paths {
        opts.path(path);
    }
    repo.checkout_head(Some(&mut opts))
        .during("restore working tree")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::StoreSettings;
    use crate::core::types::BranchName;
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

    /// Commit `file` on a side branch and return the resulting patch,
    /// leaving `main` checked out.
    fn side_patch(dir: &TempDir, store: &GitStore, file: &str, contents: &str) -> Patch {
        store.checkout(&branch("side")).unwrap();
        fs::write(dir.path().join(file), contents).unwrap();
        store.commit_all("side change").unwrap();
        store.checkout(&branch("main")).unwrap();
        store.diff_head_against_parent(&branch("side")).unwrap()
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let (_dir, store) = store();
        assert!(!store.apply_patch(&Patch::empty(), "nothing").unwrap());
        assert_eq!(store.log(None, 10).unwrap().len(), 1);
    }

    #[test]
    fn applies_and_commits() {
        let (dir, store) = store();
        let patch = side_patch(&dir, &store, "A.txt", "alpha\n");
        assert!(!dir.path().join("A.txt").exists());

        assert!(store.apply_patch(&patch, "Integrate side").unwrap());

        assert_eq!(fs::read_to_string(dir.path().join("A.txt")).unwrap(), "alpha\n");
        assert!(store.status().unwrap().is_clean());
        let log = store.log(None, 1).unwrap();
        assert_eq!(log[0].summary, "Integrate side");
        assert_eq!(log[0].parents.len(), 1);
    }

    #[test]
    fn malformed_patch_is_rejected() {
        let (_dir, store) = store();
        for text in ["this is not a patch\n", "diff --git a/x\n@@ garbage @@\n"] {
            let err = store.apply_patch(&Patch::new(text), "bad").unwrap_err();
            assert!(matches!(err, StoreError::PatchRejected { .. }), "{text:?}");
        }
        assert!(store.status().unwrap().is_clean());
        assert_eq!(store.log(None, 10).unwrap().len(), 1);
    }

    #[test]
    fn conflicting_patch_leaves_tree_unchanged() {
        let (dir, store) = store();
        let file = dir.path().join("data.txt");
        fs::write(&file, "1\n2\n3\n").unwrap();
        store.commit_all("base").unwrap();

        let patch = side_patch(&dir, &store, "data.txt", "1\nside\n3\n");

        fs::write(&file, "1\nmain\n3\n").unwrap();
        store.commit_all("main change").unwrap();
        let before = store.log(None, 10).unwrap();

        let err = store.apply_patch(&patch, "should fail").unwrap_err();
        assert!(matches!(err, StoreError::PatchRejected { .. }));
        assert_eq!(fs::read_to_string(&file).unwrap(), "1\nmain\n3\n");
        assert!(store.status().unwrap().is_clean());
        assert_eq!(store.log(None, 10).unwrap(), before);
    }

    #[test]
    fn restore_from_head_drops_added_paths() {
        let (dir, store) = store();
        let patch = side_patch(&dir, &store, "new.txt", "n\n");
        let repo = store.repository().unwrap();
        let diff = Diff::from_buffer(patch.as_str().as_bytes()).unwrap();
        repo.apply(&diff, ApplyLocation::Both, None).unwrap();
        assert!(dir.path().join("new.txt").exists());

        restore_from_head(&repo, &patch.paths()).unwrap();

        assert!(!dir.path().join("new.txt").exists());
        assert!(store.status().unwrap().is_clean());
    }
}
