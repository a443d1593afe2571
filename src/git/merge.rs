//! git::merge
//!
//! Branch integration.
//!
//! # Protocol
//!
//! [`GitStore::merge`] records the checked-out branch, switches to the
//! target, integrates the source and switches back, whatever happened in
//! between. Integration itself runs in memory first: a conflicting merge
//! is reported without writing anything to the index or working tree.
//! There is no automatic conflict resolution.

use git2::build::CheckoutBuilder;
use git2::Repository;

use super::branches::{checkout_with, current_with, find_local};
use super::errors::{GitResultExt, StoreError};
use super::repository::{to_oid, GitStore};
use crate::core::types::{BranchName, Oid};

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The source branch does not exist.
    NothingToMerge,
    /// The target already contains the source.
    UpToDate,
    /// The target was moved forward to the source tip.
    FastForward(Oid),
    /// A two-parent merge commit was created.
    Merged(Oid),
}

impl MergeOutcome {
    /// The commit the target now points at, if it moved.
    pub fn commit(&self) -> Option<&Oid> {
        match self {
            MergeOutcome::FastForward(oid) | MergeOutcome::Merged(oid) => Some(oid),
            MergeOutcome::NothingToMerge | MergeOutcome::UpToDate => None,
        }
    }
}

impl std::fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeOutcome::NothingToMerge => write!(f, "nothing to merge"),
            MergeOutcome::UpToDate => write!(f, "already up to date"),
            MergeOutcome::FastForward(oid) => write!(f, "fast-forward to {}", oid.short(7)),
            MergeOutcome::Merged(oid) => write!(f, "merge commit {}", oid.short(7)),
        }
    }
}

/// Fixed message for merge commits.
pub fn merge_message(source: &str, target: &BranchName) -> String {
    format!("Merge branch '{}' into {}", source, target)
}

impl GitStore {
    /// Merge `source` into `target`, creating `target` from HEAD if needed.
    ///
    /// The originally checked-out branch is restored afterwards, on success
    /// and on failure alike.
    ///
    /// # Errors
    ///
    /// [`StoreError::MergeConflict`] when the branches conflict; the
    /// repository is left as it was before the call.
    pub fn merge(
        &self,
        target: &BranchName,
        source: &BranchName,
    ) -> Result<MergeOutcome, StoreError> {
        let repo = self.repository()?;

        let Some(found) = find_local(&repo, source)? else {
            log::info!("branch {} does not exist; nothing to merge", source);
            return Ok(MergeOutcome::NothingToMerge);
        };
        let source_tip = found.get().peel_to_commit().during("resolve source")?.id();
        let original = current_with(&repo)?;

        let result = checkout_with(&repo, target).and_then(|()| {
            self.merge_into_head(
                &repo,
                source_tip,
                &merge_message(source.as_str(), target),
                |paths| StoreError::MergeConflict {
                    source_branch: source.clone(),
                    target: target.clone(),
                    paths,
                },
            )
        });

        if let Err(restore) = checkout_with(&repo, &original) {
            log::warn!("could not return to {} after merge: {}", original, restore);
            result?;
            return Err(restore);
        }

        let outcome = result?;
        log::info!("merged {} into {}: {}", source, target, outcome);
        Ok(outcome)
    }

    /// Integrate commit `theirs` into the checked-out branch.
    ///
    /// Shared by `merge` and `pull`. `conflict` builds the error reported
    /// for conflicting paths.
    pub(crate) fn merge_into_head(
        &self,
        repo: &Repository,
        theirs: git2::Oid,
        message: &str,
        conflict: impl FnOnce(Vec<String>) -> StoreError,
    ) -> Result<MergeOutcome, StoreError> {
        let annotated = repo
            .find_annotated_commit(theirs)
            .during("look up merge source")?;
        let (analysis, _) = repo
            .merge_analysis(&[&annotated])
            .during("analyse merge")?;

        if analysis.is_up_to_date() {
            return Ok(MergeOutcome::UpToDate);
        }

        let head = repo.head().during("read HEAD")?;
        let ours = head.peel_to_commit().during("resolve HEAD")?;

        if analysis.is_fast_forward() {
            let target = repo.find_object(theirs, None).during("find merge source")?;
            repo.checkout_tree(&target, Some(CheckoutBuilder::new().safe()))
                .during("fast-forward checkout")?;
            let refname = head.name().ok_or(StoreError::DetachedHead)?.to_string();
            repo.find_reference(&refname)
                .and_then(|mut r| r.set_target(theirs, message))
                .during("fast-forward")?;
            return Ok(MergeOutcome::FastForward(to_oid(theirs)?));
        }

        let their_commit = repo.find_commit(theirs).during("find merge source")?;
        let mut index = repo
            .merge_commits(&ours, &their_commit, None)
            .during("merge")?;

        if index.has_conflicts() {
            return Err(conflict(conflicted_paths(&index)?));
        }

        let tree_id = index.write_tree_to(repo).during("write merge tree")?;
        let tree = repo.find_tree(tree_id).during("find merge tree")?;
        repo.checkout_tree(tree.as_object(), Some(CheckoutBuilder::new().safe()))
            .during("merge checkout")?;

        let signature = self.signature(repo)?;
        let oid = repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                message,
                &tree,
                &[&ours, &their_commit],
            )
            .during("merge commit")?;
        Ok(MergeOutcome::Merged(to_oid(oid)?))
    }
}

fn conflicted_paths(index: &git2::Index) -> Result<Vec<String>, StoreError> {
    let mut paths = Vec::new();
    for conflict in index.conflicts().during("read conflicts")? {
        let conflict = conflict.during("read conflict")?;
        let entry = conflict.our.or(conflict.their).or(conflict.ancestor);
        if let Some(entry) = entry {
            paths.push(String::from_utf8_lossy(&entry.path).into_owned());
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}
