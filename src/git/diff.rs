//! git::diff
//!
//! Patch generation between a branch head and its first parent.
//!
//! # Wire format
//!
//! A [`Patch`] is git-style unified diff text: `diff --git` headers,
//! whole-file hunks against `/dev/null` for additions and deletions,
//! context-bounded hunks for modifications, and `GIT binary patch`
//! sections for binary content. A text file whose bytes are not valid
//! UTF-8 is sent as a binary section so the patch itself stays UTF-8.
//! libgit2 iterates deltas in path order, so the same two trees always
//! serialise to the same bytes.

use std::fmt;
use std::path::Path;

use git2::DiffOptions;

use super::branches::find_local;
use super::errors::{GitResultExt, StoreError};
use super::repository::GitStore;
use crate::core::types::BranchName;

/// Unified-diff text describing a change set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Patch(String);

impl Patch {
    /// Wrap existing diff text, e.g. read from a file.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A patch with no content (whitespace only counts as empty).
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Paths touched by the patch, in patch order.
    ///
    /// The text is parsed as a diff, so quoted headers and binary sections
    /// are handled the same way `apply` sees them. Each delta reports its
    /// post-image path. Text that does not parse has no paths.
    pub fn paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        if self.is_empty() {
            return paths;
        }
        let Ok(diff) = git2::Diff::from_buffer(self.0.as_bytes()) else {
            return paths;
        };
        for delta in diff.deltas() {
            if let Some(path) = delta.new_file().path().or(delta.old_file().path()) {
                paths.push(path.to_string_lossy().into_owned());
            }
        }
        paths
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Patch {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl AsRef<str> for Patch {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl GitStore {
    /// Diff the head of `branch` against its first parent.
    ///
    /// Returns an empty patch when the branch does not exist or its head
    /// has no parent. Does not touch HEAD or the working tree.
    pub fn diff_head_against_parent(&self, branch: &BranchName) -> Result<Patch, StoreError> {
        let repo = self.repository()?;

        let Some(found) = find_local(&repo, branch)? else {
            log::debug!("no branch {}; empty patch", branch);
            return Ok(Patch::empty());
        };
        let head = found.get().peel_to_commit().during("resolve branch")?;
        let parent = match head.parent(0) {
            Ok(parent) => parent,
            Err(_) => {
                log::debug!("{} has no parent commit; empty patch", branch);
                return Ok(Patch::empty());
            }
        };

        let old_tree = parent.tree().during("read parent tree")?;
        let new_tree = head.tree().during("read head tree")?;

        let diff = repo
            .diff_tree_to_tree(
                Some(&old_tree),
                Some(&new_tree),
                Some(&mut self.diff_options()),
            )
            .during("diff trees")?;

        let mut text = String::new();
        for idx in 0..diff.deltas().len() {
            match String::from_utf8(delta_text(&diff, idx)?) {
                Ok(section) => text.push_str(&section),
                Err(_) => {
                    let Some(path) = diff.get_delta(idx).and_then(|delta| {
                        delta
                            .new_file()
                            .path()
                            .or(delta.old_file().path())
                            .map(Path::to_path_buf)
                    }) else {
                        continue;
                    };
                    log::debug!("{} is not UTF-8 text; encoding it as binary", path.display());
                    let mut opts = self.diff_options();
                    opts.force_binary(true)
                        .disable_pathspec_match(true)
                        .pathspec(path.as_path());
                    let forced = repo
                        .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), Some(&mut opts))
                        .during("diff trees")?;
                    for forced_idx in 0..forced.deltas().len() {
                        let bytes = delta_text(&forced, forced_idx)?;
                        let section = String::from_utf8(bytes).map_err(|e| StoreError::Toolchain {
                            context: "serialise diff".to_string(),
                            message: format!("patch is not valid UTF-8: {}", e),
                        })?;
                        text.push_str(&section);
                    }
                }
            }
        }
        Ok(Patch(text))
    }

    /// Whether `paths` have the same content on the tips of `left` and
    /// `right`.
    ///
    /// A path absent from both tips counts as equal. If either branch is
    /// missing the answer is `false`.
    pub fn same_content(
        &self,
        left: &BranchName,
        right: &BranchName,
        paths: &[String],
    ) -> Result<bool, StoreError> {
        let repo = self.repository()?;
        let (Some(left), Some(right)) = (find_local(&repo, left)?, find_local(&repo, right)?)
        else {
            return Ok(false);
        };
        let left_tree = left.get().peel_to_tree().during("read tree")?;
        let right_tree = right.get().peel_to_tree().during("read tree")?;

        for path in paths {
            if entry_id(&left_tree, path)? != entry_id(&right_tree, path)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn diff_options(&self) -> DiffOptions {
        let mut opts = DiffOptions::new();
        opts.context_lines(self.settings().context_lines)
            .show_binary(true);
        opts
    }
}

fn entry_id(tree: &git2::Tree<'_>, path: &str) -> Result<Option<git2::Oid>, StoreError> {
    match tree.get_path(Path::new(path)) {
        Ok(entry) => Ok(Some(entry.id())),
        Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
        Err(e) => Err(StoreError::git("read tree entry", e)),
    }
}

/// Patch text for delta `idx`, headers included.
fn delta_text(diff: &git2::Diff<'_>, idx: usize) -> Result<Vec<u8>, StoreError> {
    match git2::Patch::from_diff(diff, idx).during("serialise diff")? {
        Some(mut patch) => Ok(patch.to_buf().during("serialise diff")?.to_vec()),
        None => Ok(Vec::new()),
    }
}
