//! git::remote
//!
//! Fetch, pull and push.
//!
//! # Failure model
//!
//! Remote work is best effort. A remote that is not configured yields
//! [`SyncOutcome::Skipped`]; a remote that fails (network, credentials,
//! rejected update) yields [`SyncOutcome::Failed`] and a warning in the
//! log. Only local problems surface as `Err`, so an offline crawl still
//! commits and merges.

use git2::{Cred, ErrorCode, FetchOptions, PushOptions, Remote, RemoteCallbacks, Repository};

use super::branches::{current_with, find_local};
use super::errors::{GitResultExt, RemoteError, StoreError};
use super::repository::GitStore;
use crate::core::types::BranchName;

/// How a remote operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed,
    /// Nothing to do; the reason is human readable.
    Skipped(String),
    /// The remote could not be reached or refused the operation.
    Failed(RemoteError),
}

impl SyncOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SyncOutcome::Completed)
    }
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncOutcome::Completed => write!(f, "completed"),
            SyncOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
            SyncOutcome::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

impl GitStore {
    /// Fetch `remote_name` using its configured refspecs.
    pub fn fetch(&self, remote_name: &str) -> Result<SyncOutcome, StoreError> {
        let repo = self.repository()?;
        self.fetch_with(&repo, remote_name)
    }

    /// Fetch the configured remote and integrate the upstream of the
    /// checked-out branch.
    ///
    /// The upstream is the branch's configured upstream, falling back to
    /// `refs/remotes/<remote>/<branch>`. Integration fast-forwards when it
    /// can and otherwise creates a merge commit.
    ///
    /// # Errors
    ///
    /// [`StoreError::MergeConflict`] if the upstream conflicts with local
    /// commits; nothing is written in that case.
    pub fn pull(&self) -> Result<SyncOutcome, StoreError> {
        let repo = self.repository()?;
        let remote_name = self.settings().remote.as_str();

        match self.fetch_with(&repo, remote_name)? {
            SyncOutcome::Completed => {}
            other => return Ok(other),
        }

        let branch = current_with(&repo)?;
        let Some((tracking, upstream)) = upstream_of(&repo, remote_name, &branch)? else {
            log::debug!("{} has no upstream on {}; nothing to pull", branch, remote_name);
            return Ok(SyncOutcome::Skipped(format!(
                "{} has no upstream on {}",
                branch, remote_name
            )));
        };

        let source = BranchName::new(tracking.as_str())?;
        let outcome = self.merge_into_head(
            &repo,
            upstream,
            &format!("Merge remote-tracking branch '{}' into {}", tracking, branch),
            |paths| StoreError::MergeConflict {
                source_branch: source,
                target: branch.clone(),
                paths,
            },
        )?;

        log::info!("pulled {} into {}: {}", tracking, branch, outcome);
        Ok(SyncOutcome::Completed)
    }

    /// Push the checked-out branch to the same name on the configured remote.
    pub fn push(&self) -> Result<SyncOutcome, StoreError> {
        let repo = self.repository()?;
        let remote_name = self.settings().remote.as_str();

        let mut remote = match find_remote(&repo, remote_name)? {
            Ok(remote) => remote,
            Err(skipped) => return Ok(skipped),
        };
        let branch = current_with(&repo)?;
        let refspec = format!("{0}:{0}", branch.refname());

        let mut rejection: Option<(String, String)> = None;
        let pushed = {
            let mut callbacks = self.callbacks();
            callbacks.push_update_reference(|refname, status| {
                if let Some(message) = status {
                    rejection = Some((refname.to_string(), message.to_string()));
                }
                Ok(())
            });
            let mut opts = PushOptions::new();
            opts.remote_callbacks(callbacks);
            remote.push(&[refspec.as_str()], Some(&mut opts))
        };

        if let Err(e) = pushed {
            return Ok(failed(RemoteError::from_git2(remote_name, &e)));
        }
        if let Some((refname, message)) = rejection {
            return Ok(failed(RemoteError::Rejected {
                remote: remote_name.to_string(),
                refname,
                message,
            }));
        }

        log::info!("pushed {} to {}", branch, remote_name);
        Ok(SyncOutcome::Completed)
    }

    fn fetch_with(&self, repo: &Repository, remote_name: &str) -> Result<SyncOutcome, StoreError> {
        let mut remote = match find_remote(repo, remote_name)? {
            Ok(remote) => remote,
            Err(skipped) => return Ok(skipped),
        };

        let mut opts = FetchOptions::new();
        opts.remote_callbacks(self.callbacks());
        match remote.fetch::<&str>(&[], Some(&mut opts), None) {
            Ok(()) => {
                log::debug!("fetched {}", remote_name);
                Ok(SyncOutcome::Completed)
            }
            Err(e) => Ok(failed(RemoteError::from_git2(remote_name, &e))),
        }
    }

    /// Credential callbacks for one transport call.
    ///
    /// Offers the configured credentials once; a second request means they
    /// were refused, and answering it again would loop.
    fn callbacks<'a>(&self) -> RemoteCallbacks<'a> {
        let credentials = self.settings().credentials.clone();
        let mut attempted = false;

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |_url, _username, _allowed| {
            if attempted {
                return Err(git2::Error::new(
                    ErrorCode::Auth,
                    git2::ErrorClass::Callback,
                    "credentials were rejected",
                ));
            }
            attempted = true;
            match &credentials {
                Some(c) => Cred::userpass_plaintext(&c.username, c.token()),
                None => Cred::default(),
            }
        });
        callbacks
    }
}

fn failed(err: RemoteError) -> SyncOutcome {
    log::warn!("{}", err);
    SyncOutcome::Failed(err)
}

/// Look up a remote; a missing one becomes a `Skipped` outcome.
fn find_remote<'r>(
    repo: &'r Repository,
    name: &str,
) -> Result<Result<Remote<'r>, SyncOutcome>, StoreError> {
    match repo.find_remote(name) {
        Ok(remote) => Ok(Ok(remote)),
        Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) => {
            log::debug!("remote {} is not configured", name);
            Ok(Err(SyncOutcome::Skipped(format!(
                "remote '{}' is not configured",
                name
            ))))
        }
        Err(e) => Err(StoreError::git("find remote", e)),
    }
}

/// Short tracking name and tip of the upstream of `branch`, if any.
fn upstream_of(
    repo: &Repository,
    remote_name: &str,
    branch: &BranchName,
) -> Result<Option<(String, git2::Oid)>, StoreError> {
    if let Some(local) = find_local(repo, branch)? {
        if let Ok(upstream) = local.upstream() {
            let name = upstream.name().during("read upstream name")?;
            if let (Some(name), Some(tip)) = (name, upstream.get().target()) {
                return Ok(Some((name.to_string(), tip)));
            }
        }
    }

    let fallback = format!("refs/remotes/{}/{}", remote_name, branch);
    match repo.refname_to_id(&fallback) {
        Ok(tip) => Ok(Some((format!("{}/{}", remote_name, branch), tip))),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(StoreError::git("resolve upstream", e)),
    }
}
