//! core::settings
//!
//! The explicit runtime configuration handed to [`crate::git::GitStore`].
//!
//! # Design
//!
//! Nothing below the binary reads the environment or a config file on its
//! own. [`crate::core::config::Config`] resolves files into a
//! [`StoreSettings`], the binary adds [`Credentials`] read once from the
//! environment, and the value is passed into the store's constructor.

use crate::core::types::BranchName;

/// Environment variable holding the remote username.
pub const USER_ENV: &str = "STUDYREPO_GIT_USER";

/// Environment variable holding the remote token or password.
pub const TOKEN_ENV: &str = "STUDYREPO_GIT_TOKEN";

/// Username/token pair used for remote transport.
///
/// The token is never printed; `Debug` redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    token: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    /// Read credentials from [`USER_ENV`] and [`TOKEN_ENV`].
    ///
    /// Returns `None` unless both are set and non-empty. Call this once per
    /// process, at the binary boundary.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let username = lookup(USER_ENV).filter(|v| !v.is_empty())?;
        let token = lookup(TOKEN_ENV).filter(|v| !v.is_empty())?;
        Some(Self::new(username, token))
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Identity used for commits the store creates.
///
/// Only a fallback: the repository's own `user.name`/`user.email` wins
/// when configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            name: "studyrepo".to_string(),
            email: "studyrepo@localhost".to_string(),
        }
    }
}

/// Runtime settings for a [`crate::git::GitStore`].
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Branch HEAD points at in a freshly bootstrapped repository.
    pub default_branch: BranchName,
    /// Long-lived branch crawl results are integrated into.
    pub results_branch: BranchName,
    /// Prefix for per-database search branches.
    pub search_branch_prefix: String,
    /// Remote alias used by pull and push.
    pub remote: String,
    /// Context lines around modified hunks in generated patches.
    pub context_lines: u32,
    pub author: Author,
    pub credentials: Option<Credentials>,
}

impl StoreSettings {
    pub const DEFAULT_BRANCH: &'static str = "main";
    pub const RESULTS_BRANCH: &'static str = "results";
    pub const SEARCH_PREFIX: &'static str = "search/";
    pub const REMOTE: &'static str = "origin";
    pub const CONTEXT_LINES: u32 = 3;

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            default_branch: BranchName::known_valid(Self::DEFAULT_BRANCH),
            results_branch: BranchName::known_valid(Self::RESULTS_BRANCH),
            search_branch_prefix: Self::SEARCH_PREFIX.to_string(),
            remote: Self::REMOTE.to_string(),
            context_lines: Self::CONTEXT_LINES,
            author: Author::default(),
            credentials: None,
        }
    }
}
