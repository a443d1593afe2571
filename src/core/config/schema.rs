//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$STUDYREPO_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/studyrepo/config.toml`
//! 3. `~/.studyrepo/config.toml` (canonical write location)
//!
//! # Repo Config
//!
//! Located at `.git/studyrepo/config.toml`.
//!
//! # Validation
//!
//! Values are validated after parsing: branch names must be valid Git
//! branches, the remote alias must be non-empty.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// remote = "origin"
///
/// [author]
/// name = "Review Bot"
/// email = "review-bot@example.org"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Fallback commit identity
    pub author: Option<AuthorConfig>,

    /// Remote alias used when the repo config does not name one
    pub remote: Option<String>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_remote(self.remote.as_deref())?;
        if let Some(author) = &self.author {
            author.validate()?;
        }
        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// default_branch = "main"
/// results_branch = "results"
/// search_branch_prefix = "search/"
/// remote = "upstream"
///
/// [diff]
/// context_lines = 3
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Branch created by bootstrap
    pub default_branch: Option<String>,

    /// Long-lived branch results are integrated into
    pub results_branch: Option<String>,

    /// Prefix for per-database search branches
    pub search_branch_prefix: Option<String>,

    /// Remote name (default: "origin")
    pub remote: Option<String>,

    /// Patch generation settings
    pub diff: Option<DiffConfig>,
}

impl RepoConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("default_branch", &self.default_branch),
            ("results_branch", &self.results_branch),
        ] {
            if let Some(branch) = value {
                BranchName::new(branch.as_str())
                    .map_err(|e| ConfigError::InvalidValue(format!("{}: {}", key, e)))?;
            }
        }

        // The prefix alone is not a branch; check it with a sample database.
        if let Some(prefix) = &self.search_branch_prefix {
            BranchName::for_database(prefix, "sample").map_err(|e| {
                ConfigError::InvalidValue(format!("search_branch_prefix: {}", e))
            })?;
        }

        validate_remote(self.remote.as_deref())
    }
}

/// Commit identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl AuthorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.as_deref() == Some("") || self.email.as_deref() == Some("") {
            return Err(ConfigError::InvalidValue(
                "author name and email cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Patch generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DiffConfig {
    /// Context lines around modified hunks
    pub context_lines: Option<u32>,
}

fn validate_remote(remote: Option<&str>) -> Result<(), ConfigError> {
    match remote {
        Some(r) if r.trim().is_empty() => Err(ConfigError::InvalidValue(
            "remote cannot be empty".to_string(),
        )),
        _ => Ok(()),
    }
}
