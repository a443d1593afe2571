//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Two configuration scopes:
//! - **Global**: user-level settings (commit identity, default remote)
//! - **Repo**: per-study settings (branch names, remote, patch context)
//!
//! # Precedence
//!
//! Later overrides earlier:
//! 1. Default values ([`StoreSettings::default`])
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! Credentials are never read from config files. They come from the
//! environment once, in the binary, and are passed to
//! [`Config::store_settings`].
//!
//! # Example
//!
//! ```no_run
//! use studyrepo::core::config::Config;
//! use studyrepo::core::settings::Credentials;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/study"))).unwrap();
//! let settings = result.config.store_settings(Credentials::from_env()).unwrap();
//! println!("results go to {}", settings.results_branch);
//! ```

pub mod schema;

pub use schema::{AuthorConfig, DiffConfig, GlobalConfig, RepoConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::settings::{Author, Credentials, StoreSettings};
use crate::core::types::BranchName;

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "STUDYREPO_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Files that were read, global first.
    pub sources: Vec<PathBuf>,
}

/// Merged configuration from all sources.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    pub repo: Option<RepoConfig>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `repo_path` is provided, also loads that study's repo config.
    /// Missing files are not an error; unparseable or invalid ones are.
    pub fn load(repo_path: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut sources = Vec::new();

        let global = match Self::global_candidates().into_iter().find(|p| p.exists()) {
            Some(path) => {
                let config: GlobalConfig = read_toml(&path)?;
                sources.push(path);
                config
            }
            None => GlobalConfig::default(),
        };
        global.validate()?;

        let repo = match repo_path.map(Self::repo_config_path) {
            Some(path) if path.exists() => {
                let config: RepoConfig = read_toml(&path)?;
                config.validate()?;
                sources.push(path);
                Some(config)
            }
            _ => None,
        };

        Ok(ConfigLoadResult {
            config: Config { global, repo },
            sources,
        })
    }

    /// Global config locations, in search order.
    fn global_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            candidates.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            candidates.push(PathBuf::from(xdg_home).join("studyrepo/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".studyrepo/config.toml"));
        }
        candidates
    }

    /// Canonical global config path, `~/.studyrepo/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".studyrepo/config.toml"))
    }

    /// Repo config path, `.git/studyrepo/config.toml` under the study root.
    pub fn repo_config_path(repo_path: &Path) -> PathBuf {
        repo_path.join(".git/studyrepo/config.toml")
    }

    /// Write repo config atomically (temp file, then rename).
    pub fn write_repo(repo_path: &Path, config: &RepoConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::repo_config_path(repo_path);
        write_toml_atomic(&path, config)?;
        Ok(path)
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    fn repo_value<T>(&self, pick: impl Fn(&RepoConfig) -> Option<T>) -> Option<T> {
        self.repo.as_ref().and_then(pick)
    }

    /// Remote alias: repo, then global, then `origin`.
    pub fn remote(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.remote.as_deref())
            .or(self.global.remote.as_deref())
            .unwrap_or(StoreSettings::REMOTE)
    }

    /// Resolve everything into the explicit settings value for a store.
    ///
    /// Branch names were validated at load time, so conversion failures
    /// here only arise for configs built by hand and are reported as
    /// [`ConfigError::InvalidValue`].
    pub fn store_settings(
        &self,
        credentials: Option<Credentials>,
    ) -> Result<StoreSettings, ConfigError> {
        let mut settings = StoreSettings::default();

        if let Some(name) = self.repo_value(|r| r.default_branch.clone()) {
            settings.default_branch = parse_branch("default_branch", name)?;
        }
        if let Some(name) = self.repo_value(|r| r.results_branch.clone()) {
            settings.results_branch = parse_branch("results_branch", name)?;
        }
        if let Some(prefix) = self.repo_value(|r| r.search_branch_prefix.clone()) {
            settings.search_branch_prefix = prefix;
        }
        if let Some(lines) = self.repo_value(|r| r.diff.as_ref().and_then(|d| d.context_lines)) {
            settings.context_lines = lines;
        }
        settings.remote = self.remote().to_string();

        if let Some(author) = &self.global.author {
            let fallback = Author::default();
            settings.author = Author {
                name: author.name.clone().unwrap_or(fallback.name),
                email: author.email.clone().unwrap_or(fallback.email),
            };
        }

        Ok(settings.with_credentials(credentials))
    }
}

fn parse_branch(key: &str, name: String) -> Result<BranchName, ConfigError> {
    BranchName::new(name).map_err(|e| ConfigError::InvalidValue(format!("{}: {}", key, e)))
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError {
    let path = path.to_path_buf();
    move |source| ConfigError::WriteError { path, source }
}

fn write_toml_atomic<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error(path))?;
    }

    let contents =
        toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

    let temp_path = path.with_extension("toml.tmp");
    let mut file = fs::File::create(&temp_path).map_err(write_error(&temp_path))?;
    file.write_all(contents.as_bytes())
        .map_err(write_error(&temp_path))?;
    file.sync_all().map_err(write_error(&temp_path))?;

    fs::rename(&temp_path, path).map_err(write_error(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_repo_file(root: &Path, contents: &str) {
        let path = Config::repo_config_path(root);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn missing_repo_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            global: GlobalConfig::default(),
            repo: None,
        };
        let settings = config.store_settings(None).unwrap();

        assert_eq!(settings.default_branch.as_str(), "main");
        assert_eq!(settings.remote, "origin");
        assert!(!Config::repo_config_path(temp.path()).exists());
    }

    #[test]
    fn load_repo_config() {
        let temp = TempDir::new().unwrap();
        write_repo_file(
            temp.path(),
            r#"
            results_branch = "integrated"
            remote = "upstream"

            [diff]
            context_lines = 0
            "#,
        );

        let result = Config::load(Some(temp.path())).unwrap();
        let settings = result.config.store_settings(None).unwrap();

        assert_eq!(settings.results_branch.as_str(), "integrated");
        assert_eq!(settings.remote, "upstream");
        assert_eq!(settings.context_lines, 0);
        assert!(result
            .sources
            .iter()
            .any(|p| p.ends_with("studyrepo/config.toml")));
    }

    #[test]
    fn invalid_repo_config_fails_load() {
        let temp = TempDir::new().unwrap();
        write_repo_file(temp.path(), "default_branch = \"a..b\"");
        assert!(Config::load(Some(temp.path())).is_err());
    }

    #[test]
    fn unparseable_repo_config_fails_load() {
        let temp = TempDir::new().unwrap();
        write_repo_file(temp.path(), "default_branch = ");
        let err = Config::load(Some(temp.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn repo_remote_overrides_global() {
        let config = Config {
            global: GlobalConfig {
                remote: Some("mirror".to_string()),
                ..Default::default()
            },
            repo: Some(RepoConfig {
                remote: Some("upstream".to_string()),
                ..Default::default()
            }),
        };
        assert_eq!(config.remote(), "upstream");

        let global_only = Config {
            repo: None,
            ..config
        };
        assert_eq!(global_only.remote(), "mirror");
    }

    #[test]
    fn global_author_fills_missing_parts() {
        let config = Config {
            global: GlobalConfig {
                author: Some(AuthorConfig {
                    name: Some("Review Bot".to_string()),
                    email: None,
                }),
                ..Default::default()
            },
            repo: None,
        };
        let settings = config.store_settings(None).unwrap();
        assert_eq!(settings.author.name, "Review Bot");
        assert_eq!(settings.author.email, Author::default().email);
    }

    #[test]
    fn credentials_are_passed_through() {
        let settings = Config::default()
            .store_settings(Some(Credentials::new("bot", "token")))
            .unwrap();
        assert_eq!(settings.credentials.unwrap().username, "bot");
    }

    #[test]
    fn write_repo_config_atomic() {
        let temp = TempDir::new().unwrap();
        let config = RepoConfig {
            results_branch: Some("collected".to_string()),
            ..Default::default()
        };

        let path = Config::write_repo(temp.path(), &config).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("toml.tmp").exists());

        let loaded = Config::load(Some(temp.path())).unwrap();
        assert_eq!(
            loaded.config.repo.unwrap().results_branch.as_deref(),
            Some("collected")
        );
    }

    #[test]
    fn write_rejects_invalid_config() {
        let temp = TempDir::new().unwrap();
        let config = RepoConfig {
            remote: Some(String::new()),
            ..Default::default()
        };
        assert!(Config::write_repo(temp.path(), &config).is_err());
    }
}
