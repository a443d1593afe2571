//! cli
//!
//! Command-line interface layer for studyrepo.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Read credentials from the environment, once
//! - Resolve configuration into [`StoreSettings`]
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers open a [`GitStore`] or a
//! [`crate::study::Crawler`] through the [`Context`] and format what comes
//! back; every repository change happens inside those types.

pub mod args;
pub mod commands;

pub use args::Cli;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::core::settings::{Credentials, StoreSettings};
use crate::git::GitStore;
use crate::ui::output::Verbosity;

/// Execution context shared by all command handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory the command operates on
    pub cwd: PathBuf,
    pub verbosity: Verbosity,
    /// Remote credentials, read from the environment at startup
    pub credentials: Option<Credentials>,
}

impl Context {
    /// Resolve configuration for the study at `cwd`.
    pub fn settings(&self) -> Result<StoreSettings> {
        let loaded = Config::load(Some(&self.cwd)).context("Failed to load configuration")?;
        for source in &loaded.sources {
            crate::ui::output::debug(
                format!("loaded config {}", source.display()),
                self.verbosity,
            );
        }
        Ok(loaded.config.store_settings(self.credentials.clone())?)
    }

    /// Open (and bootstrap if needed) the study repository at `cwd`.
    pub fn open_store(&self) -> Result<GitStore> {
        let settings = self.settings()?;
        GitStore::open(&self.cwd, settings)
            .with_context(|| format!("Failed to open repository at {}", self.cwd.display()))
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);

    env_logger::Builder::new()
        .filter_level(verbosity.log_filter())
        .parse_default_env()
        .format_timestamp(None)
        .init();

    let cwd = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let ctx = Context {
        cwd,
        verbosity,
        credentials: Credentials::from_env(),
    };

    commands::dispatch(cli.command, &ctx)
}
