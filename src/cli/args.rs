//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::study::IntegrationStrategy;

/// studyrepo - git-backed storage for systematic literature review crawls
#[derive(Parser, Debug)]
#[command(name = "studyrepo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if studyrepo was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Integration strategy as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Merge each search branch into the results branch
    Merge,
    /// Apply each search branch's newest patch onto the results branch
    Patch,
}

impl From<Strategy> for IntegrationStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Merge => IntegrationStrategy::Merge,
            Strategy::Patch => IntegrationStrategy::ApplyPatch,
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    // ========== Repository ==========
    /// Open the study repository, bootstrapping it if needed
    #[command(
        long_about = "Open the study repository, bootstrapping it if needed.\n\n\
            A directory without a repository is initialised on the default branch, \
            given a default .gitignore and an initial commit. Running init again \
            changes nothing."
    )]
    Init,

    /// Print the checked-out branch
    Branch,

    /// List local branches
    Branches,

    /// Switch to a branch, creating it from HEAD if missing
    Checkout {
        /// Branch to check out
        name: String,
    },

    /// Show working tree status
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Stage everything and commit it
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Show first-parent history
    Log {
        /// Branch to show (defaults to HEAD)
        branch: Option<String>,

        /// Maximum number of commits
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    // ========== Patches ==========
    /// Print the patch between a branch head and its parent
    #[command(
        after_help = "\
WORKFLOW EXAMPLES:
    # Move the newest acm results onto the results branch by hand
    studyrepo diff search/acm -o acm.patch
    studyrepo checkout results
    studyrepo apply acm.patch -m \"Integrate acm\""
    )]
    Diff {
        /// Branch whose head is diffed
        branch: String,

        /// Write the patch to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply a patch to the checked-out branch and commit it
    Apply {
        /// Patch file, or `-` for stdin
        patch: String,

        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Merge one branch into another, then return to the current branch
    Merge {
        /// Branch receiving the changes
        target: String,
        /// Branch providing the changes
        source: String,
    },

    // ========== Remote ==========
    /// Fetch from a remote
    Fetch {
        /// Remote name (defaults to the configured remote)
        remote: Option<String>,
    },

    /// Fetch and integrate the upstream of the checked-out branch
    Pull,

    /// Push the checked-out branch
    Push,

    // ========== Studies ==========
    /// Crawl an existing study
    #[command(
        long_about = "Crawl an existing study.\n\n\
            Reads study.toml, fetches entries for each enabled database from \
            <dir>/<database>.json, commits them on the database's search branch \
            and integrates new results into the results branch.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Crawl with merges (default)
    studyrepo crawl --from ./fetched

    # Integrate by applying patches instead
    studyrepo crawl --from ./fetched --strategy patch"
    )]
    Crawl {
        /// Directory holding <database>.json result files
        #[arg(long, value_name = "DIR")]
        from: PathBuf,

        /// How new results reach the results branch
        #[arg(long, value_enum, default_value_t = Strategy::Merge)]
        strategy: Strategy,
    },

    /// Create a new study and run its first crawl
    New {
        /// Study title
        #[arg(long)]
        title: String,

        /// Author (repeatable)
        #[arg(long = "author")]
        authors: Vec<String>,

        /// Research question (repeatable)
        #[arg(long = "question")]
        research_questions: Vec<String>,

        /// Search query (repeatable)
        #[arg(long = "query", required = true)]
        queries: Vec<String>,

        /// Database to search (repeatable)
        #[arg(long = "database", required = true)]
        databases: Vec<String>,

        /// Directory holding <database>.json result files
        #[arg(long, value_name = "DIR")]
        from: PathBuf,

        /// How new results reach the results branch
        #[arg(long, value_enum, default_value_t = Strategy::Merge)]
        strategy: Strategy,
    },
}
