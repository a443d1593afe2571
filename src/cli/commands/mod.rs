//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls into the store or the crawler
//! 3. Formats and displays output
//!
//! Handlers do NOT touch the repository directly.

mod branch;
mod commit;
mod crawl;
mod init;
mod merge;
mod patch;
mod sync;

pub use branch::{branches, checkout, current};
pub use commit::{commit, log, status};
pub use crawl::{crawl, new_study};
pub use init::init;
pub use merge::merge;
pub use patch::{apply, diff};
pub use sync::{fetch, pull, push};

use anyhow::{Context as _, Result};

use super::args::Command;
use super::Context;
use crate::core::types::BranchName;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        // Repository
        Command::Init => init::init(ctx),
        Command::Branch => branch::current(ctx),
        Command::Branches => branch::branches(ctx),
        Command::Checkout { name } => branch::checkout(ctx, &name),
        Command::Status { json } => commit::status(ctx, json),
        Command::Commit { message } => commit::commit(ctx, &message),
        Command::Log { branch, limit } => commit::log(ctx, branch.as_deref(), limit),

        // Patches
        Command::Diff { branch, output } => patch::diff(ctx, &branch, output.as_deref()),
        Command::Apply { patch, message } => patch::apply(ctx, &patch, &message),
        Command::Merge { target, source } => merge::merge(ctx, &target, &source),

        // Remote
        Command::Fetch { remote } => sync::fetch(ctx, remote.as_deref()),
        Command::Pull => sync::pull(ctx),
        Command::Push => sync::push(ctx),

        // Studies
        Command::Crawl { from, strategy } => crawl::crawl(ctx, &from, strategy.into()),
        Command::New {
            title,
            authors,
            research_questions,
            queries,
            databases,
            from,
            strategy,
        } => crawl::new_study(
            ctx,
            crawl::NewStudy {
                title,
                authors,
                research_questions,
                queries,
                databases,
            },
            &from,
            strategy.into(),
        ),
    }
}

/// Parse a user-supplied branch name.
fn branch_arg(name: &str) -> Result<BranchName> {
    BranchName::new(name).with_context(|| format!("Invalid branch name '{}'", name))
}
