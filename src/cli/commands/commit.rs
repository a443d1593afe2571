//! status, commit, log commands

use anyhow::Result;

use super::branch_arg;
use crate::cli::Context;
use crate::ui::output::{self, Verbosity};

/// Show working tree status.
pub fn status(ctx: &Context, json: bool) -> Result<()> {
    let store = ctx.open_store()?;
    let status = store.status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        output::print(output::format_status(&status), ctx.verbosity);
    }
    Ok(())
}

/// Stage everything and commit.
pub fn commit(ctx: &Context, message: &str) -> Result<()> {
    let store = ctx.open_store()?;

    if store.commit_all(message)? {
        let head = store.log(None, 1)?;
        if let Some(commit) = head.first() {
            output::print(output::format_commit(commit), ctx.verbosity);
        }
    } else {
        output::print("Nothing to commit", ctx.verbosity);
    }
    Ok(())
}

/// Show history of `branch` or HEAD.
pub fn log(ctx: &Context, branch: Option<&str>, limit: usize) -> Result<()> {
    let branch = branch.map(branch_arg).transpose()?;
    let store = ctx.open_store()?;

    let commits = store.log(branch.as_ref(), limit)?;
    if commits.is_empty() {
        output::warn("no commits to show", ctx.verbosity);
        return Ok(());
    }

    for commit in &commits {
        output::print(output::format_commit(commit), ctx.verbosity);
        if ctx.verbosity == Verbosity::Debug && commit.parents.len() > 1 {
            let parents: Vec<&str> = commit.parents.iter().map(|p| p.short(7)).collect();
            output::debug(format!("merge of {}", parents.join(" ")), ctx.verbosity);
        }
    }
    Ok(())
}
