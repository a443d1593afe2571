//! branch, branches, checkout commands

use anyhow::{Context as _, Result};

use super::branch_arg;
use crate::cli::Context;
use crate::ui::output;

/// Print the checked-out branch.
pub fn current(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let branch = store.current_branch()?;
    output::print(branch, ctx.verbosity);
    Ok(())
}

/// List local branches, marking the current one.
pub fn branches(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let current = store.current_branch().ok();

    let lines: Vec<String> = store
        .list_branches()?
        .into_iter()
        .map(|name| {
            let marker = if current.as_ref() == Some(&name) { "* " } else { "  " };
            format!("{}{}", marker, name)
        })
        .collect();
    output::print(output::format_list(&lines, ""), ctx.verbosity);
    Ok(())
}

/// Switch to `name`, creating it if needed.
pub fn checkout(ctx: &Context, name: &str) -> Result<()> {
    let branch = branch_arg(name)?;
    let store = ctx.open_store()?;

    let existed = store.resolve_branch(&branch)?.is_some();
    store
        .checkout(&branch)
        .with_context(|| format!("Failed to check out {}", branch))?;

    let verb = if existed { "Switched to" } else { "Created and switched to" };
    output::print(format!("{} {}", verb, branch), ctx.verbosity);
    Ok(())
}
