//! fetch, pull, push commands
//!
//! A failed remote is reported as a warning, not an error: the exit code
//! only reflects local problems.

use anyhow::Result;

use crate::cli::Context;
use crate::git::SyncOutcome;
use crate::ui::output;

pub fn fetch(ctx: &Context, remote: Option<&str>) -> Result<()> {
    let store = ctx.open_store()?;
    let remote = remote.unwrap_or(&store.settings().remote).to_string();
    let outcome = store.fetch(&remote)?;
    report(ctx, "fetch", &outcome);
    Ok(())
}

pub fn pull(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let outcome = store.pull()?;
    report(ctx, "pull", &outcome);
    Ok(())
}

pub fn push(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let outcome = store.push()?;
    report(ctx, "push", &outcome);
    Ok(())
}

fn report(ctx: &Context, operation: &str, outcome: &SyncOutcome) {
    let line = output::format_sync(operation, outcome);
    match outcome {
        SyncOutcome::Failed(_) => output::warn(line, ctx.verbosity),
        _ => output::print(line, ctx.verbosity),
    }
}
