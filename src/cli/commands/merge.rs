//! merge command

use anyhow::Result;

use super::branch_arg;
use crate::cli::Context;
use crate::git::MergeOutcome;
use crate::ui::output;

/// Merge `source` into `target` and return to the current branch.
pub fn merge(ctx: &Context, target: &str, source: &str) -> Result<()> {
    let target = branch_arg(target)?;
    let source = branch_arg(source)?;
    let store = ctx.open_store()?;

    match store.merge(&target, &source)? {
        MergeOutcome::NothingToMerge => {
            output::warn(format!("branch {} does not exist", source), ctx.verbosity);
        }
        outcome => {
            output::print(format!("{} -> {}: {}", source, target, outcome), ctx.verbosity);
        }
    }
    Ok(())
}
