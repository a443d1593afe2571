//! diff and apply commands

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context as _, Result};

use super::branch_arg;
use crate::cli::Context;
use crate::git::Patch;
use crate::ui::output;

/// Write the patch between `branch`'s head and its parent.
///
/// Without `--output` the patch goes to stdout unchanged, so it can be
/// piped into `apply -`.
pub fn diff(ctx: &Context, branch: &str, output_path: Option<&Path>) -> Result<()> {
    let branch = branch_arg(branch)?;
    let store = ctx.open_store()?;
    let patch = store.diff_head_against_parent(&branch)?;

    match output_path {
        Some(path) => {
            std::fs::write(path, patch.as_str())
                .with_context(|| format!("Failed to write patch to {}", path.display()))?;
            if patch.is_empty() {
                output::warn(format!("{} has no changes against its parent", branch), ctx.verbosity);
            } else {
                output::print(
                    format!("Wrote {} file(s) to {}", patch.paths().len(), path.display()),
                    ctx.verbosity,
                );
            }
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(patch.as_str().as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Apply a patch file (or stdin for `-`) and commit it.
pub fn apply(ctx: &Context, source: &str, message: &str) -> Result<()> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read patch from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read patch {}", source))?
    };

    let store = ctx.open_store()?;
    let patch = Patch::new(text);
    if store.apply_patch(&patch, message)? {
        output::print(
            format!("Applied {} and committed \"{}\"", source, message),
            ctx.verbosity,
        );
    } else {
        output::print("Patch is empty; nothing applied", ctx.verbosity);
    }
    Ok(())
}
