//! init command - Open or bootstrap the study repository

use anyhow::Result;

use crate::cli::Context;
use crate::ui::output;

/// Open the repository at the working directory, bootstrapping it if needed.
pub fn init(ctx: &Context) -> Result<()> {
    let existed = crate::git::GitStore::is_repository(&ctx.cwd);
    let store = ctx.open_store()?;

    let message = if existed {
        format!("Repository ready at {}", store.root().display())
    } else {
        format!(
            "Initialized repository at {} on {}",
            store.root().display(),
            store.settings().default_branch
        )
    };
    output::print(message, ctx.verbosity);
    Ok(())
}
