//! crawl and new commands

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::git::SyncOutcome;
use crate::study::{
    CrawlReport, Crawler, Database, Integration, IntegrationStrategy, JsonDirectoryFetcher,
    RepositoryInit, StudyDefinition,
};
use crate::ui::output;

/// Study fields collected from the `new` command line.
#[derive(Debug, Clone)]
pub struct NewStudy {
    pub title: String,
    pub authors: Vec<String>,
    pub research_questions: Vec<String>,
    pub queries: Vec<String>,
    pub databases: Vec<String>,
}

impl From<NewStudy> for StudyDefinition {
    fn from(new: NewStudy) -> Self {
        StudyDefinition {
            authors: new.authors,
            research_questions: new.research_questions,
            queries: new.queries,
            databases: new.databases.into_iter().map(Database::new).collect(),
            ..StudyDefinition::new(new.title)
        }
    }
}

/// Crawl the existing study at the working directory.
pub fn crawl(ctx: &Context, from: &Path, strategy: IntegrationStrategy) -> Result<()> {
    run(ctx, from, strategy, RepositoryInit::OpenExisting)
}

/// Create a study at the working directory and run its first crawl.
pub fn new_study(
    ctx: &Context,
    study: NewStudy,
    from: &Path,
    strategy: IntegrationStrategy,
) -> Result<()> {
    run(ctx, from, strategy, RepositoryInit::CreateNew(study.into()))
}

fn run(
    ctx: &Context,
    from: &Path,
    strategy: IntegrationStrategy,
    init: RepositoryInit,
) -> Result<()> {
    let settings = ctx.settings()?;
    output::debug(
        format!("fetching results from {} ({:?})", from.display(), strategy),
        ctx.verbosity,
    );

    let crawler = Crawler::new(&ctx.cwd, settings, JsonDirectoryFetcher::new(from))
        .with_strategy(strategy);
    let report = crawler
        .run(init)
        .with_context(|| format!("Crawl failed in {}", ctx.cwd.display()))?;

    print_report(ctx, &report);
    Ok(())
}

fn print_report(ctx: &Context, report: &CrawlReport) {
    sync_line(ctx, "pull", &report.pull);

    for db in &report.databases {
        let detail = match &db.integration {
            Integration::Unchanged => "unchanged".to_string(),
            Integration::Merged(outcome) => format!("merged ({})", outcome),
            Integration::Patched(true) => "patch applied".to_string(),
            Integration::Patched(false) => "patch empty".to_string(),
        };
        output::print(
            format!("{}: {} entries on {}, {}", db.database, db.entries, db.branch, detail),
            ctx.verbosity,
        );
        for path in &db.paths {
            output::debug(format!("  changed {}", path), ctx.verbosity);
        }
    }

    sync_line(ctx, "push", &report.push);

    let changed = report.changed().count();
    output::print(
        format!(
            "Crawl finished: {} of {} database(s) changed",
            changed,
            report.databases.len()
        ),
        ctx.verbosity,
    );
}

fn sync_line(ctx: &Context, operation: &str, outcome: &SyncOutcome) {
    let line = output::format_sync(operation, outcome);
    match outcome {
        SyncOutcome::Failed(_) => output::warn(line, ctx.verbosity),
        SyncOutcome::Skipped(_) => output::debug(line, ctx.verbosity),
        SyncOutcome::Completed => output::print(line, ctx.verbosity),
    }
}
