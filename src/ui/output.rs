//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Everything the CLI prints goes through here. Regular output goes to
//! stdout and is silenced by `--quiet`; diagnostics go to stderr. Patch
//! text is written raw by the caller, never through these helpers, so it
//! stays byte-exact.

use std::fmt::Display;

use crate::git::{CommitInfo, SyncOutcome, WorkingTreeStatus};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Debug,
}

impl Verbosity {
    /// `--quiet` wins over `--debug`.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    /// Log filter matching this verbosity.
    pub fn log_filter(self) -> log::LevelFilter {
        match self {
            Verbosity::Quiet => log::LevelFilter::Error,
            Verbosity::Normal => log::LevelFilter::Warn,
            Verbosity::Debug => log::LevelFilter::Debug,
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Render a status snapshot the way `git status --short` would.
pub fn format_status(status: &WorkingTreeStatus) -> String {
    if status.is_clean() {
        return "nothing to commit, working tree clean".to_string();
    }

    let sections: [(&str, &[String]); 5] = [
        ("U ", &status.conflicted),
        ("A ", &status.staged),
        (" M", &status.modified),
        (" D", &status.missing),
        ("??", &status.untracked),
    ];
    sections
        .iter()
        .flat_map(|(code, paths)| paths.iter().map(move |p| format!("{} {}", code, p)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line commit summary: short id, date, subject.
pub fn format_commit(commit: &CommitInfo) -> String {
    format!(
        "{} {} {}",
        commit.oid.short(7),
        commit.author_time.format("%Y-%m-%d"),
        commit.summary
    )
}

/// Describe a remote outcome for `operation` (fetch, pull, push).
pub fn format_sync(operation: &str, outcome: &SyncOutcome) -> String {
    format!("{}: {}", operation, outcome)
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Oid;

    #[test]
    fn verbosity_flags() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::Debug.log_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn clean_status() {
        assert_eq!(
            format_status(&WorkingTreeStatus::default()),
            "nothing to commit, working tree clean"
        );
    }

    #[test]
    fn short_status_codes() {
        let status = WorkingTreeStatus {
            untracked: vec!["new.txt".into()],
            modified: vec!["a.txt".into()],
            missing: vec!["gone.txt".into()],
            ..Default::default()
        };
        assert_eq!(format_status(&status), " M a.txt\n D gone.txt\n?? new.txt");
    }

    #[test]
    fn commit_line() {
        let commit = CommitInfo {
            oid: Oid::new("1234567890".repeat(4)).unwrap(),
            summary: "Crawl ACM".into(),
            message: "Crawl ACM\n".into(),
            parents: vec![],
            author_name: "studyrepo".into(),
            author_time: chrono::DateTime::from_timestamp(0, 0).unwrap(),
        };
        assert_eq!(format_commit(&commit), "1234567 1970-01-01 Crawl ACM");
    }

    #[test]
    fn list_prefix() {
        assert_eq!(format_list(&["a", "b"], "  "), "  a\n  b");
    }
}
