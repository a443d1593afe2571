//! studyrepo - git-backed storage for systematic literature review crawls
//!
//! A study lives in a git repository. Every library database the study
//! searches gets its own search branch; crawl results are committed there
//! and then integrated into a shared results branch, by merge or by
//! applying the newest commit's patch. Everything is kept in plain git, so
//! a study can be pushed, pulled and inspected with ordinary tools.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to the store)
//! - [`core`] - Strong types, settings and configuration
//! - [`git`] - [`git::GitStore`], the single interface for all Git operations
//! - [`study`] - Study definitions, result files and crawl orchestration
//! - [`ui`] - Output formatting
//!
//! # Guarantees
//!
//! 1. Every change to a study is a commit on a named branch
//! 2. A failed merge or patch leaves the repository as it was
//! 3. Remote failures never abort local work

pub mod cli;
pub mod core;
pub mod git;
pub mod study;
pub mod ui;
