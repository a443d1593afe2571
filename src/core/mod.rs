//! core
//!
//! Domain types, settings and configuration for studyrepo.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid
//! - [`settings`] - Resolved store settings and credentials
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid branch names and object ids
//! - Configuration is strict: unknown keys are rejected

pub mod config;
pub mod settings;
pub mod types;
