//! kwalitee - a quality gate for commits and pull requests
//!
//! Validates commit messages and the license headers of changed files,
//! keeps a verdict per commit and per pull request branch, and reports the
//! outcome back to the code-hosting platform as comments, statuses and
//! labels.
//!
//! - [`core`] - validators, verdict models and port traits
//! - [`adapters`] - SQLite store, GitHub client, external analyzers, local git
//! - [`api`] / [`server`] - webhook dispatcher and its HTTP front
//! - [`worker`] - reconciliation jobs and the worker pool

// Deny all clippy warnings in this crate
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cargo_common_metadata
)]

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod output;
pub mod paths;
pub mod server;
pub mod worker;
