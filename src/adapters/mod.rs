//! Adapter implementations for port traits
//!
//! This module contains concrete implementations that handle I/O:
//!
//! - `sqlite/` - Verdict store backed by SQLite
//! - `github/` - Hosting API client for GitHub
//! - `analyzer/` - External lint tools run as subprocesses
//! - `git/` - Local repository access for the CLI

pub mod analyzer;
pub mod git;
pub mod github;
pub mod sqlite;

pub use analyzer::{CommandAnalyzer, build_registry};
pub use github::{GitHubClient, GitHubConnector};
pub use sqlite::SqliteVerdictStore;
