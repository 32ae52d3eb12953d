//! External analyzer port
//!
//! Style and lint engines are collaborators: the core only knows how to ask
//! them for findings on one file.

use std::path::Path;

use thiserror::Error;

use crate::core::models::Finding;

/// Failure running an analyzer
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The tool could not be started
    #[error("{name} could not be started: {source}")]
    Spawn {
        /// Analyzer name
        name: String,
        /// I/O error
        #[source]
        source: std::io::Error,
    },

    /// The tool produced output that could not be read
    #[error("{name} produced unreadable output: {message}")]
    Output {
        /// Analyzer name
        name: String,
        /// Details
        message: String,
    },

    /// The tool ran past its deadline and was killed
    #[error("{name} timed out after {seconds}s")]
    Timeout {
        /// Analyzer name
        name: String,
        /// Deadline that was exceeded
        seconds: u64,
    },
}

/// A generic per-file analyzer
#[cfg_attr(test, mockall::automock)]
pub trait FileAnalyzer: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    /// Whether the analyzer handles this file
    fn applies_to(&self, path: &Path) -> bool;

    /// Findings for the file at `path`
    fn analyze(&self, path: &Path) -> Result<Vec<Finding>, AnalyzerError>;
}
