//! Per-file checking
//!
//! Combines the license validator with the registered external analyzers and
//! applies the `excludes`, `ignore` and `select` options.
//!
//! A failing analyzer is skipped, except one that ran out of time: that
//! aborts the check so the verdict is never completed with partial results.

use std::path::Path;
use std::sync::Arc;

use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::license::{self, CommentStyle, LicenseOptions};
use crate::core::models::Finding;
use crate::core::ports::{AnalyzerError, FileAnalyzer};

/// Failure checking one file
#[derive(Debug, Error)]
pub enum CheckError {
    /// The file could not be read
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An analyzer exceeded its deadline
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}

/// Switches and filters of the checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckOptions {
    /// Check messages even when the work is flagged WIP
    pub check_wip: bool,
    /// Run the commit message validator
    pub check_commit_messages: bool,
    /// Run the license validator
    pub check_license: bool,
    /// Run the external analyzers
    pub check_analyzers: bool,
    /// Finding code prefixes to drop
    pub ignore: Vec<String>,
    /// Finding code prefixes to keep for analyzers (all when empty)
    pub select: Vec<String>,
    /// Path patterns never checked, anchored at the start
    pub excludes: Vec<String>,
    /// Holder required after the copyright year
    pub copyright_holder: Option<String>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            check_wip: false,
            check_commit_messages: true,
            check_license: true,
            check_analyzers: true,
            ignore: Vec::new(),
            select: Vec::new(),
            excludes: Vec::new(),
            copyright_holder: None,
        }
    }
}

impl CheckOptions {
    /// Whether any file phase check is switched on
    #[must_use]
    pub const fn checks_files(&self) -> bool {
        self.check_license || self.check_analyzers
    }
}

/// Analyzers registered at startup
#[derive(Default)]
pub struct AnalyzerRegistry {
    analyzers: Vec<Box<dyn FileAnalyzer>>,
}

impl AnalyzerRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an analyzer
    pub fn register(&mut self, analyzer: Box<dyn FileAnalyzer>) {
        self.analyzers.push(analyzer);
    }

    /// Builder form of [`register`](Self::register)
    #[must_use]
    pub fn with(mut self, analyzer: Box<dyn FileAnalyzer>) -> Self {
        self.register(analyzer);
        self
    }

    /// Analyzers handling `path`
    pub fn applicable<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a dyn FileAnalyzer> {
        self.analyzers.iter().map(AsRef::as_ref).filter(move |a| a.applies_to(path))
    }

    /// Names of all registered analyzers
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    /// Number of registered analyzers
    #[must_use]
    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }
}

impl std::fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerRegistry").field("analyzers", &self.names()).finish()
    }
}

/// License comment style for a file name, `None` when not license-checked
#[must_use]
pub fn comment_style(name: &str) -> Option<CommentStyle> {
    let extension = name.rsplit_once('.').map(|(_, ext)| ext)?;
    match extension {
        "py" | "html" | "tpl" => Some(CommentStyle::Hash),
        "js" | "jsx" | "css" | "less" => Some(CommentStyle::Block),
        _ => None,
    }
}

/// Runs every enabled check on one file
#[derive(Debug, Clone)]
pub struct FileChecker {
    options: CheckOptions,
    excludes: Vec<Regex>,
    analyzers: Arc<AnalyzerRegistry>,
    year: i32,
}

impl FileChecker {
    /// Build a checker, compiling the exclude patterns
    pub fn new(options: CheckOptions, analyzers: Arc<AnalyzerRegistry>) -> Result<Self, regex::Error> {
        let excludes = options
            .excludes
            .iter()
            .map(|pattern| Regex::new(&format!("^(?:{pattern})")))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            options,
            excludes,
            analyzers,
            year: license::current_year(),
        })
    }

    /// Override the year copyrights must end with
    #[must_use]
    pub const fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    /// The options this checker runs with
    #[must_use]
    pub const fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// Whether `name` matches an exclude pattern
    #[must_use]
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excludes.iter().any(|re| re.is_match(name))
    }

    /// Check the file at `path`, known to the repository as `name`
    ///
    /// Returns `Ok(None)` when the file is excluded. Findings are sorted by
    /// line. An analyzer that fails is logged and skipped; one that timed
    /// out fails the whole check.
    pub fn check_file(&self, path: &Path, name: &str) -> Result<Option<Vec<Finding>>, CheckError> {
        if self.is_excluded(name) {
            return Ok(None);
        }

        let mut findings = Vec::new();
        if self.options.check_license {
            if let Some(style) = comment_style(name) {
                let options = LicenseOptions {
                    year: self.year,
                    style,
                    ignore: self.options.ignore.iter().cloned().collect(),
                    holder: self.options.copyright_holder.clone(),
                };
                findings.extend(license::check_license(path, &options)?);
            }
        }

        if self.options.check_analyzers {
            for analyzer in self.analyzers.applicable(Path::new(name)) {
                match analyzer.analyze(path) {
                    Ok(found) => findings.extend(found.into_iter().filter(|f| self.keeps(f))),
                    Err(e @ AnalyzerError::Timeout { .. }) => return Err(e.into()),
                    Err(e) => warn!("Analyzer {} skipped {name}: {e}", analyzer.name()),
                }
            }
        }

        findings.sort_by_key(|f| f.line);
        Ok(Some(findings))
    }

    fn keeps(&self, finding: &Finding) -> bool {
        let code = finding.code.as_str();
        let ignored = self.options.ignore.iter().any(|p| code.starts_with(p.as_str()));
        let selected = self.options.select.is_empty()
            || self.options.select.iter().any(|p| code.starts_with(p.as_str()));
        !ignored && selected
    }
}
