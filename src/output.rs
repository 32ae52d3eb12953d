//! Output formatting for human and JSON modes
//!
//! Command results are plain serializable structs rendered either as
//! colored text or as pretty JSON.

use colored::Colorize;
use serde::Serialize;

use crate::core::models::{Account, Finding, Repository};
use crate::core::services::{ReleaseSection, render_release_notes};

/// Output mode for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (machine-readable)
    Json,
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// Findings of one checked item (a commit or a file)
#[derive(Debug, Clone, Serialize)]
pub struct CheckedItem {
    /// Short sha or path
    pub subject: String,
    /// First line of the commit message, for commits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Rendered findings
    pub findings: Vec<String>,
}

impl CheckedItem {
    /// Item with its findings rendered
    #[must_use]
    pub fn new(subject: impl Into<String>, summary: Option<String>, findings: &[Finding]) -> Self {
        Self {
            subject: subject.into(),
            summary,
            findings: findings.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Result of `check message` or `check files`
#[derive(Debug, Serialize)]
pub struct CheckReport {
    /// Whether no finding was produced
    pub passed: bool,
    /// Number of items looked at
    pub checked: usize,
    /// Total number of findings
    pub errors: usize,
    /// Items with at least one finding
    pub items: Vec<CheckedItem>,
}

impl CheckReport {
    /// Report over `checked` items, keeping those with findings
    #[must_use]
    pub fn new(checked: usize, items: Vec<CheckedItem>) -> Self {
        let items: Vec<CheckedItem> = items.into_iter().filter(|i| !i.findings.is_empty()).collect();
        let errors = items.iter().map(|i| i.findings.len()).sum();
        Self {
            passed: errors == 0,
            checked,
            errors,
            items,
        }
    }

    /// Render the report based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        for item in &self.items {
            match &item.summary {
                Some(summary) => println!("{} {}", item.subject.yellow(), summary),
                None => println!("{}", item.subject.yellow()),
            }
            for finding in &item.findings {
                println!("  {finding}");
            }
            println!();
        }

        if self.passed {
            println!("{} {} checked, no errors", "✓".green(), self.checked);
        } else {
            println!("{} {} checked, {} errors", "✗".red(), self.checked, self.errors);
        }
    }
}

/// Release notes of a range of commits
#[derive(Debug, Serialize)]
pub struct ReleaseReport {
    /// Number of commits read
    pub commits: usize,
    /// Non-empty sections, in configured order
    pub sections: Vec<ReleaseSection>,
    /// Group bullets by component in human output
    #[serde(skip)]
    pub by_component: bool,
}

impl ReleaseReport {
    /// Render the notes based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human if self.sections.is_empty() => {
                println!("{}", format!("No release notes in {} commit(s).", self.commits).dimmed());
            },
            OutputMode::Human => print!("{}", render_release_notes(&self.sections, self.by_component)),
            OutputMode::Json => print_json(self),
        }
    }
}

/// Registered accounts
#[derive(Debug, Serialize)]
pub struct AccountList {
    /// Ordered by name
    pub accounts: Vec<Account>,
}

impl AccountList {
    /// Render the list based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => {
                if self.accounts.is_empty() {
                    println!("{}", "No accounts registered.".dimmed());
                }
                for account in &self.accounts {
                    let token = if account.token.is_some() { "token" } else { "no token" };
                    println!(
                        "{} {} ({token})",
                        account.name.bold(),
                        account.email.as_deref().unwrap_or("-")
                    );
                }
            },
            OutputMode::Json => print_json(self),
        }
    }
}

/// Repositories of an account
#[derive(Debug, Serialize)]
pub struct RepositoryList {
    /// Account name
    pub owner: String,
    /// Ordered by name
    pub repositories: Vec<Repository>,
}

impl RepositoryList {
    /// Render the list based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => {
                if self.repositories.is_empty() {
                    println!("{}", format!("No repositories registered for {}.", self.owner).dimmed());
                }
                for repository in &self.repositories {
                    println!("{}/{}", self.owner, repository.name.bold());
                }
            },
            OutputMode::Json => print_json(self),
        }
    }
}

/// Generic operation result for simple commands
#[derive(Debug, Serialize)]
pub struct OperationResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable message
    pub message: String,
}

impl OperationResult {
    /// Successful operation
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human if self.success => println!("{} {}", "✓".green(), self.message),
            OutputMode::Human => eprintln!("{} {}", "✗".red(), self.message),
            OutputMode::Json => print_json(self),
        }
    }
}
