//! Commit and branch verdicts
//!
//! A verdict's `state` and `error_count` are never set directly: they are
//! derived from `content` by [`CommitContent::derive`] / [`BranchContent::derive`]
//! and stored next to it every time the content changes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::finding::Finding;

/// Outcome of a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictState {
    /// File phase has not run yet
    #[default]
    Pending,
    /// Every phase ran without findings
    Success,
    /// Every phase ran and at least one finding was produced
    Error,
}

impl VerdictState {
    /// Wire name used by the status API
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Integer stored in the database
    #[must_use]
    pub const fn to_db(self) -> i64 {
        match self {
            Self::Pending => 0,
            Self::Success => 1,
            Self::Error => 2,
        }
    }

    /// Parse the database integer, unknown values read as pending
    #[must_use]
    pub const fn from_db(value: i64) -> Self {
        match value {
            1 => Self::Success,
            2 => Self::Error,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for VerdictState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Findings for one checked file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileReport {
    /// Commit the file content was taken from
    pub sha: String,
    /// Findings, sorted by line
    pub errors: Vec<Finding>,
}

/// Checked files keyed by repository-relative path
pub type FileReports = BTreeMap<String, FileReport>;

fn count_file_errors(files: Option<&FileReports>) -> usize {
    files.map_or(0, |files| files.values().map(|f| f.errors.len()).sum())
}

fn derive_state(error_count: usize, files: Option<&FileReports>) -> VerdictState {
    match files {
        None => VerdictState::Pending,
        Some(_) if error_count > 0 => VerdictState::Error,
        Some(_) => VerdictState::Success,
    }
}

/// Stored content of a commit verdict
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitContent {
    /// Commit message findings
    #[serde(default)]
    pub message: Vec<Finding>,
    /// Whether the message phase already ran
    #[serde(default)]
    pub message_checked: bool,
    /// File findings, `None` until the file phase ran
    #[serde(default)]
    pub files: Option<FileReports>,
}

impl CommitContent {
    /// Compute `(state, error_count)` from the content alone
    #[must_use]
    pub fn derive(&self) -> (VerdictState, usize) {
        let count = self.message.len() + count_file_errors(self.files.as_ref());
        (derive_state(count, self.files.as_ref()), count)
    }
}

/// Verdict for one commit of one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitVerdict {
    /// Row identifier
    pub id: i64,
    /// Owning repository
    pub repository_id: i64,
    /// Commit hash
    pub sha: String,
    /// Web URL of the commit
    pub url: String,
    /// Findings collected so far
    pub content: CommitContent,
    /// Derived state
    pub state: VerdictState,
    /// Derived number of findings
    pub error_count: usize,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl CommitVerdict {
    /// Replace the content and re-derive state and error count
    pub fn set_content(&mut self, content: CommitContent) {
        self.content = content;
        (self.state, self.error_count) = self.content.derive();
    }

    /// Record the message phase result
    pub fn set_message(&mut self, message: Vec<Finding>) {
        let content = CommitContent {
            message,
            message_checked: true,
            files: self.content.files.clone(),
        };
        self.set_content(content);
    }

    /// Record the file phase result
    pub fn set_files(&mut self, files: FileReports) {
        let content = CommitContent {
            files: Some(files),
            ..self.content.clone()
        };
        self.set_content(content);
    }

    /// True while the file phase has not run
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.content.files.is_none()
    }

    /// Number of message findings
    #[must_use]
    pub fn message_error_count(&self) -> usize {
        self.content.message.len()
    }
}

/// Stored content of a branch verdict
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BranchContent {
    /// Commits of the pull request, oldest first
    #[serde(default)]
    pub commits: Vec<String>,
    /// File findings for the whole pull request, `None` until checked
    #[serde(default)]
    pub files: Option<FileReports>,
}

impl BranchContent {
    /// Compute `(state, error_count)`, given the message error count of
    /// every commit listed in `commits`
    #[must_use]
    pub fn derive(&self, commit_message_errors: usize) -> (VerdictState, usize) {
        let count = commit_message_errors + count_file_errors(self.files.as_ref());
        (derive_state(count, self.files.as_ref()), count)
    }
}

/// Verdict for a pull-request head
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchVerdict {
    /// Row identifier
    pub id: i64,
    /// Head commit verdict
    pub commit_id: i64,
    /// Branch label, e.g. `octocat:feature`
    pub name: String,
    /// Web URL of the pull request
    pub url: String,
    /// Aggregated content
    pub content: BranchContent,
    /// Derived state
    pub state: VerdictState,
    /// Derived number of findings
    pub error_count: usize,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl BranchVerdict {
    /// Replace the content and re-derive using the referenced commit verdicts
    ///
    /// Commits that are not listed in `content.commits` are ignored.
    pub fn set_content(&mut self, content: BranchContent, commits: &[CommitVerdict]) {
        let message_errors = content
            .commits
            .iter()
            .filter_map(|sha| commits.iter().find(|c| &c.sha == sha))
            .map(CommitVerdict::message_error_count)
            .sum();
        self.content = content;
        (self.state, self.error_count) = self.content.derive(message_errors);
    }

    /// True until the pull-request job completed
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.state, VerdictState::Pending)
    }
}
