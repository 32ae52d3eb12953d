//! Documents exchanged with the code-hosting API
//!
//! These are the platform-neutral shapes the worker consumes; the GitHub
//! adapter maps the REST payloads onto them.

use serde::{Deserialize, Serialize};

/// Maximum length of a status description
pub const STATUS_DESCRIPTION_MAX: usize = 130;

/// One file touched by a commit or a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Repository-relative path
    pub filename: String,
    /// `added`, `modified`, `removed`, ...
    pub status: String,
    /// Where to download the content
    pub raw_url: String,
    /// Commit the content belongs to
    pub sha: String,
}

impl ChangedFile {
    /// Removed files have nothing to check
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.status == "removed"
    }
}

/// A commit as returned by the hosting API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDocument {
    /// Commit hash
    pub sha: String,
    /// Web URL
    pub html_url: String,
    /// Where commit comments are posted
    pub comments_url: String,
    /// Where commit statuses are posted
    pub statuses_url: String,
    /// Full commit message
    pub message: String,
    /// Files touched (empty when listed from a pull request)
    #[serde(default)]
    pub files: Vec<ChangedFile>,
}

/// A pull request as returned by the hosting API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestDocument {
    /// API URL of the pull request
    pub url: String,
    /// Web URL
    pub html_url: String,
    /// Title, inspected for the WIP marker
    pub title: String,
    /// Issue URL (labels live on the issue)
    pub issue_url: String,
    /// List of commits
    pub commits_url: String,
    /// List of changed files
    pub files_url: String,
    /// Where review comments are posted
    pub review_comments_url: String,
    /// Where the head status is posted
    pub statuses_url: String,
    /// Head commit
    pub head_sha: String,
    /// Head label (`owner:branch`)
    pub head_label: String,
    /// `owner/name` of the base repository
    pub base_repository: String,
    /// Base branch
    pub base_ref: String,
}

/// Issue labels and the URL to replace them
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IssueLabels {
    /// Current label names
    pub names: Vec<String>,
    /// URL accepting the full replacement list
    pub labels_url: String,
}

/// Body of a commit status callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBody {
    /// `pending`, `success` or `error`
    pub state: String,
    /// Page showing the verdict
    pub target_url: String,
    /// Short summary, at most [`STATUS_DESCRIPTION_MAX`] characters
    pub description: String,
    /// Status context
    pub context: String,
}

impl StatusBody {
    /// Build a status body, truncating the description
    #[must_use]
    pub fn new(state: &str, target_url: &str, description: &str, context: &str) -> Self {
        Self {
            state: state.to_string(),
            target_url: target_url.to_string(),
            description: description.chars().take(STATUS_DESCRIPTION_MAX).collect(),
            context: context.to_string(),
        }
    }
}

/// Body of a comment callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommentBody {
    /// Review comment attached to a file
    File {
        /// Comment text
        body: String,
        /// Commit the file belongs to
        commit_id: String,
        /// Repository-relative path
        path: String,
        /// Diff position, 0 for the top of the file
        position: u32,
    },
    /// Plain comment
    Plain {
        /// Comment text
        body: String,
    },
}

impl CommentBody {
    /// Comment text
    #[must_use]
    pub fn body(&self) -> &str {
        match self {
            Self::File { body, .. } | Self::Plain { body } => body,
        }
    }
}
