//! Code-hosting API port
//!
//! Every call returns `Result<_, NetworkError>`; callers decide whether a
//! failure is fatal to the job (mandatory fetches) or only logged
//! (comments, statuses, labels).

use thiserror::Error;

use crate::core::models::{
    ChangedFile, CommentBody, CommitDocument, IssueLabels, PullRequestDocument, StatusBody,
};

/// Transport or protocol failure talking to the hosting API
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection, TLS or timeout failure
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Requested URL
        url: String,
        /// Underlying error
        message: String,
    },

    /// Non-2xx answer
    #[error("{url} answered with HTTP {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Body could not be decoded
    #[error("unexpected payload from {url}: {message}")]
    Decode {
        /// Requested URL
        url: String,
        /// Decoder message
        message: String,
    },
}

impl NetworkError {
    /// URL the failing request was sent to
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. } | Self::Status { url, .. } | Self::Decode { url, .. } => {
                url
            },
        }
    }
}

/// Operations the reconciliation worker needs from the hosting platform
pub trait HostingApi: Send + Sync {
    /// Fetch a commit, including its changed files
    fn commit(&self, url: &str) -> Result<CommitDocument, NetworkError>;

    /// Fetch a pull request
    fn pull_request(&self, url: &str) -> Result<PullRequestDocument, NetworkError>;

    /// List the commits of a pull request, oldest first
    fn pull_request_commits(&self, url: &str) -> Result<Vec<CommitDocument>, NetworkError>;

    /// List the files changed by a pull request
    fn pull_request_files(&self, url: &str) -> Result<Vec<ChangedFile>, NetworkError>;

    /// Download raw file content
    fn download(&self, url: &str) -> Result<Vec<u8>, NetworkError>;

    /// Read a file of a repository at a given ref, `None` when absent
    fn file_contents(
        &self,
        repository: &str,
        path: &str,
        reference: &str,
    ) -> Result<Option<Vec<u8>>, NetworkError>;

    /// Post a comment
    fn post_comment(&self, url: &str, comment: &CommentBody) -> Result<(), NetworkError>;

    /// Post a commit status
    fn post_status(&self, url: &str, status: &StatusBody) -> Result<(), NetworkError>;

    /// Read the labels of an issue
    fn issue_labels(&self, issue_url: &str) -> Result<IssueLabels, NetworkError>;

    /// Replace the labels of an issue
    fn replace_labels(&self, labels_url: &str, labels: &[String]) -> Result<(), NetworkError>;
}

/// Builds an authenticated [`HostingApi`] client for a token
pub trait HostingConnector: Send + Sync {
    /// Client acting with `token` (anonymous when `None`)
    fn connect(&self, token: Option<&str>) -> Box<dyn HostingApi>;
}
