//! API request and response types
//!
//! Webhook payloads only declare the members the dispatcher reads; serde
//! ignores the rest of what the hosting platform sends.

use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiErrorData};
use crate::core::models::{BranchVerdict, CommitVerdict};

// =============================================================================
// RESPONSE ENVELOPE
// =============================================================================

/// Standard API response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorData>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful response
    #[must_use]
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// Create an error response
    #[must_use]
    pub fn error(err: &ApiError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.into()),
        }
    }
}

// =============================================================================
// WEBHOOK PAYLOADS
// =============================================================================

/// A commit reference of a push event
#[derive(Debug, Clone, Deserialize)]
pub struct PushedCommit {
    /// Commit sha
    pub id: String,
    /// Web page of the commit
    pub url: String,
}

/// Owner as sent in push events
#[derive(Debug, Clone, Deserialize)]
pub struct PushOwner {
    /// Account name
    pub name: String,
}

/// Repository as sent in push events
#[derive(Debug, Clone, Deserialize)]
pub struct PushRepository {
    /// Repository name
    pub name: String,
    /// Owning account
    pub owner: PushOwner,
}

/// Body of a `push` event
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    /// Pushed commits, oldest first
    #[serde(default)]
    pub commits: Vec<PushedCommit>,
    /// Target repository
    pub repository: PushRepository,
}

/// Head of a pull request
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestHead {
    /// Head commit sha
    pub sha: String,
    /// `user:branch`
    pub label: String,
}

/// Pull request as sent in `pull_request` events
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestRef {
    /// API URL
    pub url: String,
    /// Web page
    pub html_url: String,
    /// Title
    #[serde(default)]
    pub title: String,
    /// Head commit and label
    pub head: PullRequestHead,
}

/// Owner as sent in pull request events
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestOwner {
    /// Account login
    pub login: String,
}

/// Repository as sent in pull request events
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestRepository {
    /// Repository name
    pub name: String,
    /// Owning account
    pub owner: PullRequestOwner,
}

/// Body of a `pull_request` event
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    /// `opened`, `synchronize`, `closed`...
    pub action: String,
    /// The pull request
    pub pull_request: PullRequestRef,
    /// Base repository
    pub repository: PullRequestRepository,
}

impl PullRequestEvent {
    /// Actions that change the head of a pull request
    pub const ACTIONABLE: [&'static str; 3] = ["opened", "reopened", "synchronize"];

    /// Whether this action needs a new check
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        Self::ACTIONABLE.contains(&self.action.as_str())
    }
}

/// An inbound webhook delivery
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    /// Hook configuration test
    Ping,
    /// Commits were pushed
    Push(PushEvent),
    /// A pull request changed
    PullRequest(PullRequestEvent),
}

impl WebhookEvent {
    /// Decode a delivery from its event name header and JSON body
    pub fn parse(name: Option<&str>, body: &[u8]) -> Result<Self, ApiError> {
        let name = name.ok_or_else(|| ApiError::bad_request("No X-GitHub-Event HTTP header found"))?;
        match name {
            "ping" => Ok(Self::Ping),
            "push" => decode(name, body).map(Self::Push),
            "pull_request" => decode(name, body).map(Self::PullRequest),
            other => Err(ApiError::bad_request(format!("Event {other} is not supported"))),
        }
    }

    /// Event name as sent by the hosting platform
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Push(_) => "push",
            Self::PullRequest(_) => "pull_request",
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(name: &str, body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid {name} payload: {e}")))
}

// =============================================================================
// RESPONSE DATA
// =============================================================================

/// Immediate answer to a webhook delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acknowledgement {
    /// `pending` when jobs were queued, `error` when nothing could be queued
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Status context of the deployment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Page the queued verdict will be shown on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    /// What happened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Answer to a ping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Acknowledgement {
    /// Answer to a ping
    #[must_use]
    pub fn pong() -> Self {
        Self {
            state: None,
            context: None,
            target_url: None,
            description: None,
            message: Some("pong".to_string()),
        }
    }

    /// Jobs were queued
    #[must_use]
    pub fn pending(context: &str, target_url: String, description: String) -> Self {
        Self {
            state: Some("pending".to_string()),
            context: Some(context.to_string()),
            target_url: Some(target_url),
            description: Some(description),
            message: None,
        }
    }

    /// The repository is not registered and auto-creation is off
    #[must_use]
    pub fn unregistered(context: &str, owner: &str, repository: &str) -> Self {
        Self {
            state: Some("error".to_string()),
            context: Some(context.to_string()),
            target_url: None,
            description: Some(format!("{owner}/{repository} is not yet registered")),
            message: None,
        }
    }
}

/// A commit verdict with its findings rendered
#[derive(Debug, Serialize)]
pub struct CommitData {
    /// `owner/name` of the repository
    pub repository: String,
    /// Stored verdict
    pub verdict: CommitVerdict,
    /// Rendered message findings
    pub message: Vec<String>,
}

/// Latest verdicts of a repository
#[derive(Debug, Serialize)]
pub struct CommitsData {
    /// `owner/name` of the repository
    pub repository: String,
    /// Most recent first
    pub commits: Vec<CommitVerdict>,
}

/// Verdicts of a pull request branch, newest first
#[derive(Debug, Serialize)]
pub struct BranchData {
    /// `owner/name` of the repository
    pub repository: String,
    /// Branch label
    pub name: String,
    /// One verdict per checked head
    pub verdicts: Vec<BranchVerdict>,
}

/// Verdict of a pull request branch at one head commit
#[derive(Debug, Serialize)]
pub struct BranchHeadData {
    /// `owner/name` of the repository
    pub repository: String,
    /// Branch label
    pub name: String,
    /// Head commit sha
    pub sha: String,
    /// The verdict checked at that head
    pub verdict: BranchVerdict,
}

/// Liveness answer
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthData {
    /// Always `ok`
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}
