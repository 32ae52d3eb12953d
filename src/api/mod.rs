//! HTTP-agnostic API layer
//!
//! Typed webhook payloads, the [`Dispatcher`] that turns them into queued
//! jobs, and the read endpoints over stored verdicts. Any HTTP server can
//! sit on top of it; the shipped one is in `server`.
//!
//! ## Design
//!
//! - **Handlers are plain methods**: typed input, `Result<T, ApiError>` out
//! - **Events are a closed enum**: an unknown event name is a `BadRequest`
//! - **Errors carry HTTP semantics**: `ApiError` knows its status code

mod error;
mod handlers;
mod types;

pub use error::{ApiError, ApiErrorData, ErrorCode};
pub use handlers::{Dispatcher, branch_status_url, commit_status_url, health};
pub use types::{
    Acknowledgement, ApiResponse, BranchData, BranchHeadData, CommitData, CommitsData, HealthData,
    PullRequestEvent, PullRequestHead, PullRequestOwner, PullRequestRef, PullRequestRepository,
    PushEvent, PushOwner, PushRepository, PushedCommit, WebhookEvent,
};
