//! Domain models for kwalitee
//!
//! Pure data structures with no I/O dependencies.
//!
//! - [`Finding`] - a coded, line-located diagnostic
//! - [`CommitVerdict`] / [`BranchVerdict`] - persisted outcomes
//! - [`Account`] / [`Repository`] - who owns what
//! - hosting documents exchanged with the code-hosting API

mod account;
mod finding;
mod hosting;
mod verdict;

pub use account::{Account, Repository};
pub use finding::{Finding, FindingCode, render_all};
pub use hosting::{
    ChangedFile, CommentBody, CommitDocument, IssueLabels, PullRequestDocument,
    STATUS_DESCRIPTION_MAX, StatusBody,
};
pub use verdict::{
    BranchContent, BranchVerdict, CommitContent, CommitVerdict, FileReport, FileReports,
    VerdictState,
};
