//! Reconciliation worker
//!
//! Executes the jobs enqueued by the webhook dispatcher: fetch what changed
//! from the hosting API, run the validators, persist the verdict and report
//! back with comments, statuses and labels.
//!
//! Fetching the commit or pull request document is mandatory; a failure
//! aborts the job and leaves the verdict pending, so the job can be re-run.
//! The same holds for an analyzer killed at the job deadline.
//! Every callback (comment, status, labels) is best-effort: a failure is
//! logged and never rolls back the stored verdict.
//!
//! - [`push`] - commit jobs
//! - [`pull_request`] - pull request jobs
//! - [`queue`] - in-process queue and worker threads

mod files;
pub mod pull_request;
pub mod push;
pub mod queue;

use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::core::models::{Account, Repository, StatusBody};
use crate::core::ports::{HostingApi, HostingConnector, NetworkError, StoreError, VerdictStore};
use crate::core::services::{AnalyzerRegistry, CheckError, FileChecker};

pub use pull_request::PullRequestReport;
pub use push::PushReport;
pub use queue::{ChannelQueue, JobQueue, QueueError, WorkerPool};

/// A unit of work for the reconciliation worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Job {
    /// Check one pushed commit
    Push {
        /// Commit verdict to fill
        commit_id: i64,
        /// API URL of the commit
        commit_url: String,
        /// Page linked from the posted status
        status_url: String,
    },
    /// Check a pull request head
    PullRequest {
        /// Branch verdict to fill
        branch_id: i64,
        /// API URL of the pull request
        pull_request_url: String,
        /// Page linked from the posted status
        status_url: String,
    },
}

impl Job {
    /// Short description for logs
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Push { commit_id, .. } => format!("push #{commit_id}"),
            Self::PullRequest { branch_id, .. } => format!("pull request #{branch_id}"),
        }
    }
}

/// Conditions that abort a job
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The commit verdict does not exist
    #[error("unknown commit verdict #{0}")]
    UnknownCommit(i64),

    /// The branch verdict does not exist
    #[error("unknown branch verdict #{0}")]
    UnknownBranch(i64),

    /// The repository of a verdict does not exist
    #[error("unknown repository #{0}")]
    UnknownRepository(i64),

    /// Storage failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A mandatory fetch failed
    #[error("hosting API: {0}")]
    Hosting(#[from] NetworkError),

    /// The scratch area could not be used
    #[error("scratch area: {0}")]
    Scratch(#[from] std::io::Error),

    /// A file check was cut short
    #[error("file check: {0}")]
    Check(#[from] CheckError),

    /// An `excludes` pattern does not compile
    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// What a finished job produced
#[derive(Debug, Clone)]
pub enum JobReport {
    /// Result of a push job
    Push(PushReport),
    /// Result of a pull request job
    PullRequest(PullRequestReport),
}

/// Executes jobs against the store and the hosting API
pub struct Worker {
    store: Arc<dyn VerdictStore>,
    connector: Arc<dyn HostingConnector>,
    analyzers: Arc<AnalyzerRegistry>,
    config: Arc<Config>,
    year: Option<i32>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("analyzers", &self.analyzers)
            .field("year", &self.year)
            .finish_non_exhaustive()
    }
}

impl Worker {
    /// Worker sharing the store, connector and analyzers with its siblings
    #[must_use]
    pub fn new(
        store: Arc<dyn VerdictStore>,
        connector: Arc<dyn HostingConnector>,
        analyzers: Arc<AnalyzerRegistry>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            connector,
            analyzers,
            config,
            year: None,
        }
    }

    /// Pin the year copyrights must end with instead of the current one
    #[must_use]
    pub const fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Run one job
    pub fn run(&self, job: &Job) -> Result<JobReport, WorkerError> {
        info!("Starting {}", job.describe());
        let report = match job {
            Job::Push {
                commit_id,
                commit_url,
                status_url,
            } => JobReport::Push(self.push(*commit_id, commit_url, status_url)?),
            Job::PullRequest {
                branch_id,
                pull_request_url,
                status_url,
            } => JobReport::PullRequest(self.pull_request(*branch_id, pull_request_url, status_url)?),
        };
        info!("Finished {}", job.describe());
        Ok(report)
    }

    /// Repository and owner of a verdict
    fn owner_of(&self, repository_id: i64) -> Result<(Repository, Option<Account>), WorkerError> {
        let repository = self
            .store
            .get_repository(repository_id)?
            .ok_or(WorkerError::UnknownRepository(repository_id))?;
        let owner = self.store.get_account(repository.owner_id)?;
        Ok((repository, owner))
    }

    /// API client acting with the owner's token, or the configured one
    fn client_for(&self, owner: Option<&Account>) -> Box<dyn HostingApi> {
        let token = owner
            .and_then(|a| a.token.as_deref())
            .or(self.config.hosting.access_token.as_deref());
        self.connector.connect(token)
    }

    fn file_checker(&self, config: &Config) -> Result<FileChecker, WorkerError> {
        let checker = FileChecker::new(config.checks.clone(), Arc::clone(&self.analyzers))?;
        Ok(match self.year {
            Some(year) => checker.with_year(year),
            None => checker,
        })
    }
}

/// `[state] N errors`
fn status_description(state: &str, errors: usize) -> String {
    format!("[{state}] {errors} errors")
}

/// Post a status, logging failures
fn post_status(api: &dyn HostingApi, url: &str, status: &StatusBody) {
    if let Err(e) = api.post_status(url, status) {
        warn!("Could not post status to {}: {e}", e.url());
    }
}
