//! Pure API handlers
//!
//! The dispatcher turns webhook deliveries into verdict rows and queued
//! jobs, and answers the read endpoints. It is HTTP-agnostic: handlers take
//! typed input and return `Result<T, ApiError>`.

use std::sync::Arc;

use log::{debug, info, warn};

use super::error::ApiError;
use super::types::{
    Acknowledgement, BranchData, BranchHeadData, CommitData, CommitsData, HealthData,
    PullRequestEvent, PushEvent, WebhookEvent,
};
use crate::config::Config;
use crate::core::models::{Account, BranchContent, Repository, render_all};
use crate::core::ports::VerdictStore;
use crate::worker::{Job, JobQueue};

/// Number of verdicts returned by the repository listing
const LATEST_COMMITS: usize = 20;

/// Page showing the verdict of a commit
#[must_use]
pub fn commit_status_url(base_url: &str, owner: &str, repository: &str, sha: &str) -> String {
    format!("{}/api/commits/{owner}/{repository}/{sha}", base_url.trim_end_matches('/'))
}

/// Page showing the verdicts of a pull request branch
///
/// Branch labels may contain `/`, which is encoded so the label stays a
/// single path segment.
#[must_use]
pub fn branch_status_url(base_url: &str, owner: &str, repository: &str, branch: &str) -> String {
    let branch = branch.replace('%', "%25").replace('/', "%2F");
    format!("{}/api/branches/{owner}/{repository}/{branch}", base_url.trim_end_matches('/'))
}

/// Liveness check
#[must_use]
pub const fn health() -> HealthData {
    HealthData {
        status: "ok",
        version: crate::VERSION,
    }
}

/// Receives webhook deliveries and serves stored verdicts
pub struct Dispatcher {
    store: Arc<dyn VerdictStore>,
    queue: Arc<dyn JobQueue>,
    config: Arc<Config>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Dispatcher writing to `store` and enqueueing on `queue`
    #[must_use]
    pub fn new(store: Arc<dyn VerdictStore>, queue: Arc<dyn JobQueue>, config: Arc<Config>) -> Self {
        Self {
            store,
            queue,
            config,
        }
    }

    // =========================================================================
    // WEBHOOK
    // =========================================================================

    /// Handle one webhook delivery
    pub fn dispatch(&self, event: &WebhookEvent) -> Result<Acknowledgement, ApiError> {
        debug!("Received {} event", event.name());
        match event {
            WebhookEvent::Ping => Ok(Acknowledgement::pong()),
            WebhookEvent::Push(push) => self.push(push),
            WebhookEvent::PullRequest(pr) => self.pull_request(pr),
        }
    }

    fn push(&self, event: &PushEvent) -> Result<Acknowledgement, ApiError> {
        let owner_name = &event.repository.owner.name;
        let repository_name = &event.repository.name;
        let context = &self.config.hosting.context;
        let Some((owner, repository)) = self.registered(owner_name, repository_name)? else {
            return Ok(Acknowledgement::unregistered(context, owner_name, repository_name));
        };

        let base_url = &self.config.server.base_url;
        let api_url = self.config.hosting.api_url.trim_end_matches('/');
        let mut target_url = format!(
            "{}/api/commits/{}/{}",
            base_url.trim_end_matches('/'),
            owner.name,
            repository.name
        );

        for commit in &event.commits {
            let verdict = self.store.find_or_create_commit(repository.id, &commit.id, &commit.url)?;
            target_url = commit_status_url(base_url, &owner.name, &repository.name, &verdict.sha);
            self.queue.enqueue(Job::Push {
                commit_id: verdict.id,
                commit_url: format!(
                    "{api_url}/repos/{}/{}/commits/{}",
                    owner.name, repository.name, verdict.sha
                ),
                status_url: target_url.clone(),
            })?;
        }

        info!(
            "Queued {} commit(s) of {}",
            event.commits.len(),
            repository.fullname(&owner)
        );
        Ok(Acknowledgement::pending(context, target_url, "commits queued".to_string()))
    }

    fn pull_request(&self, event: &PullRequestEvent) -> Result<Acknowledgement, ApiError> {
        if !event.is_actionable() {
            return Err(ApiError::bad_request(format!(
                "Pull request action {} is not supported",
                event.action
            )));
        }

        let owner_name = &event.repository.owner.login;
        let repository_name = &event.repository.name;
        let context = &self.config.hosting.context;
        let Some((owner, repository)) = self.registered(owner_name, repository_name)? else {
            return Ok(Acknowledgement::unregistered(context, owner_name, repository_name));
        };

        let pr = &event.pull_request;
        let head = self.store.find_or_create_commit(
            repository.id,
            &pr.head.sha,
            &format!("{}/commits/{}", pr.html_url, pr.head.sha),
        )?;
        let branch = self.store.find_or_create_branch(
            head.id,
            &pr.head.label,
            &pr.html_url,
            &BranchContent::default(),
        )?;

        let status_url =
            branch_status_url(&self.config.server.base_url, &owner.name, &repository.name, &branch.name);
        self.queue.enqueue(Job::PullRequest {
            branch_id: branch.id,
            pull_request_url: pr.url.clone(),
            status_url: status_url.clone(),
        })?;

        info!("Queued pull request {} at {}", branch.name, head.sha);
        Ok(Acknowledgement::pending(
            context,
            status_url,
            format!("pull request {} queued", branch.name),
        ))
    }

    /// Owner and repository of a delivery, registering them when allowed
    fn registered(&self, owner: &str, repository: &str) -> Result<Option<(Account, Repository)>, ApiError> {
        if let Some(found) = self.lookup(owner, repository)? {
            return Ok(Some(found));
        }
        if !self.config.hosting.auto_create {
            warn!("Ignoring event of unregistered repository {owner}/{repository}");
            return Ok(None);
        }

        let account = self.store.find_or_create_account(owner)?;
        let created = self.store.find_or_create_repository(account.id, repository)?;
        info!("Registered {owner}/{repository}");
        Ok(Some((account, created)))
    }

    fn lookup(&self, owner: &str, repository: &str) -> Result<Option<(Account, Repository)>, ApiError> {
        let Some(account) = self.store.find_account(owner)? else {
            return Ok(None);
        };
        Ok(self
            .store
            .find_repository(account.id, repository)?
            .map(|repository| (account, repository)))
    }

    // =========================================================================
    // READ ENDPOINTS
    // =========================================================================

    fn require(&self, owner: &str, repository: &str) -> Result<(Account, Repository), ApiError> {
        let account = self
            .store
            .find_account(owner)?
            .ok_or_else(|| ApiError::not_found(format!("{owner} isn't registered yet.")))?;
        let repository = self
            .store
            .find_repository(account.id, repository)?
            .ok_or_else(|| ApiError::not_found(format!("{owner}/{repository} isn't registered yet.")))?;
        Ok((account, repository))
    }

    /// Verdict of one commit
    pub fn commit(&self, owner: &str, repository: &str, sha: &str) -> Result<CommitData, ApiError> {
        let (account, repository) = self.require(owner, repository)?;
        let verdict = self
            .store
            .find_commit(repository.id, sha)?
            .ok_or_else(|| ApiError::not_found(format!("Commit {sha} has not been checked")))?;
        Ok(CommitData {
            repository: repository.fullname(&account),
            message: render_all(&verdict.content.message),
            verdict,
        })
    }

    /// Most recent commit verdicts of a repository
    pub fn commits(&self, owner: &str, repository: &str) -> Result<CommitsData, ApiError> {
        let (account, repository) = self.require(owner, repository)?;
        Ok(CommitsData {
            repository: repository.fullname(&account),
            commits: self.store.latest_commits(repository.id, LATEST_COMMITS)?,
        })
    }

    /// Verdicts of a pull request branch
    pub fn branch(&self, owner: &str, repository: &str, name: &str) -> Result<BranchData, ApiError> {
        let (account, repository) = self.require(owner, repository)?;
        let verdicts = self.store.find_branches(repository.id, name)?;
        if verdicts.is_empty() {
            return Err(ApiError::not_found(format!("Branch {name} has not been checked")));
        }
        Ok(BranchData {
            repository: repository.fullname(&account),
            name: name.to_string(),
            verdicts,
        })
    }

    /// Verdict of a pull request branch at head `sha`
    pub fn branch_head(
        &self,
        owner: &str,
        repository: &str,
        name: &str,
        sha: &str,
    ) -> Result<BranchHeadData, ApiError> {
        let (account, repository) = self.require(owner, repository)?;
        let not_checked = || ApiError::not_found(format!("Branch {name} has not been checked at {sha}"));
        let head = self.store.find_commit(repository.id, sha)?.ok_or_else(not_checked)?;
        let verdict = self.store.find_branch(head.id, name)?.ok_or_else(not_checked)?;
        Ok(BranchHeadData {
            repository: repository.fullname(&account),
            name: name.to_string(),
            sha: head.sha,
            verdict,
        })
    }
}
