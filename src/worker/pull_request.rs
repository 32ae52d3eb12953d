//! Pull request jobs: every commit of the request plus its files

use std::borrow::Cow;

use log::{debug, info, warn};

use super::files::{check_changed_files, post_file_comments, total_errors};
use super::{Worker, WorkerError, post_status, status_description};
use crate::config::Config;
use crate::core::models::{
    BranchContent, BranchVerdict, CommentBody, CommitVerdict, FileReports, Finding,
    PullRequestDocument, Repository, StatusBody, render_all,
};
use crate::core::ports::HostingApi;
use crate::core::services::{MessageValidator, is_wip};
use crate::paths::REPO_CONFIG;

/// Result of a pull request job
#[derive(Debug, Clone)]
pub struct PullRequestReport {
    /// Verdict as stored at the end of the job
    pub verdict: BranchVerdict,
    /// Status sent to the hosting API, if any
    pub status: Option<StatusBody>,
    /// Labels written back, `None` when the job did not touch them
    pub labels: Option<Vec<String>>,
}

impl Worker {
    /// Check a pull request and report on it
    ///
    /// Idempotent per branch verdict: once the verdict left `pending` the
    /// stored one is returned without any network call.
    pub fn pull_request(
        &self,
        branch_id: i64,
        pull_request_url: &str,
        status_url: &str,
    ) -> Result<PullRequestReport, WorkerError> {
        let mut branch =
            self.store.get_branch(branch_id)?.ok_or(WorkerError::UnknownBranch(branch_id))?;
        if !branch.is_pending() {
            info!("Pull request {} already checked, skipping", branch.url);
            return Ok(PullRequestReport {
                verdict: branch,
                status: None,
                labels: None,
            });
        }

        let head = self
            .store
            .get_commit(branch.commit_id)?
            .ok_or(WorkerError::UnknownCommit(branch.commit_id))?;
        let (repository, owner) = self.owner_of(head.repository_id)?;
        let api = self.client_for(owner.as_ref());

        let pr = api.pull_request(pull_request_url)?;
        let config = self.repository_config(api.as_ref(), &pr);

        let wip = is_wip(&pr.title);
        let check = config.checks.check_wip || !wip;
        if !check {
            info!("Pull request {} is work in progress, checks skipped", pr.html_url);
        }

        let commits = self.check_commits(api.as_ref(), &repository, &pr, &config, check)?;

        // Files stay unresolved while WIP suppresses the check; the branch stays pending
        let checked_files = check && config.checks.checks_files();
        let files = if checked_files {
            let checker = self.file_checker(&config)?;
            let changed = api.pull_request_files(&pr.files_url)?;
            let reports = check_changed_files(api.as_ref(), &checker, &changed)?;
            if total_errors(&reports) > 0 {
                post_file_comments(api.as_ref(), &pr.review_comments_url, &reports);
            }
            Some(reports)
        } else if check {
            Some(FileReports::new())
        } else {
            None
        };

        let content = BranchContent {
            commits: commits.iter().map(|c| c.sha.clone()).collect(),
            files,
        };
        branch.set_content(content, &commits);
        if !self.store.save_branch(&branch)? {
            info!("Pull request {} was completed concurrently", pr.html_url);
            let stored =
                self.store.get_branch(branch_id)?.ok_or(WorkerError::UnknownBranch(branch_id))?;
            return Ok(PullRequestReport {
                verdict: stored,
                status: None,
                labels: None,
            });
        }

        let status = checked_files.then(|| {
            let state = branch.state.as_str();
            let status = StatusBody::new(
                state,
                status_url,
                &status_description(state, branch.error_count),
                &config.hosting.context,
            );
            post_status(api.as_ref(), &pr.statuses_url, &status);
            status
        });

        let target = if wip {
            &config.labels.wip
        } else if branch.error_count == 0 {
            &config.labels.ready
        } else {
            &config.labels.review
        };
        let labels = update_labels(api.as_ref(), &pr.issue_url, target, &config);

        Ok(PullRequestReport {
            verdict: branch,
            status,
            labels,
        })
    }

    /// Configuration for this pull request, with the base branch overrides
    fn repository_config<'a>(&'a self, api: &dyn HostingApi, pr: &PullRequestDocument) -> Cow<'a, Config> {
        let text = match api.file_contents(&pr.base_repository, REPO_CONFIG, &pr.base_ref) {
            Ok(Some(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
            Ok(None) => return Cow::Borrowed(self.config.as_ref()),
            Err(e) => {
                warn!("Could not read {REPO_CONFIG} of {}: {e}", pr.base_repository);
                return Cow::Borrowed(self.config.as_ref());
            },
        };
        match self.config.with_repo_overrides(&text, REPO_CONFIG) {
            Ok(config) => {
                debug!("Applied {REPO_CONFIG} of {}", pr.base_repository);
                Cow::Owned(config)
            },
            Err(e) => {
                warn!("Ignoring {REPO_CONFIG} of {}: {e}", pr.base_repository);
                Cow::Borrowed(self.config.as_ref())
            },
        }
    }

    /// Resolve, and check when needed, the verdict of every commit, oldest first
    fn check_commits(
        &self,
        api: &dyn HostingApi,
        repository: &Repository,
        pr: &PullRequestDocument,
        config: &Config,
        check: bool,
    ) -> Result<Vec<CommitVerdict>, WorkerError> {
        let validator = MessageValidator::new(config.message.clone());
        let run_messages = check && config.checks.check_commit_messages;
        let mut verdicts = Vec::new();

        for commit in api.pull_request_commits(&pr.commits_url)? {
            let mut verdict =
                self.store.find_or_create_commit(repository.id, &commit.sha, &commit.html_url)?;

            if run_messages && verdict.is_pending() && !verdict.content.message_checked {
                verdict.set_message(validator.check(&commit.message));
                self.store.save_commit(&verdict)?;

                let reported: Vec<Finding> = verdict
                    .content
                    .message
                    .iter()
                    .filter(|f| !f.is_reviewer_quorum())
                    .cloned()
                    .collect();
                if !reported.is_empty() {
                    let body = render_all(&reported).join("\n");
                    if let Err(e) = api.post_comment(&commit.comments_url, &CommentBody::Plain { body }) {
                        warn!("Could not comment on {}: {e}", e.url());
                    }
                }
            }
            verdicts.push(verdict);
        }
        Ok(verdicts)
    }
}

/// Replace the managed label of an issue, keeping every other label
///
/// Returns the written labels, `None` when reading or writing failed.
fn update_labels(api: &dyn HostingApi, issue_url: &str, target: &str, config: &Config) -> Option<Vec<String>> {
    let current = match api.issue_labels(issue_url) {
        Ok(current) => current,
        Err(e) => {
            warn!("Could not read labels of {}: {e}", e.url());
            return None;
        },
    };

    let managed = config.labels.managed();
    let mut labels: Vec<String> =
        current.names.into_iter().filter(|l| !managed.contains(&l.as_str())).collect();
    labels.push(target.to_string());
    labels.sort();
    labels.dedup();

    match api.replace_labels(&current.labels_url, &labels) {
        Ok(()) => Some(labels),
        Err(e) => {
            warn!("Could not write labels to {}: {e}", e.url());
            None
        },
    }
}
