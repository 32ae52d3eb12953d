//! Push jobs: one commit at a time

use log::{info, warn};

use super::files::{check_changed_files, post_file_comments};
use super::{Worker, WorkerError, post_status, status_description};
use crate::core::models::{CommentBody, CommitVerdict, FileReports, StatusBody, render_all};
use crate::core::services::{MessageValidator, is_wip};

/// Result of a push job
#[derive(Debug, Clone)]
pub struct PushReport {
    /// Verdict as stored at the end of the job
    pub verdict: CommitVerdict,
    /// Status sent to the hosting API, if any
    pub status: Option<StatusBody>,
}

/// Component of a commit message: the text before the first `:`
fn component(message: &str) -> &str {
    message.split_once(':').map_or(message, |(component, _)| component)
}

impl Worker {
    /// Check one commit and report on it
    ///
    /// A commit whose file phase already ran, for instance through a pull
    /// request, is returned as stored without touching the network.
    pub fn push(&self, commit_id: i64, commit_url: &str, status_url: &str) -> Result<PushReport, WorkerError> {
        let mut verdict =
            self.store.get_commit(commit_id)?.ok_or(WorkerError::UnknownCommit(commit_id))?;
        if !verdict.is_pending() {
            info!("Commit {} already checked, skipping", verdict.sha);
            return Ok(PushReport {
                verdict,
                status: None,
            });
        }

        let (_, owner) = self.owner_of(verdict.repository_id)?;
        let api = self.client_for(owner.as_ref());
        let commit = api.commit(commit_url)?;
        let config = &self.config;
        let context = &config.hosting.context;

        if is_wip(component(&commit.message)) && !config.checks.check_wip {
            info!("Commit {} is work in progress, checks skipped", verdict.sha);
            let status = StatusBody::new(
                "pending",
                status_url,
                "[pending] work in progress, checks skipped",
                context,
            );
            post_status(api.as_ref(), &commit.statuses_url, &status);
            return Ok(PushReport {
                verdict,
                status: Some(status),
            });
        }

        if config.checks.check_commit_messages && !verdict.content.message_checked {
            let findings = MessageValidator::new(config.message.clone()).check(&commit.message);
            verdict.set_message(findings);
            if !self.store.save_commit(&verdict)? {
                return self.completed_elsewhere(commit_id, &verdict.sha);
            }

            if !verdict.content.message.is_empty() {
                let body = render_all(&verdict.content.message).join("\n");
                if let Err(e) = api.post_comment(&commit.comments_url, &CommentBody::Plain { body }) {
                    warn!("Could not comment on {}: {e}", e.url());
                }
            }
        }

        let reports = if config.checks.checks_files() {
            let checker = self.file_checker(config)?;
            let reports = check_changed_files(api.as_ref(), &checker, &commit.files)?;
            post_file_comments(api.as_ref(), &commit.comments_url, &reports);
            reports
        } else {
            FileReports::new()
        };
        verdict.set_files(reports);

        if !self.store.save_commit(&verdict)? {
            return self.completed_elsewhere(commit_id, &verdict.sha);
        }

        let state = verdict.state.as_str();
        let status = StatusBody::new(
            state,
            status_url,
            &status_description(state, verdict.error_count),
            context,
        );
        post_status(api.as_ref(), &commit.statuses_url, &status);

        Ok(PushReport {
            verdict,
            status: Some(status),
        })
    }

    /// Another job finished the commit first; report its verdict, send nothing
    fn completed_elsewhere(&self, commit_id: i64, sha: &str) -> Result<PushReport, WorkerError> {
        info!("Commit {sha} was completed concurrently, stopping");
        let stored = self.store.get_commit(commit_id)?.ok_or(WorkerError::UnknownCommit(commit_id))?;
        Ok(PushReport {
            verdict: stored,
            status: None,
        })
    }
}
