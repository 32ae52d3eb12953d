//! GitHub REST payload shapes
//!
//! Only the fields kwalitee reads are declared; serde ignores the rest.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::core::models::{ChangedFile, CommitDocument, IssueLabels, PullRequestDocument};

static REF_PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[?&]ref=([^&=]+)").unwrap());

#[derive(Debug, Deserialize)]
pub(super) struct Commit {
    sha: String,
    url: String,
    html_url: String,
    comments_url: String,
    commit: CommitDetail,
    #[serde(default)]
    files: Vec<File>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct File {
    filename: String,
    status: String,
    raw_url: Option<String>,
    #[serde(default)]
    contents_url: String,
}

impl File {
    /// Changed file whose content belongs to `sha`, `None` without a raw URL
    pub(super) fn into_changed(self, sha: Option<&str>) -> Option<ChangedFile> {
        let sha = sha.map(String::from).or_else(|| {
            REF_PARAM.captures(&self.contents_url).map(|caps| caps[1].to_string())
        })?;
        Some(ChangedFile {
            filename: self.filename,
            status: self.status,
            raw_url: self.raw_url?,
            sha,
        })
    }
}

impl From<Commit> for CommitDocument {
    fn from(commit: Commit) -> Self {
        let statuses_url = commit.url.replacen("/commits/", "/statuses/", 1);
        let files = commit
            .files
            .into_iter()
            .filter_map(|file| file.into_changed(Some(&commit.sha)))
            .collect();
        Self {
            sha: commit.sha,
            html_url: commit.html_url,
            comments_url: commit.comments_url,
            statuses_url,
            message: commit.commit.message,
            files,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PullRequest {
    url: String,
    html_url: String,
    title: String,
    issue_url: String,
    commits_url: String,
    review_comments_url: String,
    statuses_url: String,
    head: Head,
    base: Base,
}

#[derive(Debug, Deserialize)]
struct Head {
    sha: String,
    label: String,
}

#[derive(Debug, Deserialize)]
struct Base {
    #[serde(rename = "ref")]
    reference: String,
    repo: BaseRepository,
}

#[derive(Debug, Deserialize)]
struct BaseRepository {
    full_name: String,
}

impl From<PullRequest> for PullRequestDocument {
    fn from(pr: PullRequest) -> Self {
        let files_url = format!("{}/files", pr.url);
        Self {
            url: pr.url,
            html_url: pr.html_url,
            title: pr.title,
            issue_url: pr.issue_url,
            commits_url: pr.commits_url,
            files_url,
            review_comments_url: pr.review_comments_url,
            statuses_url: pr.statuses_url,
            head_sha: pr.head.sha,
            head_label: pr.head.label,
            base_repository: pr.base.repo.full_name,
            base_ref: pr.base.reference,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct Issue {
    #[serde(default)]
    labels: Vec<Label>,
    labels_url: String,
}

#[derive(Debug, Deserialize)]
struct Label {
    name: String,
}

impl From<Issue> for IssueLabels {
    fn from(issue: Issue) -> Self {
        Self {
            names: issue.labels.into_iter().map(|l| l.name).collect(),
            labels_url: issue.labels_url.replace("{/name}", ""),
        }
    }
}

/// URL of the next page from a `Link` header
pub(super) fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        params
            .split(';')
            .any(|p| p.trim() == r#"rel="next""#)
            .then(|| target.trim().trim_start_matches('<').trim_end_matches('>').to_string())
    })
}
