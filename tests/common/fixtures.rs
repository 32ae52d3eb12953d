//! Test data builders
//!
//! A [`World`] wires an in-memory store, a recording hosting mock and a
//! worker pinned to year 2015, so license headers below stay valid.

use std::sync::Arc;

use kwalitee::adapters::SqliteVerdictStore;
use kwalitee::config::Config;
use kwalitee::core::models::{
    BranchContent, BranchVerdict, ChangedFile, CommitDocument, CommitVerdict, IssueLabels,
    PullRequestDocument, Repository,
};
use kwalitee::core::ports::VerdictStore;
use kwalitee::core::services::AnalyzerRegistry;
use kwalitee::worker::Worker;

use super::mocks::{MockConnector, MockHosting};

pub const API: &str = "https://api.github.com";
pub const OWNER: &str = "invenio";
pub const REPOSITORY: &str = "kwalitee";
pub const YEAR: i32 = 2015;

/// Python file with a valid 2015 GPLv2 header
pub const VALID_PY: &str = "# -*- coding: utf-8 -*-\n\
    #\n\
    # This file is part of kwalitee.\n\
    # Copyright (C) 2014, 2015 CERN.\n\
    #\n\
    # kwalitee is free software; you can redistribute it and/or\n\
    # modify it under the terms of the GNU General Public License.\n\
    #\n\
    # kwalitee is distributed in the hope that it will be useful.\n\
    #\n\
    # You should have received a copy of the GNU General Public License\n\
    # along with kwalitee; if not, write to the Free Software Foundation.\n\
    \n\
    import os\n";

/// Python file without any header
pub const BARE_PY: &str = "import os\n";

/// A well-formed message passing the default quorum through a trusted reviewer
pub const GOOD_MESSAGE: &str = "global: adds kwalitee\n\nSigned-off-by: Jane <jane@example.org>";

/// Configuration used by worker tests
pub fn config() -> Config {
    let mut config = Config::default();
    config.message.components = vec!["global".to_string(), "search".to_string()];
    config.message.trusted = vec!["jane@example.org".to_string()];
    config.checks.check_analyzers = false;
    config.server.base_url = "https://kwalitee.example.org".to_string();
    config
}

/// Store, hosting mock and a repository to work in
pub struct World {
    pub store: Arc<SqliteVerdictStore>,
    pub hosting: MockHosting,
    pub connector: MockConnector,
    pub repository: Repository,
    pub config: Config,
}

impl World {
    pub fn new() -> Self {
        Self::with_config(config())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(SqliteVerdictStore::in_memory().unwrap());
        let account = store.update_or_create_account(OWNER, None, Some("owner-token")).unwrap();
        let repository = store.find_or_create_repository(account.id, REPOSITORY).unwrap();
        let hosting = MockHosting::new();
        let connector = MockConnector::new(hosting.clone());
        Self {
            store,
            hosting,
            connector,
            repository,
            config,
        }
    }

    pub fn worker(&self) -> Worker {
        self.worker_with(AnalyzerRegistry::new())
    }

    pub fn worker_with(&self, analyzers: AnalyzerRegistry) -> Worker {
        Worker::new(
            self.store.clone(),
            Arc::new(self.connector.clone()),
            Arc::new(analyzers),
            Arc::new(self.config.clone()),
        )
        .with_year(YEAR)
    }

    pub fn commit_verdict(&self, sha: &str) -> CommitVerdict {
        self.store.find_or_create_commit(self.repository.id, sha, &html_url(sha)).unwrap()
    }

    pub fn reload_commit(&self, id: i64) -> CommitVerdict {
        self.store.get_commit(id).unwrap().unwrap()
    }

    pub fn branch_verdict(&self, head: &CommitVerdict, label: &str) -> BranchVerdict {
        self.store
            .find_or_create_branch(head.id, label, &pull_request_html(), &BranchContent::default())
            .unwrap()
    }

    pub fn reload_branch(&self, id: i64) -> BranchVerdict {
        self.store.get_branch(id).unwrap().unwrap()
    }

    /// Register a commit document, its files and their contents
    pub fn publish_commit(&self, sha: &str, message: &str, files: &[(&str, &str)]) -> CommitDocument {
        let document = commit_document(sha, message, files);
        self.hosting.with(|s| {
            s.commits.insert(commit_url(sha), document.clone());
            for (name, content) in files {
                s.downloads.insert(raw_url(sha, name), content.as_bytes().to_vec());
            }
        });
        document
    }

    /// Register a pull request with its commits, files and labels
    pub fn publish_pull_request(
        &self,
        title: &str,
        commits: Vec<CommitDocument>,
        files: &[(&str, &str)],
        labels: &[&str],
    ) -> PullRequestDocument {
        let head = commits.last().map(|c| c.sha.clone()).unwrap_or_default();
        let document = pull_request_document(title, &head);
        let changed: Vec<ChangedFile> = files.iter().map(|(name, _)| changed_file(&head, name)).collect();
        self.hosting.with(|s| {
            s.pull_requests.insert(pull_request_url(), document.clone());
            s.pull_request_commits.insert(document.commits_url.clone(), commits);
            s.pull_request_files.insert(document.files_url.clone(), changed);
            for (name, content) in files {
                s.downloads.insert(raw_url(&head, name), content.as_bytes().to_vec());
            }
            s.labels.insert(
                document.issue_url.clone(),
                IssueLabels {
                    names: labels.iter().map(|l| (*l).to_string()).collect(),
                    labels_url: format!("{}/labels", document.issue_url),
                },
            );
        });
        document
    }
}

pub fn commit_url(sha: &str) -> String {
    format!("{API}/repos/{OWNER}/{REPOSITORY}/commits/{sha}")
}

pub fn html_url(sha: &str) -> String {
    format!("https://github.com/{OWNER}/{REPOSITORY}/commit/{sha}")
}

pub fn raw_url(sha: &str, name: &str) -> String {
    format!("https://github.com/{OWNER}/{REPOSITORY}/raw/{sha}/{name}")
}

pub fn status_url(sha: &str) -> String {
    format!("https://kwalitee.example.org/api/commits/{OWNER}/{REPOSITORY}/{sha}")
}

pub fn pull_request_url() -> String {
    format!("{API}/repos/{OWNER}/{REPOSITORY}/pulls/7")
}

pub fn pull_request_html() -> String {
    format!("https://github.com/{OWNER}/{REPOSITORY}/pull/7")
}

pub fn changed_file(sha: &str, name: &str) -> ChangedFile {
    ChangedFile {
        filename: name.to_string(),
        status: "modified".to_string(),
        raw_url: raw_url(sha, name),
        sha: sha.to_string(),
    }
}

pub fn commit_document(sha: &str, message: &str, files: &[(&str, &str)]) -> CommitDocument {
    let url = commit_url(sha);
    CommitDocument {
        sha: sha.to_string(),
        html_url: html_url(sha),
        comments_url: format!("{url}/comments"),
        statuses_url: format!("{API}/repos/{OWNER}/{REPOSITORY}/statuses/{sha}"),
        message: message.to_string(),
        files: files.iter().map(|(name, _)| changed_file(sha, name)).collect(),
    }
}

pub fn pull_request_document(title: &str, head: &str) -> PullRequestDocument {
    let url = pull_request_url();
    let issue_url = format!("{API}/repos/{OWNER}/{REPOSITORY}/issues/7");
    PullRequestDocument {
        url: url.clone(),
        html_url: pull_request_html(),
        title: title.to_string(),
        issue_url,
        commits_url: format!("{url}/commits"),
        files_url: format!("{url}/files"),
        review_comments_url: format!("{url}/comments"),
        statuses_url: format!("{API}/repos/{OWNER}/{REPOSITORY}/statuses/{head}"),
        head_sha: head.to_string(),
        head_label: "jane:feature".to_string(),
        base_repository: format!("{OWNER}/{REPOSITORY}"),
        base_ref: "master".to_string(),
    }
}
