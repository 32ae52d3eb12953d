//! Recording mock of the hosting API
//!
//! Responses are keyed by URL; every call is recorded so tests can assert
//! on what the worker sent, and on the absence of network traffic.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use kwalitee::core::models::{
    ChangedFile, CommentBody, CommitDocument, Finding, IssueLabels, PullRequestDocument, StatusBody,
};
use kwalitee::core::ports::{AnalyzerError, FileAnalyzer, HostingApi, HostingConnector, NetworkError};
use kwalitee::worker::{Job, JobQueue, QueueError};

/// One call made against the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// Any read
    Get(String),
    /// A posted comment
    Comment(String, CommentBody),
    /// A posted status
    Status(String, StatusBody),
    /// A label replacement
    Labels(String, Vec<String>),
}

/// Canned responses and the call log
#[derive(Debug, Default)]
pub struct HostingState {
    pub commits: HashMap<String, CommitDocument>,
    pub pull_requests: HashMap<String, PullRequestDocument>,
    pub pull_request_commits: HashMap<String, Vec<CommitDocument>>,
    pub pull_request_files: HashMap<String, Vec<ChangedFile>>,
    pub downloads: HashMap<String, Vec<u8>>,
    pub repository_files: HashMap<String, Vec<u8>>,
    pub labels: HashMap<String, IssueLabels>,
    /// URLs answering with HTTP 500
    pub failing: HashSet<String>,
    pub calls: Vec<Call>,
}

/// Called with the URL of every read, after it is recorded
type ReadHook = Box<dyn Fn(&str) + Send>;

/// Shared handle on a [`HostingState`]
#[derive(Clone, Default)]
pub struct MockHosting {
    pub state: Arc<Mutex<HostingState>>,
    hook: Arc<Mutex<Option<ReadHook>>>,
}

impl std::fmt::Debug for MockHosting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHosting").field("state", &self.state).finish_non_exhaustive()
    }
}

impl MockHosting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` on every read, for instance to race the worker
    pub fn on_read(&self, hook: impl Fn(&str) + Send + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    /// Run `f` on the state
    pub fn with<R>(&self, f: impl FnOnce(&mut HostingState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|s| s.calls.clone())
    }

    pub fn clear_calls(&self) {
        self.with(|s| s.calls.clear());
    }

    pub fn fail(&self, url: &str) {
        self.with(|s| s.failing.insert(url.to_string()));
    }

    pub fn comments(&self) -> Vec<(String, CommentBody)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Comment(url, body) => Some((url, body)),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<(String, StatusBody)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Status(url, body) => Some((url, body)),
                _ => None,
            })
            .collect()
    }

    pub fn label_writes(&self) -> Vec<(String, Vec<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Labels(url, labels) => Some((url, labels)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call, url: &str) -> Result<(), NetworkError> {
        self.with(|s| {
            s.calls.push(call);
            if s.failing.contains(url) {
                Err(NetworkError::Status {
                    url: url.to_string(),
                    status: 500,
                })
            } else {
                Ok(())
            }
        })
    }

    fn read<T: Clone>(
        &self,
        url: &str,
        pick: impl FnOnce(&HostingState) -> Option<&T>,
    ) -> Result<T, NetworkError> {
        self.record(Call::Get(url.to_string()), url)?;
        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook(url);
        }
        self.with(|s| pick(s).cloned()).ok_or_else(|| NetworkError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

impl HostingApi for MockHosting {
    fn commit(&self, url: &str) -> Result<CommitDocument, NetworkError> {
        self.read(url, |s| s.commits.get(url))
    }

    fn pull_request(&self, url: &str) -> Result<PullRequestDocument, NetworkError> {
        self.read(url, |s| s.pull_requests.get(url))
    }

    fn pull_request_commits(&self, url: &str) -> Result<Vec<CommitDocument>, NetworkError> {
        self.read(url, |s| s.pull_request_commits.get(url))
    }

    fn pull_request_files(&self, url: &str) -> Result<Vec<ChangedFile>, NetworkError> {
        self.read(url, |s| s.pull_request_files.get(url))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        self.read(url, |s| s.downloads.get(url))
    }

    fn file_contents(
        &self,
        repository: &str,
        path: &str,
        reference: &str,
    ) -> Result<Option<Vec<u8>>, NetworkError> {
        let key = format!("{repository}/{reference}/{path}");
        self.record(Call::Get(key.clone()), &key)?;
        Ok(self.with(|s| s.repository_files.get(&key).cloned()))
    }

    fn post_comment(&self, url: &str, comment: &CommentBody) -> Result<(), NetworkError> {
        self.record(Call::Comment(url.to_string(), comment.clone()), url)
    }

    fn post_status(&self, url: &str, status: &StatusBody) -> Result<(), NetworkError> {
        self.record(Call::Status(url.to_string(), status.clone()), url)
    }

    fn issue_labels(&self, issue_url: &str) -> Result<IssueLabels, NetworkError> {
        self.read(issue_url, |s| s.labels.get(issue_url))
    }

    fn replace_labels(&self, labels_url: &str, labels: &[String]) -> Result<(), NetworkError> {
        self.record(Call::Labels(labels_url.to_string(), labels.to_vec()), labels_url)
    }
}

/// Connector handing out clones of one [`MockHosting`], recording tokens
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    pub hosting: MockHosting,
    pub tokens: Arc<Mutex<Vec<Option<String>>>>,
}

impl MockConnector {
    pub fn new(hosting: MockHosting) -> Self {
        Self {
            hosting,
            tokens: Arc::default(),
        }
    }
}

impl HostingConnector for MockConnector {
    fn connect(&self, token: Option<&str>) -> Box<dyn HostingApi> {
        self.tokens.lock().unwrap().push(token.map(str::to_string));
        Box::new(self.hosting.clone())
    }
}

/// Queue keeping jobs in memory
#[derive(Debug, Default)]
pub struct RecordingQueue {
    pub jobs: Mutex<Vec<Job>>,
    pub closed: bool,
}

impl RecordingQueue {
    pub fn jobs(&self) -> Vec<Job> {
        self.jobs.lock().unwrap().clone()
    }
}

impl JobQueue for RecordingQueue {
    fn enqueue(&self, job: Job) -> Result<(), QueueError> {
        if self.closed {
            return Err(QueueError);
        }
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

/// Analyzer whose every run hits its deadline
#[derive(Debug)]
pub struct HungAnalyzer;

impl FileAnalyzer for HungAnalyzer {
    fn name(&self) -> &str {
        "hung"
    }

    fn applies_to(&self, _path: &Path) -> bool {
        true
    }

    fn analyze(&self, _path: &Path) -> Result<Vec<Finding>, AnalyzerError> {
        Err(AnalyzerError::Timeout {
            name: "hung".to_string(),
            seconds: 180,
        })
    }
}
