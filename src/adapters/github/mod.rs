//! GitHub implementation of [`HostingApi`]
//!
//! Blocking `reqwest` client; workers run on plain threads so there is no
//! runtime to hand requests to.
//!
//! - [`wire`] - REST payload shapes and their mapping onto core documents

mod wire;

use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, LINK, USER_AGENT};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::models::{
    ChangedFile, CommentBody, CommitDocument, IssueLabels, PullRequestDocument, StatusBody,
};
use crate::core::ports::{HostingApi, HostingConnector, NetworkError};

/// Upper bound on followed pages of a listing
const MAX_PAGES: usize = 30;

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

fn transport(url: &str, error: &reqwest::Error) -> NetworkError {
    NetworkError::Transport {
        url: url.to_string(),
        message: error.to_string(),
    }
}

/// Builds [`GitHubClient`]s sharing one connection pool
#[derive(Debug, Clone)]
pub struct GitHubConnector {
    http: Client,
    api_url: String,
}

impl GitHubConnector {
    /// Connector for the API rooted at `api_url`
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, NetworkError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(timeout)
            .build()
            .map_err(|e| transport(api_url, &e))?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }
}

impl HostingConnector for GitHubConnector {
    fn connect(&self, token: Option<&str>) -> Box<dyn HostingApi> {
        Box::new(GitHubClient {
            http: self.http.clone(),
            api_url: self.api_url.clone(),
            token: token.map(String::from),
        })
    }
}

/// GitHub REST client acting with one token
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    fn request(&self, builder: RequestBuilder, accept: &str) -> RequestBuilder {
        let builder = builder
            .header(ACCEPT, accept)
            .header(USER_AGENT, concat!("kwalitee/", env!("CARGO_PKG_VERSION")));
        match &self.token {
            Some(token) => builder.header(reqwest::header::AUTHORIZATION, format!("token {token}")),
            None => builder,
        }
    }

    fn send(&self, url: &str, builder: RequestBuilder) -> Result<Response, NetworkError> {
        debug!("GitHub request {url}");
        let response = builder.send().map_err(|e| transport(url, &e))?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            })
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, NetworkError> {
        let response = self.send(url, self.request(self.http.get(url), JSON_MEDIA_TYPE))?;
        response.json().map_err(|e| NetworkError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn get_pages<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, NetworkError> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());
        let mut followed = 0;
        while let Some(page) = next.take() {
            if followed == MAX_PAGES {
                warn!("Listing {url} truncated after {MAX_PAGES} pages, {page} not fetched");
                break;
            }
            followed += 1;
            let response = self.send(&page, self.request(self.http.get(&page), JSON_MEDIA_TYPE))?;
            next = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(wire::next_link);
            let batch: Vec<T> = response.json().map_err(|e| NetworkError::Decode {
                url: page.clone(),
                message: e.to_string(),
            })?;
            items.extend(batch);
        }
        Ok(items)
    }

    fn send_json<B: Serialize + ?Sized>(&self, builder: RequestBuilder, url: &str, body: &B) -> Result<(), NetworkError> {
        self.send(url, self.request(builder, JSON_MEDIA_TYPE).json(body)).map(drop)
    }
}

impl HostingApi for GitHubClient {
    fn commit(&self, url: &str) -> Result<CommitDocument, NetworkError> {
        self.get_json::<wire::Commit>(url).map(CommitDocument::from)
    }

    fn pull_request(&self, url: &str) -> Result<PullRequestDocument, NetworkError> {
        self.get_json::<wire::PullRequest>(url).map(PullRequestDocument::from)
    }

    fn pull_request_commits(&self, url: &str) -> Result<Vec<CommitDocument>, NetworkError> {
        let commits: Vec<wire::Commit> = self.get_pages(url)?;
        Ok(commits.into_iter().map(CommitDocument::from).collect())
    }

    fn pull_request_files(&self, url: &str) -> Result<Vec<ChangedFile>, NetworkError> {
        let files: Vec<wire::File> = self.get_pages(url)?;
        Ok(files.into_iter().filter_map(|f| f.into_changed(None)).collect())
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        let response = self.send(url, self.request(self.http.get(url), RAW_MEDIA_TYPE))?;
        response.bytes().map(|b| b.to_vec()).map_err(|e| transport(url, &e))
    }

    fn file_contents(
        &self,
        repository: &str,
        path: &str,
        reference: &str,
    ) -> Result<Option<Vec<u8>>, NetworkError> {
        let url = format!("{}/repos/{repository}/contents/{path}?ref={reference}", self.api_url);
        match self.send(&url, self.request(self.http.get(&url), RAW_MEDIA_TYPE)) {
            Ok(response) => response.bytes().map(|b| Some(b.to_vec())).map_err(|e| transport(&url, &e)),
            Err(NetworkError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn post_comment(&self, url: &str, comment: &CommentBody) -> Result<(), NetworkError> {
        self.send_json(self.http.post(url), url, comment)
    }

    fn post_status(&self, url: &str, status: &StatusBody) -> Result<(), NetworkError> {
        self.send_json(self.http.post(url), url, status)
    }

    fn issue_labels(&self, issue_url: &str) -> Result<IssueLabels, NetworkError> {
        self.get_json::<wire::Issue>(issue_url).map(IssueLabels::from)
    }

    fn replace_labels(&self, labels_url: &str, labels: &[String]) -> Result<(), NetworkError> {
        self.send_json(self.http.put(labels_url), labels_url, labels)
    }
}
