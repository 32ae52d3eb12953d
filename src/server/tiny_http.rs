//! tiny_http server adapter
//!
//! Handles routing, body reading, and response conversion for tiny_http.

use std::io::{Cursor, Read as _};

use log::{debug, info, warn};
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::api::{self, ApiError, ApiResponse, Dispatcher, WebhookEvent};

/// Header carrying the webhook event name
const EVENT_HEADER: &str = "X-GitHub-Event";

/// Largest webhook body accepted
const MAX_BODY: u64 = 25 * 1024 * 1024;

// =============================================================================
// ROUTING
// =============================================================================

/// An endpoint of the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `POST /payload`
    Payload,
    /// `GET /health`
    Health,
    /// `GET /api/commits/{owner}/{repository}`
    Commits {
        /// Account name
        owner: String,
        /// Repository name
        repository: String,
    },
    /// `GET /api/commits/{owner}/{repository}/{sha}`
    Commit {
        /// Account name
        owner: String,
        /// Repository name
        repository: String,
        /// Commit sha
        sha: String,
    },
    /// `GET /api/branches/{owner}/{repository}/{branch}`
    Branch {
        /// Account name
        owner: String,
        /// Repository name
        repository: String,
        /// Branch label, decoded
        branch: String,
    },
    /// `GET /api/branches/{owner}/{repository}/{branch}/{sha}`
    BranchHead {
        /// Account name
        owner: String,
        /// Repository name
        repository: String,
        /// Branch label, decoded
        branch: String,
        /// Head commit sha
        sha: String,
    },
}

impl Route {
    /// Match a method and URL; `None` for unknown endpoints
    #[must_use]
    pub fn parse(method: &Method, url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let segments: Vec<String> = path
            .trim_matches('/')
            .split('/')
            .map(decode_segment)
            .collect::<Option<_>>()?;
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        match (method, segments.as_slice()) {
            (Method::Post, ["payload"]) => Some(Self::Payload),
            (Method::Get, ["health"]) => Some(Self::Health),
            (Method::Get, ["api", "commits", owner, repository]) => Some(Self::Commits {
                owner: (*owner).to_string(),
                repository: (*repository).to_string(),
            }),
            (Method::Get, ["api", "commits", owner, repository, sha]) => Some(Self::Commit {
                owner: (*owner).to_string(),
                repository: (*repository).to_string(),
                sha: (*sha).to_string(),
            }),
            (Method::Get, ["api", "branches", owner, repository, branch]) => Some(Self::Branch {
                owner: (*owner).to_string(),
                repository: (*repository).to_string(),
                branch: (*branch).to_string(),
            }),
            (Method::Get, ["api", "branches", owner, repository, branch, sha]) => Some(Self::BranchHead {
                owner: (*owner).to_string(),
                repository: (*repository).to_string(),
                branch: (*branch).to_string(),
                sha: (*sha).to_string(),
            }),
            _ => None,
        }
    }
}

/// Percent-decode one path segment, `None` on malformed escapes
fn decode_segment(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = segment.get(i + 1..i + 3)?;
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

// =============================================================================
// REQUEST HANDLING
// =============================================================================

/// Serve requests on `bind` until the process is stopped
pub fn serve(bind: &str, dispatcher: &Dispatcher) -> anyhow::Result<()> {
    let server = Server::http(bind).map_err(|e| anyhow::anyhow!("Failed to start server on {bind}: {e}"))?;
    info!("Listening on http://{bind}");

    for mut request in server.incoming_requests() {
        let response = handle_request(dispatcher, &mut request);
        debug!("{} {} -> {}", request.method(), request.url(), response.status_code().0);
        if let Err(e) = request.respond(response) {
            warn!("Could not send response: {e}");
        }
    }
    Ok(())
}

/// Route a request to its handler and build the response
pub fn handle_request(dispatcher: &Dispatcher, request: &mut Request) -> Response<Cursor<Vec<u8>>> {
    let Some(route) = Route::parse(request.method(), request.url()) else {
        return error_response(&ApiError::not_found(format!(
            "API endpoint not found: {} {}",
            request.method(),
            request.url()
        )));
    };

    match route {
        Route::Payload => {
            let event = event_name(request);
            let result = read_body(request)
                .and_then(|body| WebhookEvent::parse(event.as_deref(), &body))
                .and_then(|event| dispatcher.dispatch(&event));
            if let Err(e) = &result {
                warn!("Rejected webhook delivery: {e}");
            }
            handle_result(result)
        },
        Route::Health => success_response(api::health()),
        Route::Commits { owner, repository } => handle_result(dispatcher.commits(&owner, &repository)),
        Route::Commit {
            owner,
            repository,
            sha,
        } => handle_result(dispatcher.commit(&owner, &repository, &sha)),
        Route::Branch {
            owner,
            repository,
            branch,
        } => handle_result(dispatcher.branch(&owner, &repository, &branch)),
        Route::BranchHead {
            owner,
            repository,
            branch,
            sha,
        } => handle_result(dispatcher.branch_head(&owner, &repository, &branch, &sha)),
    }
}

fn event_name(request: &Request) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(EVENT_HEADER))
        .map(|h| h.value.as_str().to_string())
}

// =============================================================================
// BODY READING
// =============================================================================

fn read_body(request: &mut Request) -> Result<Vec<u8>, ApiError> {
    let mut body = Vec::new();
    request
        .as_reader()
        .take(MAX_BODY)
        .read_to_end(&mut body)
        .map_err(|e| ApiError::bad_request(format!("Failed to read request body: {e}")))?;
    Ok(body)
}

// =============================================================================
// RESPONSE CONVERSION
// =============================================================================

/// Convert a handler result to an HTTP response
fn handle_result<T: Serialize>(result: Result<T, ApiError>) -> Response<Cursor<Vec<u8>>> {
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_response(&e),
    }
}

fn success_response<T: Serialize>(data: T) -> Response<Cursor<Vec<u8>>> {
    json_response(&ApiResponse::success(data), 200)
}

fn error_response(error: &ApiError) -> Response<Cursor<Vec<u8>>> {
    json_response(&ApiResponse::<()>::error(error), error.status_code())
}

/// Serialize data to JSON response with status code
fn json_response<T: Serialize>(data: &T, status: u16) -> Response<Cursor<Vec<u8>>> {
    let json = serde_json::to_string(data).unwrap_or_else(|_| r#"{"success":false}"#.to_string());
    let response = Response::from_data(json.into_bytes()).with_status_code(StatusCode(status));
    match Header::from_bytes("Content-Type", "application/json") {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}
