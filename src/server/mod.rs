//! HTTP server adapters
//!
//! Translate between the HTTP framework and the HTTP-agnostic API layer.
//!
//! - `tiny_http` - blocking server receiving webhooks and serving verdicts

pub mod tiny_http;

pub use self::tiny_http::{Route, handle_request, serve};
