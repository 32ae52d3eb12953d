//! Common test utilities shared across test types
//!
//! - `fixtures.rs` - Test data builders and a wired worker
//! - `git_repo.rs` - Temporary git repository helper
//! - `mocks.rs` - Recording hosting API and job queue

pub mod fixtures;
pub mod mocks;
