//! Port traits (interfaces) for external dependencies
//!
//! These traits define the boundaries between core business logic
//! and external systems (hosting API, storage, lint tools).
//!
//! Implementations live in the `adapters` module.
//!
//! ## Design Principle
//!
//! The core domain logic depends only on these traits, never on concrete
//! implementations. Workers receive them as trait objects, tests swap in
//! recording mocks.

mod analyzer;
mod hosting;
mod verdict_store;

#[cfg(test)]
pub use analyzer::MockFileAnalyzer;
pub use analyzer::{AnalyzerError, FileAnalyzer};
pub use hosting::{HostingApi, HostingConnector, NetworkError};
pub use verdict_store::{StoreError, VerdictStore};
