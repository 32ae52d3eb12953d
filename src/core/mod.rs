//! Core domain logic for kwalitee
//!
//! Validators, verdict models and the port traits behind which the
//! hosting API, the storage and external lint tools live.
//!
//! ## Architecture
//!
//! - `models/` - Domain types (Finding, verdicts, hosting documents)
//! - `services/` - Validators and per-file checking
//! - `ports/` - Trait definitions for external dependencies

pub mod models;
pub mod ports;
pub mod services;
