//! Business logic services
//!
//! The validators are pure functions over text and bytes; [`files`] adds
//! the thin layer that reads scratch files and runs registered analyzers.
//!
//! - [`message`] - Commit message validation
//! - [`license`] - License header validation
//! - [`files`] - Per-file checks and analyzer registry
//! - [`release`] - Release notes from labelled bullets

pub mod files;
pub mod license;
pub mod message;
pub mod release;

pub use files::{AnalyzerRegistry, CheckError, CheckOptions, FileChecker, comment_style};
pub use license::{CommentStyle, LicenseOptions, check_license, check_license_content};
pub use message::{BulletLabel, MessageOptions, MessageValidator, check_message, is_wip};
pub use release::{ReleaseNote, ReleaseSection, release_notes, render_release_notes};
