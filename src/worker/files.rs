//! Scratch-area file checking shared by both job kinds

use std::fs;
use std::path::{Component, Path, PathBuf};

use log::{debug, warn};

use super::WorkerError;
use crate::core::models::{ChangedFile, CommentBody, FileReport, FileReports, render_all};
use crate::core::ports::HostingApi;
use crate::core::services::FileChecker;

/// Relative path safe to join under the scratch directory
fn scratch_path(name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    path.components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| path.to_path_buf())
        .filter(|p| p.components().next().is_some())
}

/// Download every changed, non-removed file and check it
///
/// A file that cannot be downloaded is logged and left out; excluded files
/// are never downloaded.
pub(super) fn check_changed_files(
    api: &dyn HostingApi,
    checker: &FileChecker,
    files: &[ChangedFile],
) -> Result<FileReports, WorkerError> {
    let scratch = tempfile::tempdir()?;
    let mut reports = FileReports::new();

    for file in files.iter().filter(|f| !f.is_removed()) {
        if checker.is_excluded(&file.filename) {
            debug!("Skipping excluded {}", file.filename);
            continue;
        }
        let Some(relative) = scratch_path(&file.filename) else {
            warn!("Refusing to check suspicious path {}", file.filename);
            continue;
        };
        let content = match api.download(&file.raw_url) {
            Ok(content) => content,
            Err(e) => {
                warn!("Could not download {}: {e}", e.url());
                continue;
            },
        };

        let destination = scratch.path().join(relative);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&destination, content)?;

        if let Some(errors) = checker.check_file(&destination, &file.filename)? {
            reports.insert(
                file.filename.clone(),
                FileReport {
                    sha: file.sha.clone(),
                    errors,
                },
            );
        }
    }
    Ok(reports)
}

/// Number of findings over all files
pub(super) fn total_errors(reports: &FileReports) -> usize {
    reports.values().map(|r| r.errors.len()).sum()
}

/// One comment per file with findings, in path order, at the top of the file
pub(super) fn post_file_comments(api: &dyn HostingApi, url: &str, reports: &FileReports) {
    for (path, report) in reports.iter().filter(|(_, r)| !r.errors.is_empty()) {
        let comment = CommentBody::File {
            body: render_all(&report.errors).join("\n"),
            commit_id: report.sha.clone(),
            path: path.clone(),
            position: 0,
        };
        if let Err(e) = api.post_comment(url, &comment) {
            warn!("Could not comment {path} on {}: {e}", e.url());
        }
    }
}
