//! Local git repository access
//!
//! Reads commit messages for `kwalitee check message` and
//! `kwalitee prepare release` through `git2`.

use std::path::Path;

use anyhow::Context;
use git2::{Repository, Sort};

/// A local commit and its message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCommit {
    /// Full hash
    pub sha: String,
    /// Raw message
    pub message: String,
}

impl LocalCommit {
    /// Abbreviated hash for display
    #[must_use]
    pub fn short_sha(&self) -> &str {
        self.sha.get(..8).unwrap_or(&self.sha)
    }
}

/// Commits selected by `spec`, oldest first, merge commits skipped
///
/// `spec` is either a range (`origin/master..HEAD`) or a single revision,
/// in which case only that commit is returned.
pub fn commits(workdir: &Path, spec: &str) -> anyhow::Result<Vec<LocalCommit>> {
    select(workdir, spec, false)
}

/// Like [`commits`], but a single revision yields its whole history
pub fn history(workdir: &Path, spec: &str) -> anyhow::Result<Vec<LocalCommit>> {
    select(workdir, spec, true)
}

fn select(workdir: &Path, spec: &str, ancestors: bool) -> anyhow::Result<Vec<LocalCommit>> {
    let repo = Repository::discover(workdir)
        .with_context(|| format!("{} is not inside a git repository", workdir.display()))?;

    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;

    if spec.contains("..") {
        walk.push_range(spec).with_context(|| format!("invalid range {spec}"))?;
    } else {
        let object = repo.revparse_single(spec).with_context(|| format!("unknown revision {spec}"))?;
        let commit = object.peel_to_commit()?;
        if !ancestors {
            return Ok(to_local(&commit).into_iter().collect());
        }
        walk.push(commit.id())?;
    }

    let mut commits = Vec::new();
    for oid in walk {
        let commit = repo.find_commit(oid?)?;
        commits.extend(to_local(&commit));
    }
    Ok(commits)
}

fn to_local(commit: &git2::Commit<'_>) -> Option<LocalCommit> {
    if commit.parent_count() > 1 {
        return None;
    }
    Some(LocalCommit {
        sha: commit.id().to_string(),
        message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
    })
}
