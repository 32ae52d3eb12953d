//! Reading commits of a local repository

use std::env;
use std::path::Path;

use kwalitee::adapters::git;
use serial_test::serial;

use crate::common::git_repo::TempGitRepo;

#[test]
fn range_lists_commits_oldest_first() {
    let repo = TempGitRepo::new();
    repo.write_file("a.py", "import os\n");
    let base = repo.commit("global: initial");
    repo.write_file("b.py", "import sys\n");
    let second = repo.commit("search: adds facets");
    repo.write_file("c.py", "import re\n");
    let third = repo.commit("search: fixes facets");

    let commits = git::commits(repo.path(), &format!("{base}..HEAD")).unwrap();

    let shas: Vec<&str> = commits.iter().map(|c| c.sha.as_str()).collect();
    assert_eq!(shas, [second.as_str(), third.as_str()]);
    assert_eq!(commits[0].message, "search: adds facets");
}

#[test]
fn missing_repository_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(git::commits(dir.path(), "HEAD").is_err());
}

#[test]
#[serial(cwd)]
fn current_directory_is_discovered() {
    let repo = TempGitRepo::new();
    repo.write_file("kwalitee/app.py", "import os\n");
    let sha = repo.commit("global: initial");
    let previous = env::current_dir().unwrap();

    env::set_current_dir(repo.path().join("kwalitee")).unwrap();
    let commits = git::commits(Path::new("."), "HEAD");
    env::set_current_dir(previous).unwrap();

    let commits = commits.unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].sha, sha);
    assert_eq!(commits[0].short_sha(), &sha[..8]);
}
