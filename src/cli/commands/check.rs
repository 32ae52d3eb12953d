//! Local checks of commit messages and files

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use log::debug;
use walkdir::WalkDir;

use kwalitee::adapters::{build_registry, git};
use kwalitee::config::Config;
use kwalitee::core::services::{FileChecker, MessageValidator};
use kwalitee::output::{CheckReport, CheckedItem, OutputMode};

/// Check commit messages, from a file or from local history
pub fn check_message(
    config: &Config,
    range: &str,
    file: Option<&Path>,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let validator = MessageValidator::new(config.message.clone());

    let report = if let Some(file) = file {
        let text = fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let findings = validator.check(&text);
        CheckReport::new(1, vec![CheckedItem::new(file.display().to_string(), None, &findings)])
    } else {
        let commits = git::commits(Path::new("."), range)?;
        let items = commits
            .iter()
            .map(|commit| {
                let summary = commit.message.lines().next().map(str::to_string);
                CheckedItem::new(commit.short_sha(), summary, &validator.check(&commit.message))
            })
            .collect();
        CheckReport::new(commits.len(), items)
    };

    finish(&report, mode)
}

/// Check every file under `paths`
pub fn check_files(
    config: &Config,
    paths: &[PathBuf],
    year: Option<i32>,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let registry = Arc::new(build_registry(&config.analyzers, config.server.worker_timeout()));
    let checker = FileChecker::new(config.checks.clone(), registry).context("Invalid excludes pattern")?;
    let checker = match year {
        Some(year) => checker.with_year(year),
        None => checker,
    };

    let mut checked = 0;
    let mut items = Vec::new();
    for path in paths {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_entry(|e| !is_vcs_dir(e.path())) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = display_name(entry.path());
            let Some(findings) = checker
                .check_file(entry.path(), &name)
                .with_context(|| format!("Failed to check {name}"))?
            else {
                debug!("Skipping excluded {name}");
                continue;
            };
            checked += 1;
            items.push(CheckedItem::new(name, None, &findings));
        }
    }

    finish(&CheckReport::new(checked, items), mode)
}

fn is_vcs_dir(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n == ".git" || n == ".hg")
}

/// Path as matched against `excludes`: relative, `/`-separated, no leading `./`
fn display_name(path: &Path) -> String {
    if path.is_absolute() {
        return path.display().to_string();
    }
    let path = path.strip_prefix(".").unwrap_or(path);
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn finish(report: &CheckReport, mode: OutputMode) -> anyhow::Result<()> {
    report.render(mode);
    if !report.passed {
        std::process::exit(1);
    }
    Ok(())
}
