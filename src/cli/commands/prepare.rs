//! Release preparation from local history

use std::path::Path;

use kwalitee::adapters::git;
use kwalitee::config::Config;
use kwalitee::core::services::release_notes;
use kwalitee::output::{OutputMode, ReleaseReport};

/// Print release notes for the commits selected by `range`
pub fn release(config: &Config, range: &str, by_component: bool, mode: OutputMode) -> anyhow::Result<()> {
    let commits = git::history(Path::new("."), range)?;
    let pairs: Vec<(&str, &str)> = commits.iter().map(|c| (c.sha.as_str(), c.message.as_str())).collect();

    let report = ReleaseReport {
        commits: commits.len(),
        sections: release_notes(&pairs, &config.message.bullet_labels),
        by_component,
    };
    report.render(mode);
    Ok(())
}
