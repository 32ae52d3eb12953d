//! Command implementations

mod account;
mod check;
mod prepare;
mod repository;
mod serve;

pub use account::account;
pub use check::{check_files, check_message};
pub use prepare::release;
pub use repository::repository;
pub use serve::serve;

use anyhow::Context;
use kwalitee::adapters::SqliteVerdictStore;
use kwalitee::config::Config;

/// Open the verdict database named by the configuration
fn open_store(config: &Config) -> anyhow::Result<SqliteVerdictStore> {
    let path = config.server.database_path();
    SqliteVerdictStore::new(&path).with_context(|| format!("Failed to open {}", path.display()))
}

/// Split `owner/name`
fn split_fullname(fullname: &str) -> anyhow::Result<(&str, &str)> {
    match fullname.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        },
        _ => anyhow::bail!("Expected owner/name, got {fullname}"),
    }
}
