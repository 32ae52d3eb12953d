//! Repository registration

use kwalitee::config::Config;
use kwalitee::core::ports::VerdictStore;
use kwalitee::output::{OperationResult, OutputMode, RepositoryList};

use crate::cli::app::RepositoryAction;
use super::{open_store, split_fullname};

/// Handle `kwalitee repository <action>`
pub fn repository(config: &Config, action: RepositoryAction, mode: OutputMode) -> anyhow::Result<()> {
    let store = open_store(config)?;
    match action {
        RepositoryAction::Add { repository } => {
            let (owner, name) = split_fullname(&repository)?;
            let account = store.find_or_create_account(owner)?;
            let created = store.find_or_create_repository(account.id, name)?;
            OperationResult::ok(format!("Repository {} registered", created.fullname(&account)))
                .render(mode);
        },
        RepositoryAction::List { owner } => {
            let Some(account) = store.find_account(&owner)? else {
                anyhow::bail!("Account {owner} is not registered");
            };
            RepositoryList {
                repositories: store.list_repositories(account.id)?,
                owner: account.name,
            }
            .render(mode);
        },
        RepositoryAction::Remove { repository } => {
            let (owner, name) = split_fullname(&repository)?;
            let found = match store.find_account(owner)? {
                Some(account) => store.find_repository(account.id, name)?,
                None => None,
            };
            let Some(found) = found else {
                anyhow::bail!("Repository {repository} is not registered");
            };
            store.remove_repository(found.id)?;
            OperationResult::ok(format!("Repository {repository} removed")).render(mode);
        },
    }
    Ok(())
}
