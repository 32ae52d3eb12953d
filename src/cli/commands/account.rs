//! Account management

use kwalitee::config::Config;
use kwalitee::core::ports::VerdictStore;
use kwalitee::output::{AccountList, OperationResult, OutputMode};

use crate::cli::app::AccountAction;
use super::open_store;

/// Handle `kwalitee account <action>`
pub fn account(config: &Config, action: AccountAction, mode: OutputMode) -> anyhow::Result<()> {
    let store = open_store(config)?;
    match action {
        AccountAction::Add { name, email, token } => {
            let account = store.update_or_create_account(&name, email.as_deref(), token.as_deref())?;
            OperationResult::ok(format!("Account {} saved", account.name)).render(mode);
        },
        AccountAction::List => {
            AccountList {
                accounts: store.list_accounts()?,
            }
            .render(mode);
        },
    }
    Ok(())
}
