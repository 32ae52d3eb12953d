//! Verdict store port
//!
//! Persistence contract for accounts, repositories and verdicts. Creation
//! goes exclusively through the `find_or_create_*` methods, which must be
//! backed by the unique constraints of the storage so that concurrent
//! callers converge on the same row.

use thiserror::Error;

use crate::core::models::{Account, BranchContent, BranchVerdict, CommitVerdict, Repository};

/// Storage failure
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend refused or failed an operation
    #[error("storage error during {operation}: {message}")]
    Backend {
        /// What was being done
        operation: String,
        /// Backend message
        message: String,
    },

    /// Stored content could not be decoded
    #[error("corrupt content in {table} #{id}: {message}")]
    Corrupt {
        /// Table name
        table: &'static str,
        /// Row id
        id: i64,
        /// Decoder message
        message: String,
    },

    /// Referenced row does not exist
    #[error("{0} not found")]
    NotFound(String),
}

impl StoreError {
    /// Backend error for `operation`
    pub fn backend(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: message.to_string(),
        }
    }
}

/// Persistent state of accounts, repositories and verdicts
pub trait VerdictStore: Send + Sync {
    /// Find an account by name
    fn find_account(&self, name: &str) -> Result<Option<Account>, StoreError>;

    /// Find an account by id
    fn get_account(&self, id: i64) -> Result<Option<Account>, StoreError>;

    /// Find or create an account by name
    fn find_or_create_account(&self, name: &str) -> Result<Account, StoreError>;

    /// Create an account, or update its email/token when given
    fn update_or_create_account(
        &self,
        name: &str,
        email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Account, StoreError>;

    /// All accounts, ordered by name
    fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// Find a repository of an account
    fn find_repository(&self, owner_id: i64, name: &str)
    -> Result<Option<Repository>, StoreError>;

    /// Find a repository by id
    fn get_repository(&self, id: i64) -> Result<Option<Repository>, StoreError>;

    /// Find or create a repository of an account
    fn find_or_create_repository(&self, owner_id: i64, name: &str)
    -> Result<Repository, StoreError>;

    /// Repositories of an account, ordered by name
    fn list_repositories(&self, owner_id: i64) -> Result<Vec<Repository>, StoreError>;

    /// Delete a repository with all its verdicts
    fn remove_repository(&self, id: i64) -> Result<(), StoreError>;

    /// Find or create the verdict of `sha` in a repository
    fn find_or_create_commit(
        &self,
        repository_id: i64,
        sha: &str,
        url: &str,
    ) -> Result<CommitVerdict, StoreError>;

    /// Load a commit verdict by id
    fn get_commit(&self, id: i64) -> Result<Option<CommitVerdict>, StoreError>;

    /// Load a commit verdict by repository and sha
    fn find_commit(&self, repository_id: i64, sha: &str)
    -> Result<Option<CommitVerdict>, StoreError>;

    /// Most recent commit verdicts of a repository
    fn latest_commits(&self, repository_id: i64, limit: usize)
    -> Result<Vec<CommitVerdict>, StoreError>;

    /// Persist content, state and error count of a commit verdict
    ///
    /// Returns `false` without writing when the stored verdict already has
    /// its file phase resolved.
    fn save_commit(&self, verdict: &CommitVerdict) -> Result<bool, StoreError>;

    /// Find or create the verdict of a branch whose head is `commit_id`
    fn find_or_create_branch(
        &self,
        commit_id: i64,
        name: &str,
        url: &str,
        content: &BranchContent,
    ) -> Result<BranchVerdict, StoreError>;

    /// Load a branch verdict by id
    fn get_branch(&self, id: i64) -> Result<Option<BranchVerdict>, StoreError>;

    /// Load the verdict of branch `name` whose head is `commit_id`
    fn find_branch(&self, commit_id: i64, name: &str) -> Result<Option<BranchVerdict>, StoreError>;

    /// Branch verdicts of a repository with the given name, newest first
    fn find_branches(&self, repository_id: i64, name: &str)
    -> Result<Vec<BranchVerdict>, StoreError>;

    /// Persist content, state and error count of a branch verdict
    ///
    /// Returns `false` without writing when the stored verdict is terminal.
    fn save_branch(&self, verdict: &BranchVerdict) -> Result<bool, StoreError>;
}
