//! Hosting accounts and their repositories
//!
//! Verdicts only reference these by id, the token never travels with them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A hosting-platform account (user or organisation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Row identifier
    pub id: i64,
    /// Login name, unique
    pub name: String,
    /// Contact address
    pub email: Option<String>,
    /// API token used for this account's repositories
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// A repository owned by an [`Account`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Row identifier
    pub id: i64,
    /// Owning account
    pub owner_id: i64,
    /// Repository name, unique per owner
    pub name: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Repository {
    /// `owner/name`
    #[must_use]
    pub fn fullname(&self, owner: &Account) -> String {
        format!("{}/{}", owner.name, self.name)
    }
}
