//! SQLite implementation of [`VerdictStore`]
//!
//! # Schema Versioning
//!
//! The database has a `schema_version` table. When the schema changes,
//! increment `CURRENT_SCHEMA_VERSION` and add a step to `run_migrations()`.
//! Steps run sequentially from the stored version to the current one.
//!
//! # Terminality
//!
//! Verdict updates are conditional on the stored `state` still being
//! pending, so a verdict whose file phase resolved can never be rewritten,
//! whichever worker tries.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use log::warn;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::core::models::{
    Account, BranchContent, BranchVerdict, CommitContent, CommitVerdict, Repository,
    VerdictState,
};
use crate::core::ports::{StoreError, VerdictStore};

/// Current schema version
const CURRENT_SCHEMA_VERSION: i64 = 2;

const ACCOUNT_COLUMNS: &str = "id, name, email, token, created_at, updated_at";
const REPOSITORY_COLUMNS: &str = "id, owner_id, name, created_at";
const COMMIT_COLUMNS: &str =
    "id, repository_id, sha, url, content, state, error_count, created_at, updated_at";
const BRANCH_COLUMNS: &str =
    "b.id, b.commit_id, b.name, b.url, b.content, b.state, b.error_count, b.created_at, b.updated_at";

/// SQLite-backed verdict store
///
/// One connection behind a mutex; every operation is a short statement or
/// transaction, so workers serialize only briefly.
#[derive(Debug, Clone)]
pub struct SqliteVerdictStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteVerdictStore {
    /// Open or create the database at `path` and migrate it
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let in_memory = path.as_os_str() == ":memory:";

        if !in_memory {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::backend(
                        "create database directory",
                        format!("{}: {e}", parent.display()),
                    )
                })?;
            }
        }

        let conn = Connection::open(path).map_err(|e| StoreError::backend("open database", e))?;

        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(|e| StoreError::backend("set journal_mode", e))?;
        if !journal_mode.eq_ignore_ascii_case("wal") && !in_memory {
            warn!("SQLite kept journal_mode={journal_mode}, concurrent workers will contend");
        }

        conn.execute_batch(
            r"
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            CREATE TABLE IF NOT EXISTS schema_version (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL
            );
            ",
        )
        .map_err(|e| StoreError::backend("configure database", e))?;

        let current_version: i64 = conn
            .query_row("SELECT version FROM schema_version WHERE id = 1", [], |row| row.get(0))
            .optional()
            .map_err(|e| StoreError::backend("get schema version", e))?
            .unwrap_or(0);

        Self::run_migrations(&conn, current_version)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:")
    }

    fn run_migrations(conn: &Connection, from_version: i64) -> Result<(), StoreError> {
        if from_version > CURRENT_SCHEMA_VERSION {
            return Err(StoreError::backend(
                "schema version",
                format!(
                    "database schema version {from_version} is newer than supported version \
                     {CURRENT_SCHEMA_VERSION}"
                ),
            ));
        }
        if from_version == CURRENT_SCHEMA_VERSION {
            return Ok(());
        }

        if from_version < 1 {
            conn.execute_batch(
                r"
                CREATE TABLE IF NOT EXISTS account (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    email TEXT,
                    token TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS repository (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    owner_id INTEGER NOT NULL REFERENCES account(id),
                    name TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    UNIQUE (owner_id, name)
                );

                CREATE TABLE IF NOT EXISTS commit_verdict (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    repository_id INTEGER NOT NULL REFERENCES repository(id),
                    sha TEXT NOT NULL,
                    url TEXT NOT NULL,
                    content TEXT NOT NULL,
                    state INTEGER NOT NULL DEFAULT 0,
                    error_count INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    UNIQUE (repository_id, sha)
                );

                CREATE TABLE IF NOT EXISTS branch_verdict (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    commit_id INTEGER NOT NULL REFERENCES commit_verdict(id),
                    name TEXT NOT NULL,
                    url TEXT NOT NULL,
                    content TEXT NOT NULL,
                    state INTEGER NOT NULL DEFAULT 0,
                    error_count INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    UNIQUE (commit_id, name)
                );
                ",
            )
            .map_err(|e| StoreError::backend("migration v1", e))?;
        }

        // Branch lookups by name for the read API
        if from_version < 2 {
            conn.execute_batch(
                r"
                CREATE INDEX IF NOT EXISTS idx_branch_verdict_name ON branch_verdict(name);
                ",
            )
            .map_err(|e| StoreError::backend("migration v2", e))?;
        }

        conn.execute(
            "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?1)",
            params![CURRENT_SCHEMA_VERSION],
        )
        .map_err(|e| StoreError::backend("update schema version", e))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|e| StoreError::backend("lock connection", e))
    }
}

fn to_count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_count(value: i64) -> usize {
    usize::try_from(value).unwrap_or_default()
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        token: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn repository_from_row(row: &Row<'_>) -> rusqlite::Result<Repository> {
    Ok(Repository {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// A verdict row before its JSON content is decoded
struct VerdictRow {
    id: i64,
    parent_id: i64,
    key: String,
    url: String,
    content: String,
    state: i64,
    error_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn verdict_from_row(row: &Row<'_>) -> rusqlite::Result<VerdictRow> {
    Ok(VerdictRow {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        key: row.get(2)?,
        url: row.get(3)?,
        content: row.get(4)?,
        state: row.get(5)?,
        error_count: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl VerdictRow {
    fn into_commit(self) -> Result<CommitVerdict, StoreError> {
        let content: CommitContent =
            serde_json::from_str(&self.content).map_err(|e| StoreError::Corrupt {
                table: "commit_verdict",
                id: self.id,
                message: e.to_string(),
            })?;
        Ok(CommitVerdict {
            id: self.id,
            repository_id: self.parent_id,
            sha: self.key,
            url: self.url,
            content,
            state: VerdictState::from_db(self.state),
            error_count: from_count(self.error_count),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    fn into_branch(self) -> Result<BranchVerdict, StoreError> {
        let content: BranchContent =
            serde_json::from_str(&self.content).map_err(|e| StoreError::Corrupt {
                table: "branch_verdict",
                id: self.id,
                message: e.to_string(),
            })?;
        Ok(BranchVerdict {
            id: self.id,
            commit_id: self.parent_id,
            name: self.key,
            url: self.url,
            content,
            state: VerdictState::from_db(self.state),
            error_count: from_count(self.error_count),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn encode<T: serde::Serialize>(operation: &str, content: &T) -> Result<String, StoreError> {
    serde_json::to_string(content).map_err(|e| StoreError::backend(operation, e))
}

impl VerdictStore for SqliteVerdictStore {
    fn find_account(&self, name: &str) -> Result<Option<Account>, StoreError> {
        self.conn()?
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE name = ?1"),
                params![name],
                account_from_row,
            )
            .optional()
            .map_err(|e| StoreError::backend("find account", e))
    }

    fn get_account(&self, id: i64) -> Result<Option<Account>, StoreError> {
        self.conn()?
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE id = ?1"),
                params![id],
                account_from_row,
            )
            .optional()
            .map_err(|e| StoreError::backend("get account", e))
    }

    fn find_or_create_account(&self, name: &str) -> Result<Account, StoreError> {
        let now = Utc::now();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO account (name, created_at, updated_at) VALUES (?1, ?2, ?2)
             ON CONFLICT(name) DO NOTHING",
            params![name, now],
        )
        .map_err(|e| StoreError::backend("create account", e))?;
        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE name = ?1"),
            params![name],
            account_from_row,
        )
        .map_err(|e| StoreError::backend("read account", e))
    }

    fn update_or_create_account(
        &self,
        name: &str,
        email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Account, StoreError> {
        let now = Utc::now();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO account (name, email, token, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(name) DO UPDATE SET
                 email = COALESCE(excluded.email, account.email),
                 token = COALESCE(excluded.token, account.token),
                 updated_at = excluded.updated_at",
            params![name, email, token, now],
        )
        .map_err(|e| StoreError::backend("update account", e))?;
        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE name = ?1"),
            params![name],
            account_from_row,
        )
        .map_err(|e| StoreError::backend("read account", e))
    }

    fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {ACCOUNT_COLUMNS} FROM account ORDER BY name"))
            .map_err(|e| StoreError::backend("list accounts", e))?;
        let rows = stmt
            .query_map([], account_from_row)
            .map_err(|e| StoreError::backend("list accounts", e))?;
        rows.collect::<Result<_, _>>().map_err(|e| StoreError::backend("list accounts", e))
    }

    fn find_repository(&self, owner_id: i64, name: &str) -> Result<Option<Repository>, StoreError> {
        self.conn()?
            .query_row(
                &format!(
                    "SELECT {REPOSITORY_COLUMNS} FROM repository WHERE owner_id = ?1 AND name = ?2"
                ),
                params![owner_id, name],
                repository_from_row,
            )
            .optional()
            .map_err(|e| StoreError::backend("find repository", e))
    }

    fn get_repository(&self, id: i64) -> Result<Option<Repository>, StoreError> {
        self.conn()?
            .query_row(
                &format!("SELECT {REPOSITORY_COLUMNS} FROM repository WHERE id = ?1"),
                params![id],
                repository_from_row,
            )
            .optional()
            .map_err(|e| StoreError::backend("get repository", e))
    }

    fn find_or_create_repository(&self, owner_id: i64, name: &str) -> Result<Repository, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO repository (owner_id, name, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(owner_id, name) DO NOTHING",
            params![owner_id, name, Utc::now()],
        )
        .map_err(|e| StoreError::backend("create repository", e))?;
        conn.query_row(
            &format!("SELECT {REPOSITORY_COLUMNS} FROM repository WHERE owner_id = ?1 AND name = ?2"),
            params![owner_id, name],
            repository_from_row,
        )
        .map_err(|e| StoreError::backend("read repository", e))
    }

    fn list_repositories(&self, owner_id: i64) -> Result<Vec<Repository>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {REPOSITORY_COLUMNS} FROM repository WHERE owner_id = ?1 ORDER BY name"
            ))
            .map_err(|e| StoreError::backend("list repositories", e))?;
        let rows = stmt
            .query_map(params![owner_id], repository_from_row)
            .map_err(|e| StoreError::backend("list repositories", e))?;
        rows.collect::<Result<_, _>>().map_err(|e| StoreError::backend("list repositories", e))
    }

    fn remove_repository(&self, id: i64) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(|e| StoreError::backend("remove repository", e))?;
        tx.execute(
            "DELETE FROM branch_verdict WHERE commit_id IN
                 (SELECT id FROM commit_verdict WHERE repository_id = ?1)",
            params![id],
        )
        .map_err(|e| StoreError::backend("remove branch verdicts", e))?;
        tx.execute("DELETE FROM commit_verdict WHERE repository_id = ?1", params![id])
            .map_err(|e| StoreError::backend("remove commit verdicts", e))?;
        let removed = tx
            .execute("DELETE FROM repository WHERE id = ?1", params![id])
            .map_err(|e| StoreError::backend("remove repository", e))?;
        if removed == 0 {
            return Err(StoreError::NotFound(format!("repository #{id}")));
        }
        tx.commit().map_err(|e| StoreError::backend("remove repository", e))
    }

    fn find_or_create_commit(
        &self,
        repository_id: i64,
        sha: &str,
        url: &str,
    ) -> Result<CommitVerdict, StoreError> {
        let content = encode("encode commit content", &CommitContent::default())?;
        let now = Utc::now();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO commit_verdict (repository_id, sha, url, content, state, error_count,
                                         created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)
             ON CONFLICT(repository_id, sha) DO NOTHING",
            params![repository_id, sha, url, content, VerdictState::Pending.to_db(), now],
        )
        .map_err(|e| StoreError::backend("create commit verdict", e))?;
        conn.query_row(
            &format!("SELECT {COMMIT_COLUMNS} FROM commit_verdict WHERE repository_id = ?1 AND sha = ?2"),
            params![repository_id, sha],
            verdict_from_row,
        )
        .map_err(|e| StoreError::backend("read commit verdict", e))?
        .into_commit()
    }

    fn get_commit(&self, id: i64) -> Result<Option<CommitVerdict>, StoreError> {
        self.conn()?
            .query_row(
                &format!("SELECT {COMMIT_COLUMNS} FROM commit_verdict WHERE id = ?1"),
                params![id],
                verdict_from_row,
            )
            .optional()
            .map_err(|e| StoreError::backend("get commit verdict", e))?
            .map(VerdictRow::into_commit)
            .transpose()
    }

    fn find_commit(&self, repository_id: i64, sha: &str) -> Result<Option<CommitVerdict>, StoreError> {
        self.conn()?
            .query_row(
                &format!(
                    "SELECT {COMMIT_COLUMNS} FROM commit_verdict WHERE repository_id = ?1 AND sha = ?2"
                ),
                params![repository_id, sha],
                verdict_from_row,
            )
            .optional()
            .map_err(|e| StoreError::backend("find commit verdict", e))?
            .map(VerdictRow::into_commit)
            .transpose()
    }

    fn latest_commits(&self, repository_id: i64, limit: usize) -> Result<Vec<CommitVerdict>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COMMIT_COLUMNS} FROM commit_verdict WHERE repository_id = ?1
                 ORDER BY id DESC LIMIT ?2"
            ))
            .map_err(|e| StoreError::backend("latest commits", e))?;
        let rows = stmt
            .query_map(params![repository_id, to_count(limit)], verdict_from_row)
            .map_err(|e| StoreError::backend("latest commits", e))?;
        rows.map(|row| row.map_err(|e| StoreError::backend("latest commits", e))?.into_commit())
            .collect()
    }

    fn save_commit(&self, verdict: &CommitVerdict) -> Result<bool, StoreError> {
        let content = encode("encode commit content", &verdict.content)?;
        let changed = self
            .conn()?
            .execute(
                "UPDATE commit_verdict
                 SET content = ?1, state = ?2, error_count = ?3, updated_at = ?4
                 WHERE id = ?5 AND state = ?6",
                params![
                    content,
                    verdict.state.to_db(),
                    to_count(verdict.error_count),
                    Utc::now(),
                    verdict.id,
                    VerdictState::Pending.to_db()
                ],
            )
            .map_err(|e| StoreError::backend("save commit verdict", e))?;
        Ok(changed == 1)
    }

    fn find_or_create_branch(
        &self,
        commit_id: i64,
        name: &str,
        url: &str,
        content: &BranchContent,
    ) -> Result<BranchVerdict, StoreError> {
        let encoded = encode("encode branch content", content)?;
        let now = Utc::now();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO branch_verdict (commit_id, name, url, content, state, error_count,
                                         created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)
             ON CONFLICT(commit_id, name) DO NOTHING",
            params![commit_id, name, url, encoded, VerdictState::Pending.to_db(), now],
        )
        .map_err(|e| StoreError::backend("create branch verdict", e))?;
        conn.query_row(
            &format!(
                "SELECT {BRANCH_COLUMNS} FROM branch_verdict b WHERE b.commit_id = ?1 AND b.name = ?2"
            ),
            params![commit_id, name],
            verdict_from_row,
        )
        .map_err(|e| StoreError::backend("read branch verdict", e))?
        .into_branch()
    }

    fn get_branch(&self, id: i64) -> Result<Option<BranchVerdict>, StoreError> {
        self.conn()?
            .query_row(
                &format!("SELECT {BRANCH_COLUMNS} FROM branch_verdict b WHERE b.id = ?1"),
                params![id],
                verdict_from_row,
            )
            .optional()
            .map_err(|e| StoreError::backend("get branch verdict", e))?
            .map(VerdictRow::into_branch)
            .transpose()
    }

    fn find_branch(&self, commit_id: i64, name: &str) -> Result<Option<BranchVerdict>, StoreError> {
        self.conn()?
            .query_row(
                &format!(
                    "SELECT {BRANCH_COLUMNS} FROM branch_verdict b WHERE b.commit_id = ?1 AND b.name = ?2"
                ),
                params![commit_id, name],
                verdict_from_row,
            )
            .optional()
            .map_err(|e| StoreError::backend("find branch verdict", e))?
            .map(VerdictRow::into_branch)
            .transpose()
    }

    fn find_branches(&self, repository_id: i64, name: &str) -> Result<Vec<BranchVerdict>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {BRANCH_COLUMNS} FROM branch_verdict b
                 JOIN commit_verdict c ON c.id = b.commit_id
                 WHERE c.repository_id = ?1 AND b.name = ?2
                 ORDER BY b.id DESC"
            ))
            .map_err(|e| StoreError::backend("find branches", e))?;
        let rows = stmt
            .query_map(params![repository_id, name], verdict_from_row)
            .map_err(|e| StoreError::backend("find branches", e))?;
        rows.map(|row| row.map_err(|e| StoreError::backend("find branches", e))?.into_branch())
            .collect()
    }

    fn save_branch(&self, verdict: &BranchVerdict) -> Result<bool, StoreError> {
        let content = encode("encode branch content", &verdict.content)?;
        let changed = self
            .conn()?
            .execute(
                "UPDATE branch_verdict
                 SET content = ?1, state = ?2, error_count = ?3, updated_at = ?4
                 WHERE id = ?5 AND state = ?6",
                params![
                    content,
                    verdict.state.to_db(),
                    to_count(verdict.error_count),
                    Utc::now(),
                    verdict.id,
                    VerdictState::Pending.to_db()
                ],
            )
            .map_err(|e| StoreError::backend("save branch verdict", e))?;
        Ok(changed == 1)
    }
}
