//! SQLite-backed credential store.
//!
//! The `UNIQUE` constraint on `users.username` is the only uniqueness gate:
//! registration never checks for an existing name first, it inserts and
//! treats the constraint violation as the answer.

use super::hasher::PasswordHash;
use crate::error::{NotebookError, Result};
use crate::storage::Database;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: PasswordHash,
}

impl User {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: UserId(row.get(0)?),
            username: row.get(1)?,
            password_hash: PasswordHash::from_stored(row.get(2)?),
        })
    }
}

/// Persists username → password-hash mappings.
#[derive(Clone)]
pub struct CredentialStore {
    db: Database,
}

impl CredentialStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new user. Fails with `DuplicateUsername` if the name is taken
    /// (exact, case-sensitive match).
    pub fn create_user(&self, username: &str, password_hash: &PasswordHash) -> Result<UserId> {
        let conn = self.db.conn()?;
        let result = conn.execute(
            "INSERT INTO users (username, password) VALUES (?1, ?2)",
            params![username, password_hash.as_str()],
        );

        match result {
            Ok(_) => Ok(UserId(conn.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(NotebookError::DuplicateUsername(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Exact-match lookup by username.
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.db.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, password FROM users WHERE username = ?1",
                params![username],
                User::from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Look up a user by ID.
    pub fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        let conn = self.db.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, password FROM users WHERE id = ?1",
                params![user_id.0],
                User::from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Replace a user's stored password hash. Returns whether the user exists.
    pub fn update_password(&self, user_id: UserId, password_hash: &PasswordHash) -> Result<bool> {
        let conn = self.db.conn()?;
        let updated = conn.execute(
            "UPDATE users SET password = ?1 WHERE id = ?2",
            params![password_hash.as_str(), user_id.0],
        )?;
        Ok(updated > 0)
    }

    /// Count registered users.
    pub fn user_count(&self) -> Result<u64> {
        let conn = self.db.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
