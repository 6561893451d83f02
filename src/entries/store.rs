//! Owner-scoped entry persistence.
//!
//! Every read and every mutation carries `user_id` in the same SQL statement
//! as the entry id. An entry owned by someone else is indistinguishable from
//! one that does not exist.

use crate::auth::UserId;
use crate::error::Result;
use crate::storage::Database;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage format of `entries.timestamp`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Store-assigned entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub owner_id: UserId,
    pub title: String,
    pub content: String,
    /// Set once at creation; edits leave it alone.
    pub created_at: DateTime<Utc>,
}

impl Entry {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let raw: String = row.get(4)?;
        let created_at = NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?
            .and_utc();
        Ok(Self {
            id: EntryId(row.get(0)?),
            owner_id: UserId(row.get(1)?),
            title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            content: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            created_at,
        })
    }
}

/// Persists entries keyed by owner.
#[derive(Clone)]
pub struct EntryStore {
    db: Database,
}

impl EntryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new entry for `owner_id`. The creation time is stamped by SQLite.
    pub fn create_entry(&self, owner_id: UserId, title: &str, content: &str) -> Result<EntryId> {
        let conn = self.db.conn()?;
        conn.execute(
            "INSERT INTO entries (user_id, title, content) VALUES (?1, ?2, ?3)",
            params![owner_id.0, title, content],
        )?;
        Ok(EntryId(conn.last_insert_rowid()))
    }

    /// All entries owned by `owner_id`, newest first.
    pub fn list_entries(&self, owner_id: UserId) -> Result<Vec<Entry>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, title, content, timestamp
             FROM entries WHERE user_id = ?1
             ORDER BY timestamp DESC, id DESC",
        )?;
        let entries = stmt
            .query_map(params![owner_id.0], Entry::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Fetch one entry, only if `owner_id` owns it.
    pub fn get_entry(&self, entry_id: EntryId, owner_id: UserId) -> Result<Option<Entry>> {
        let conn = self.db.conn()?;
        let entry = conn
            .query_row(
                "SELECT id, user_id, title, content, timestamp
                 FROM entries WHERE id = ?1 AND user_id = ?2",
                params![entry_id.0, owner_id.0],
                Entry::from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// Replace title and content. Returns whether a row owned by `owner_id` was changed.
    pub fn update_entry(
        &self,
        entry_id: EntryId,
        owner_id: UserId,
        title: &str,
        content: &str,
    ) -> Result<bool> {
        let conn = self.db.conn()?;
        let updated = conn.execute(
            "UPDATE entries SET title = ?1, content = ?2 WHERE id = ?3 AND user_id = ?4",
            params![title, content, entry_id.0, owner_id.0],
        )?;
        Ok(updated > 0)
    }

    /// Remove an entry. Returns whether a row owned by `owner_id` was deleted.
    pub fn delete_entry(&self, entry_id: EntryId, owner_id: UserId) -> Result<bool> {
        let conn = self.db.conn()?;
        let deleted = conn.execute(
            "DELETE FROM entries WHERE id = ?1 AND user_id = ?2",
            params![entry_id.0, owner_id.0],
        )?;
        Ok(deleted > 0)
    }

    /// Count all stored entries across owners.
    pub fn entry_count(&self) -> Result<u64> {
        let conn = self.db.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
