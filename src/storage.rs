//! SQLite connection pool and schema bootstrap.
//!
//! Tables:
//! - `users`: id, username (unique), password (PBKDF2 hash string)
//! - `entries`: id, user_id, title, content, timestamp (UTC, millisecond precision)
//!
//! Every mutation issued through this pool is a single autocommit statement,
//! so a failed call never leaves a partial write behind.

use crate::error::Result;
use anyhow::Context;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};

/// Upper bound on pooled connections.
const MAX_POOL_SIZE: u32 = 8;

/// How long a writer waits on SQLite's lock before giving up (milliseconds).
const BUSY_TIMEOUT_MS: u32 = 5000;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
        id       INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        password TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS entries (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id   INTEGER REFERENCES users(id),
        title     TEXT,
        content   TEXT,
        timestamp DATETIME DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
    );
    CREATE INDEX IF NOT EXISTS idx_entries_user_ts ON entries(user_id, timestamp);";

/// Shared handle to the relational store. Cloning is cheap.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl Database {
    /// Open (or create) the database at `db_path` and ensure the schema exists.
    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database dir: {}", parent.display()))?;
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.execute_batch(&format!(
                "PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};
                 PRAGMA journal_mode = WAL;
                 PRAGMA synchronous  = NORMAL;
                 PRAGMA foreign_keys = ON;"
            ))
        });

        let pool = Pool::builder()
            .max_size(MAX_POOL_SIZE)
            .build(manager)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

        let conn = pool.get().context("Failed to acquire database connection")?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;

        tracing::debug!(path = %db_path.display(), "Database ready");

        Ok(Self {
            pool,
            path: db_path.to_path_buf(),
        })
    }

    /// Check out a pooled connection.
    pub fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
