//! Caller-facing operations with authentication and ownership enforced.
//!
//! `register` and `login` are open to anonymous callers. Everything else
//! first resolves the caller's user through [`Notebook::require_user`] and
//! fails with `NotAuthenticated` when no session is bound. Entry operations
//! always pass the session's user id down as the owner, so a caller can only
//! ever reach their own rows.

use crate::auth::{
    CredentialStore, PasswordHasher, SessionContext, SessionHandle, SessionManager, User, UserId,
};
use crate::config::Config;
use crate::entries::{Entry, EntryId, EntryStore};
use crate::error::{NotebookError, Result};
use crate::storage::Database;

pub struct Notebook {
    credentials: CredentialStore,
    entries: EntryStore,
    sessions: SessionManager,
    hasher: PasswordHasher,
}

impl Notebook {
    pub fn new(db: Database, hasher: PasswordHasher) -> Self {
        Self {
            credentials: CredentialStore::new(db.clone()),
            entries: EntryStore::new(db),
            sessions: SessionManager::new(),
            hasher,
        }
    }

    /// Open the configured database and build a notebook over it.
    pub fn open(config: &Config) -> anyhow::Result<Self> {
        let db = Database::open(&config.database_path)?;
        Ok(Self::new(
            db,
            PasswordHasher::new(config.auth.password_iterations),
        ))
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn entries(&self) -> &EntryStore {
        &self.entries
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    // ── Account ─────────────────────────────────────────────────────

    /// Create an account. Does not log the caller in.
    pub fn register(&self, username: &str, password: &str) -> Result<UserId> {
        let hash = self.hasher.hash(password);
        let user_id = self.credentials.create_user(username, &hash)?;
        tracing::info!(user_id = %user_id, username, "User registered");
        Ok(user_id)
    }

    /// Verify credentials and bind `ctx` to the user.
    ///
    /// Unknown usernames and wrong passwords fail identically. A failed
    /// attempt leaves `ctx` as it was.
    pub fn login(
        &self,
        ctx: &mut SessionContext,
        username: &str,
        password: &str,
    ) -> Result<SessionHandle> {
        let user = match self.credentials.find_by_username(username)? {
            Some(user) => user,
            None => {
                self.hasher.dummy_verify(password);
                tracing::warn!(username, "Login failed");
                return Err(NotebookError::InvalidCredentials);
            }
        };

        if !self.hasher.verify(password, &user.password_hash) {
            tracing::warn!(username, "Login failed");
            return Err(NotebookError::InvalidCredentials);
        }

        // Converge stored iteration counts on the configured one so a lookup
        // miss (dummy derivation) costs the same as a wrong password.
        if self.hasher.needs_rehash(&user.password_hash) {
            let rehashed = self.hasher.hash(password);
            self.credentials.update_password(user.id, &rehashed)?;
            tracing::info!(user_id = %user.id, "Password rehashed");
        }

        let handle = self.sessions.start(ctx, user.id);
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(handle)
    }

    /// Clear the caller's session. Always succeeds.
    pub fn logout(&self, ctx: &mut SessionContext) {
        if let Some(user_id) = self.sessions.current(ctx) {
            tracing::info!(user_id = %user_id, "User logged out");
        }
        self.sessions.end(ctx);
    }

    /// The user bound to `ctx`, if any.
    pub fn current_user(&self, ctx: &SessionContext) -> Result<Option<User>> {
        match self.sessions.current(ctx) {
            Some(user_id) => self.credentials.get_user(user_id),
            None => Ok(None),
        }
    }

    /// Guard for every authenticated-only operation.
    fn require_user(&self, ctx: &SessionContext) -> Result<UserId> {
        self.sessions
            .current(ctx)
            .ok_or(NotebookError::NotAuthenticated)
    }

    // ── Entries ─────────────────────────────────────────────────────

    pub fn create_entry(&self, ctx: &SessionContext, title: &str, content: &str) -> Result<EntryId> {
        let owner = self.require_user(ctx)?;
        let id = self.entries.create_entry(owner, title, content)?;
        tracing::debug!(user_id = %owner, entry_id = %id, "Entry created");
        Ok(id)
    }

    /// The caller's entries, newest first.
    pub fn list_entries(&self, ctx: &SessionContext) -> Result<Vec<Entry>> {
        let owner = self.require_user(ctx)?;
        self.entries.list_entries(owner)
    }

    /// Fetch one of the caller's entries for viewing or editing.
    pub fn get_entry(&self, ctx: &SessionContext, entry_id: EntryId) -> Result<Entry> {
        let owner = self.require_user(ctx)?;
        self.entries
            .get_entry(entry_id, owner)?
            .ok_or(NotebookError::NotFound)
    }

    pub fn update_entry(
        &self,
        ctx: &SessionContext,
        entry_id: EntryId,
        title: &str,
        content: &str,
    ) -> Result<()> {
        let owner = self.require_user(ctx)?;
        if !self.entries.update_entry(entry_id, owner, title, content)? {
            return Err(NotebookError::NotFound);
        }
        tracing::debug!(user_id = %owner, entry_id = %entry_id, "Entry updated");
        Ok(())
    }

    pub fn delete_entry(&self, ctx: &SessionContext, entry_id: EntryId) -> Result<()> {
        let owner = self.require_user(ctx)?;
        if !self.entries.delete_entry(entry_id, owner)? {
            return Err(NotebookError::NotFound);
        }
        tracing::debug!(user_id = %owner, entry_id = %entry_id, "Entry deleted");
        Ok(())
    }
}
