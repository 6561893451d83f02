//! User authentication: credential storage, password hashing, sessions.
//!
//! Provides:
//! - User registration with username/password (PBKDF2-HMAC-SHA256 + per-user salt)
//! - Exact-match, case-sensitive usernames with uniqueness enforced by SQLite
//! - In-memory session bindings keyed by hashed opaque handles
//!
//! ## Design Decisions
//! - The storage layer's `UNIQUE` constraint is the authority on duplicate
//!   usernames; there is no check-then-insert.
//! - Session state lives in a caller-context object passed into every call,
//!   not in a process-wide singleton.
//! - Sessions never expire server-side; they end on logout.

pub mod hasher;
pub mod session;
pub mod store;

pub use hasher::{PasswordHash, PasswordHasher};
pub use session::{SessionContext, SessionHandle, SessionManager};
pub use store::{CredentialStore, User, UserId};
