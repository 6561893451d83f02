//! Notekeeper: a multi-user note-taking service.
//!
//! Users register, log in, and manage private text entries. The core is the
//! authentication and access-controlled persistence layer:
//!
//! - [`auth`]: credential storage, password hashing, per-caller sessions
//! - [`entries`]: owner-scoped entry persistence
//! - [`notebook`]: the caller-facing operations with guards applied
//! - [`gateway`]: JSON-over-HTTP presentation of those operations

pub mod auth;
pub mod config;
pub mod entries;
pub mod error;
pub mod gateway;
pub mod notebook;
pub mod storage;

pub use config::Config;
pub use error::{NotebookError, Result};
pub use notebook::Notebook;
