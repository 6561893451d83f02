//! Notebook entries: title + content owned by exactly one user.

pub mod store;

pub use store::{Entry, EntryId, EntryStore};
