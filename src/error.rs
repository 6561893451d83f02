use thiserror::Error;

/// Errors surfaced by the notebook core.
///
/// The first four variants are expected, recoverable outcomes that the
/// presentation layer renders for the user. The storage variants abort the
/// single in-flight operation and are reported as internal failures.
#[derive(Debug, Error)]
pub enum NotebookError {
    #[error("Username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Entry not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Storage connection unavailable: {0}")]
    Pool(#[from] r2d2::Error),
}

impl NotebookError {
    /// Whether this error is an internal failure rather than an expected outcome.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Pool(_))
    }
}

pub type Result<T> = std::result::Result<T, NotebookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_errors_are_internal() {
        assert!(!NotebookError::DuplicateUsername("alice".into()).is_internal());
        assert!(!NotebookError::InvalidCredentials.is_internal());
        assert!(!NotebookError::NotAuthenticated.is_internal());
        assert!(!NotebookError::NotFound.is_internal());
        assert!(NotebookError::Storage(rusqlite::Error::QueryReturnedNoRows).is_internal());
    }

    #[test]
    fn invalid_credentials_message_does_not_name_the_field() {
        let msg = NotebookError::InvalidCredentials.to_string();
        assert_eq!(msg, "Invalid username or password");
    }

    #[test]
    fn duplicate_username_message_names_the_user() {
        let msg = NotebookError::DuplicateUsername("alice".into()).to_string();
        assert!(msg.contains("'alice'"));
        assert!(msg.contains("already taken"));
    }
}
