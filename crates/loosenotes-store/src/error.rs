//! Error types for the storage layer.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// SQLSTATE for `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE for `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error other than a detected write race.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Note not found.
    #[error("note not found: {0}")]
    NoteNotFound(Uuid),

    /// Rating not found.
    #[error("rating not found: {0}")]
    RatingNotFound(Uuid),

    /// A concurrent write raced this one; the operation may be retried.
    #[error("concurrent write conflict: {0}")]
    Conflict(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An in-memory lock was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Whether retrying the same operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|c| c.into_owned());

        match code.as_deref() {
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => Self::Conflict(err.to_string()),
            _ => Self::Database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_conflicts() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn conflict_is_retryable() {
        assert!(StoreError::Conflict("40001".into()).is_retryable());
        assert!(!StoreError::NoteNotFound(Uuid::nil()).is_retryable());
    }
}
