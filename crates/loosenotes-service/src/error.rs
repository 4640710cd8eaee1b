//! Error taxonomy for note access and rating operations.

use loosenotes_core::ValidationError;
use loosenotes_store::StoreError;
use thiserror::Error;

use crate::files::FileStorageError;

/// Result type alias for service operations.
pub type AccessResult<T> = Result<T, AccessError>;

/// Outcome kinds callers can act on.
///
/// Everything but `Conflict` and `Storage` is terminal: retrying the same
/// request will fail the same way.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The note or rating does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The caller is known but lacks permission. Deliberately generic.
    #[error("not authorized")]
    Forbidden,

    /// The operation needs an identity and none was supplied.
    #[error("authentication required")]
    Unauthenticated,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A concurrent write raced this one and retries were exhausted.
    #[error("concurrent update conflict, retry the request")]
    Conflict,

    /// Opaque persistence failure. The message is for logs only.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NoteNotFound(_) => Self::NotFound("note"),
            StoreError::RatingNotFound(_) => Self::NotFound("rating"),
            StoreError::Conflict(_) => Self::Conflict,
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<FileStorageError> for AccessError {
    fn from(err: FileStorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn store_not_found_maps_to_not_found() {
        let err = AccessError::from(StoreError::NoteNotFound(Uuid::nil()));
        assert!(matches!(err, AccessError::NotFound("note")));
        assert_eq!(err.to_string(), "note not found");
    }

    #[test]
    fn store_conflict_maps_to_conflict() {
        let err = AccessError::from(StoreError::Conflict("40001".into()));
        assert!(matches!(err, AccessError::Conflict));
    }

    #[test]
    fn other_store_errors_are_opaque_storage() {
        let err = AccessError::from(StoreError::Poisoned);
        assert!(matches!(err, AccessError::Storage(_)));
    }
}
