//! Document store errors.

use thiserror::Error;

/// Errors reported by a [`DocumentStore`](super::DocumentStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The transaction lost a race or a guarded precondition no longer holds.
    /// Nothing was written; the caller may re-read and retry.
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// A document inserted by the batch already exists.
    #[error("{collection} {id} already exists")]
    AlreadyExists {
        /// Collection name.
        collection: &'static str,
        /// Document ID.
        id: String,
    },

    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns true if retrying the whole read-plan-commit may succeed.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Conflict(_) => "TRANSACTION_CONFLICT",
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::Unavailable(_) => "STORE_UNAVAILABLE",
            Self::Backend(_) => "STORE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Conflict(_) | Self::AlreadyExists { .. } => 409,
            Self::Unavailable(_) => 503,
            Self::Backend(_) => 500,
        }
    }
}
