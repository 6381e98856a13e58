//! Catalog and import error types.

use arqon_shared::types::ProductId;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::pricing::DerivationError;
use crate::store::StoreError;

/// Errors that can occur during catalog operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Product does not exist for the tenant.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// Product name is empty.
    #[error("Product name is required")]
    MissingName,

    /// Price or cost is negative.
    #[error("Amount must not be negative, got {0}")]
    NegativeAmount(Decimal),

    /// Price derivation failed.
    #[error(transparent)]
    Derivation(#[from] DerivationError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CatalogError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "PRODUCT_NOT_FOUND",
            Self::MissingName => "MISSING_NAME",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::Derivation(err) => err.error_code(),
            Self::Store(err) => err.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::MissingName | Self::NegativeAmount(_) => 400,
            Self::Derivation(err) => err.http_status_code(),
            Self::Store(err) => err.http_status_code(),
        }
    }
}

/// A row left out of an import, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// Zero-based row index in the request.
    pub index: usize,
    /// Why the row was skipped.
    pub reason: String,
}

impl SkippedRow {
    pub(crate) fn new(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}

/// Errors that can occur during catalog imports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// Every row was skipped.
    #[error("No valid rows to import ({} skipped)", skipped.len())]
    NoValidRows {
        /// Rows that were skipped.
        skipped: Vec<SkippedRow>,
    },

    /// The price list code is empty.
    #[error("Price list code is required")]
    MissingListCode,

    /// A chunk failed to commit. Earlier chunks stay committed; re-running
    /// the same import is safe.
    #[error(
        "Import stopped at chunk {chunk}: {chunks_committed} chunks ({rows_committed} rows) committed: {source}"
    )]
    ChunkFailed {
        /// Zero-based index of the failed chunk.
        chunk: usize,
        /// Chunks committed before the failure.
        chunks_committed: usize,
        /// Rows committed before the failure.
        rows_committed: usize,
        /// The store failure.
        source: StoreError,
    },

    /// Reading existing documents failed before anything was written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ImportError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoValidRows { .. } => "NO_VALID_ROWS",
            Self::MissingListCode => "MISSING_LIST_CODE",
            Self::ChunkFailed { .. } => "IMPORT_PARTIALLY_COMMITTED",
            Self::Store(err) => err.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NoValidRows { .. } | Self::MissingListCode => 400,
            Self::ChunkFailed { source, .. } if source.is_conflict() => 503,
            Self::ChunkFailed { source, .. } => source.http_status_code(),
            Self::Store(err) => err.http_status_code(),
        }
    }
}
