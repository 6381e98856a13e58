//! Quote error types.

use arqon_shared::types::{InvoiceId, QuoteId};
use thiserror::Error;

use super::types::QuoteStatus;
use crate::ledger::LedgerError;
use crate::ledger::retry::Retryable;
use crate::store::StoreError;

/// Errors that can occur during quote operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// Quote does not exist for the tenant.
    #[error("Quote not found: {0}")]
    NotFound(QuoteId),

    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: QuoteStatus,
        /// The attempted target status.
        to: QuoteStatus,
    },

    /// The quote was already converted into an invoice.
    #[error("Quote {quote_id} was already converted")]
    AlreadyConverted {
        /// The quote.
        quote_id: QuoteId,
        /// The invoice it produced.
        invoice_id: Option<InvoiceId>,
    },

    /// Line validation or posting failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<StoreError> for QuoteError {
    fn from(err: StoreError) -> Self {
        Self::Ledger(err.into())
    }
}

impl Retryable for QuoteError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Ledger(err) if err.is_retryable())
    }
}

impl QuoteError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "QUOTE_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::AlreadyConverted { .. } => "ALREADY_CONVERTED",
            Self::Ledger(err) => err.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidTransition { .. } | Self::AlreadyConverted { .. } => 409,
            Self::Ledger(err) => err.http_status_code(),
        }
    }
}
