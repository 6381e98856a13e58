//! Ledger error types for posting validation and store failures.

use arqon_shared::types::CustomerId;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during ledger postings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Invoice has no lines.
    #[error("Invoice must have at least one line")]
    EmptyInvoice,

    /// A line has a non-positive quantity, a negative price or a bonification
    /// outside 0..=100.
    #[error("Invalid line {index}: {reason}")]
    InvalidLine {
        /// Zero-based line index.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// Computed invoice total is zero or negative.
    #[error("Invoice total must be positive, got {0}")]
    NonPositiveTotal(Decimal),

    /// Payment or movement amount is zero or negative.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// A required field is empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The posting names a customer the tenant does not have.
    #[error("Customer not found: {0}")]
    UnknownCustomer(CustomerId),

    /// Summing stored movements left the decimal range.
    #[error("Balance exceeds the representable range")]
    BalanceOverflow,

    // ========== Store Errors ==========
    /// The atomic commit kept conflicting; nothing was written.
    #[error("Transaction conflict: {0}")]
    TransactionConflict(String),

    /// Any other store failure; nothing was written.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => Self::TransactionConflict(msg),
            other => Self::Store(other),
        }
    }
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyInvoice => "EMPTY_INVOICE",
            Self::InvalidLine { .. } => "INVALID_LINE",
            Self::NonPositiveTotal(_) => "NON_POSITIVE_TOTAL",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::UnknownCustomer(_) => "CUSTOMER_NOT_FOUND",
            Self::BalanceOverflow => "BALANCE_OVERFLOW",
            Self::TransactionConflict(_) => "TRANSACTION_CONFLICT",
            Self::Store(err) => err.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::EmptyInvoice
            | Self::InvalidLine { .. }
            | Self::NonPositiveTotal(_)
            | Self::InvalidAmount(_)
            | Self::MissingField(_) => 400,
            Self::UnknownCustomer(_) => 404,
            // Retries exhausted; the client may try again later.
            Self::TransactionConflict(_) => 503,
            Self::BalanceOverflow => 500,
            Self::Store(err) => err.http_status_code(),
        }
    }

    /// Returns true if the whole posting may be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionConflict(_))
    }
}
