//! Customer and lead error types.

use arqon_shared::types::{CustomerId, LeadId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while managing customers and leads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomerError {
    /// Customer does not exist for the tenant.
    #[error("Customer not found: {0}")]
    NotFound(CustomerId),

    /// Lead does not exist for the tenant.
    #[error("Lead not found: {0}")]
    LeadNotFound(LeadId),

    /// Name is empty.
    #[error("Name is required")]
    MissingName,

    /// Email is not a valid address.
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// Discount outside 0..=100.
    #[error("Discount must be between 0 and 100, got {0}")]
    BonificationOutOfRange(Decimal),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CustomerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "CUSTOMER_NOT_FOUND",
            Self::LeadNotFound(_) => "LEAD_NOT_FOUND",
            Self::MissingName => "MISSING_NAME",
            Self::InvalidEmail(_) => "INVALID_EMAIL",
            Self::BonificationOutOfRange(_) => "BONIFICATION_OUT_OF_RANGE",
            Self::Store(err) => err.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::LeadNotFound(_) => 404,
            Self::MissingName | Self::InvalidEmail(_) | Self::BonificationOutOfRange(_) => 400,
            Self::Store(err) => err.http_status_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_codes() {
        assert_eq!(CustomerError::NotFound(CustomerId::new()).http_status_code(), 404);
        assert_eq!(CustomerError::LeadNotFound(LeadId::new()).error_code(), "LEAD_NOT_FOUND");
        assert_eq!(
            CustomerError::BonificationOutOfRange(dec!(120)).http_status_code(),
            400
        );
        assert_eq!(
            CustomerError::Store(StoreError::Unavailable("down".into())).http_status_code(),
            503
        );
    }
}
