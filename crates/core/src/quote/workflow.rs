//! Quote state machine.

use super::error::QuoteError;
use super::types::QuoteStatus;

/// Stateless quote transitions. Each returns the new status or
/// `InvalidTransition`.
pub struct QuoteWorkflow;

impl QuoteWorkflow {
    /// Draft → Sent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the quote is not a draft.
    pub fn send(current: QuoteStatus) -> Result<QuoteStatus, QuoteError> {
        Self::expect(current, QuoteStatus::Draft, QuoteStatus::Sent)
    }

    /// Sent → Approved.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the quote was not sent.
    pub fn approve(current: QuoteStatus) -> Result<QuoteStatus, QuoteError> {
        Self::expect(current, QuoteStatus::Sent, QuoteStatus::Approved)
    }

    /// Sent → Rejected.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the quote was not sent.
    pub fn reject(current: QuoteStatus) -> Result<QuoteStatus, QuoteError> {
        Self::expect(current, QuoteStatus::Sent, QuoteStatus::Rejected)
    }

    /// Approved → Invoiced. Only reachable through conversion.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the quote is not approved. An already
    /// invoiced quote is reported by the caller as `AlreadyConverted`.
    pub fn mark_invoiced(current: QuoteStatus) -> Result<QuoteStatus, QuoteError> {
        Self::expect(current, QuoteStatus::Approved, QuoteStatus::Invoiced)
    }

    fn expect(
        current: QuoteStatus,
        required: QuoteStatus,
        to: QuoteStatus,
    ) -> Result<QuoteStatus, QuoteError> {
        if current == required {
            Ok(to)
        } else {
            Err(QuoteError::InvalidTransition { from: current, to })
        }
    }
}
