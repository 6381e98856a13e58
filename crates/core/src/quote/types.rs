//! Quote domain types.

use arqon_shared::types::{CustomerId, InvoiceId, QuoteId, TenantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::types::{Invoice, InvoiceLine, LineInput, PaymentTerm};

/// Quote status.
///
/// The valid transitions are:
/// - Draft → Sent (send)
/// - Sent → Approved (approve)
/// - Sent → Rejected (reject)
/// - Approved → Invoiced (convert)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    /// Being prepared, not yet shown to the customer.
    Draft,
    /// Sent to the customer.
    Sent,
    /// Accepted by the customer, ready to invoice.
    Approved,
    /// Declined by the customer.
    Rejected,
    /// Converted into an invoice.
    Invoiced,
}

impl QuoteStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Invoiced => "invoiced",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "invoiced" => Some(Self::Invoiced),
            _ => None,
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Rejected | Self::Invoiced)
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A quote offered to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Quote ID.
    pub id: QuoteId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Customer.
    pub customer_id: CustomerId,
    /// Customer display name.
    pub customer_name: String,
    /// Priced lines.
    pub lines: Vec<InvoiceLine>,
    /// Informational total. Conversion recomputes it from the lines.
    pub total: Decimal,
    /// Lifecycle state.
    pub status: QuoteStatus,
    /// Invoice produced by conversion.
    pub invoice_id: Option<InvoiceId>,
    /// Free text notes.
    pub notes: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Request to create a quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteDraft {
    /// Customer.
    pub customer_id: CustomerId,
    /// Customer display name.
    pub customer_name: String,
    /// Lines to quote.
    pub lines: Vec<LineInput>,
    /// Create the quote directly in `Sent`.
    #[serde(default)]
    pub send: bool,
    /// Free text notes.
    #[serde(default)]
    pub notes: String,
}

/// Options for converting an approved quote into an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertRequest {
    /// Settlement term of the resulting invoice.
    pub payment_term: PaymentTerm,
    /// Decrement stock of referenced products.
    #[serde(default)]
    pub decrement_stock: bool,
}

/// Result of a quote conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedQuote {
    /// The quote, now `Invoiced`.
    pub quote: Quote,
    /// The issued invoice.
    pub invoice: Invoice,
}
