//! Invoicing, payments and treasury postings.
//!
//! This module implements the atomic posting protocol:
//! - Posting plans (invoice, payment, manual cash movement)
//! - Posting service with conflict retries
//! - Current-account and cash balances
//! - Domain types and error types for ledger operations

pub mod balance;
pub mod error;
pub mod posting;
pub mod retry;
pub mod service;
pub mod types;

#[cfg(test)]
mod posting_props;

pub use balance::{AccountBalance, CashSummary, StatementLine, balance, running_balance};
pub use error::LedgerError;
pub use posting::{InvoicePlan, PaymentPlan, compute_total, plan_invoice, plan_payment};
pub use retry::{RetryPolicy, Retryable};
pub use service::PostingService;
pub use types::{
    AccountDirection, CashDirection, CashMovement, CashOrigin, CurrentAccountMovement, Invoice,
    InvoiceDraft, InvoiceLine, InvoiceStatus, LineInput, ManualCashMovementInput, PaymentRequest,
    PaymentTerm, Receipt,
};
