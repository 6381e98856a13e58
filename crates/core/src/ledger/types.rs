//! Domain types for invoicing, payments and treasury movements.
//!
//! Movements, receipts and invoices are immutable once committed. A
//! correction is a new movement in the opposite direction.

use arqon_shared::types::{
    CustomerId, InvoiceId, MovementId, ProductId, QuoteId, ReceiptId, TenantId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default description of a receipt with no explicit text.
pub const DEFAULT_RECEIPT_DESCRIPTION: &str = "Payment on open account";

/// Payment method recorded on cash movements generated by cash invoices.
pub const CASH_METHOD: &str = "cash";

/// How an invoice is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTerm {
    /// Paid on the spot; posts a cash income.
    Cash,
    /// Charged to the customer's current account; posts a debit.
    OpenAccount,
}

/// Direction of a cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashDirection {
    /// Money in.
    Income,
    /// Money out.
    Expense,
}

/// What produced a cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashOrigin {
    /// A cash invoice.
    Invoice,
    /// A receipt for an open-account payment.
    Receipt,
    /// Entered by hand.
    Manual,
}

/// Direction of a current-account movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountDirection {
    /// Increases what the customer owes.
    Debit,
    /// Decreases what the customer owes.
    Credit,
}

/// Invoice lifecycle state. Invoices are issued closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Issued and final.
    #[default]
    Closed,
}

/// A line as submitted by the client. Amounts are computed server side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    /// Catalog product, if the line refers to one.
    #[serde(default)]
    pub product_id: Option<ProductId>,
    /// Free text description.
    pub description: String,
    /// Quantity, must be positive.
    pub quantity: Decimal,
    /// Unit price, must not be negative.
    pub unit_price: Decimal,
    /// Line discount in percent, `0..=100`.
    #[serde(default)]
    pub bonif_percent: Decimal,
}

/// A priced line as stored on an invoice or quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Catalog product, if the line refers to one.
    pub product_id: Option<ProductId>,
    /// Free text description.
    pub description: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Unit price.
    pub unit_price: Decimal,
    /// Line discount in percent.
    pub bonif_percent: Decimal,
    /// `quantity * unit_price * (1 - bonif/100)`, 2 dp.
    pub amount: Decimal,
}

impl From<&InvoiceLine> for LineInput {
    fn from(line: &InvoiceLine) -> Self {
        Self {
            product_id: line.product_id,
            description: line.description.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            bonif_percent: line.bonif_percent,
        }
    }
}

/// Request to issue an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDraft {
    /// Customer being invoiced.
    pub customer_id: CustomerId,
    /// Customer display name, denormalized.
    pub customer_name: String,
    /// Lines to invoice.
    pub lines: Vec<LineInput>,
    /// Settlement term.
    pub payment_term: PaymentTerm,
    /// Decrement stock of referenced products in the same commit.
    #[serde(default)]
    pub decrement_stock: bool,
    /// Free text notes.
    #[serde(default)]
    pub notes: String,
}

/// An issued invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice ID.
    pub id: InvoiceId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Customer.
    pub customer_id: CustomerId,
    /// Customer display name.
    pub customer_name: String,
    /// Priced lines.
    pub lines: Vec<InvoiceLine>,
    /// Settlement term.
    pub payment_term: PaymentTerm,
    /// Sum of line amounts, 2 dp.
    pub subtotal: Decimal,
    /// Amount due, 2 dp.
    pub total: Decimal,
    /// Lifecycle state.
    pub status: InvoiceStatus,
    /// Free text notes.
    pub notes: String,
    /// Quote this invoice was converted from.
    pub quote_id: Option<QuoteId>,
    /// Issue time.
    pub created_at: DateTime<Utc>,
}

/// A treasury movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashMovement {
    /// Movement ID.
    pub id: MovementId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Posting time.
    pub created_at: DateTime<Utc>,
    /// Income or expense.
    pub direction: CashDirection,
    /// Positive amount.
    pub amount: Decimal,
    /// Payment method (`cash`, `transfer`, ...).
    pub method: String,
    /// What produced the movement.
    pub origin: CashOrigin,
    /// Related invoice.
    pub invoice_id: Option<InvoiceId>,
    /// Related receipt.
    pub receipt_id: Option<ReceiptId>,
    /// Free text description.
    pub description: String,
}

/// A movement on a customer's current account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAccountMovement {
    /// Movement ID.
    pub id: MovementId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Posting time.
    pub created_at: DateTime<Utc>,
    /// Customer.
    pub customer_id: CustomerId,
    /// Customer display name.
    pub customer_name: String,
    /// Debit or credit.
    pub direction: AccountDirection,
    /// Positive amount.
    pub amount: Decimal,
    /// Related invoice.
    pub invoice_id: Option<InvoiceId>,
    /// Related receipt.
    pub receipt_id: Option<ReceiptId>,
    /// Free text description.
    pub description: String,
}

/// Proof of a customer payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Receipt ID.
    pub id: ReceiptId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Posting time.
    pub created_at: DateTime<Utc>,
    /// Paying customer.
    pub customer_id: CustomerId,
    /// Customer display name.
    pub customer_name: String,
    /// Positive amount.
    pub amount: Decimal,
    /// Payment method.
    pub method: String,
    /// Free text description.
    pub description: String,
    /// Invoice being paid, if any.
    pub invoice_id: Option<InvoiceId>,
}

/// Request to register an open-account payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Paying customer.
    pub customer_id: CustomerId,
    /// Customer display name.
    pub customer_name: String,
    /// Amount paid, must be positive.
    pub amount: Decimal,
    /// Payment method.
    pub method: String,
    /// Receipt description; defaults to [`DEFAULT_RECEIPT_DESCRIPTION`].
    #[serde(default)]
    pub description: Option<String>,
    /// Invoice being paid, if any.
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
}

/// Request to record a manual treasury movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualCashMovementInput {
    /// Income or expense.
    pub direction: CashDirection,
    /// Amount, must be positive.
    pub amount: Decimal,
    /// Payment method.
    pub method: String,
    /// Description, required.
    pub description: String,
    /// Related invoice.
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
    /// Related receipt.
    #[serde(default)]
    pub receipt_id: Option<ReceiptId>,
}
