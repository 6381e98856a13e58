//! Posting plans.
//!
//! Each function validates its input and returns the documents to create
//! together with the [`WriteBatch`] that commits them atomically. Nothing here
//! touches the store.

use arqon_shared::types::money::{HUNDRED, discount_factor, round_money};
use arqon_shared::types::{InvoiceId, MovementId, QuoteId, ReceiptId, TenantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{
    AccountDirection, CASH_METHOD, CashDirection, CashMovement, CashOrigin,
    CurrentAccountMovement, DEFAULT_RECEIPT_DESCRIPTION, Invoice, InvoiceDraft, InvoiceLine,
    InvoiceStatus, LineInput, ManualCashMovementInput, PaymentRequest, PaymentTerm, Receipt,
};
use crate::store::{Write, WriteBatch};

/// Prices a single line: `quantity * unit_price * (1 - bonif/100)`.
///
/// The returned amount is unrounded.
///
/// # Errors
///
/// Returns `InvalidLine` if the quantity is not positive, the unit price is
/// negative or the bonification is outside 0..=100.
pub fn line_amount(index: usize, line: &LineInput) -> Result<Decimal, LedgerError> {
    let invalid = |reason: &str| LedgerError::InvalidLine {
        index,
        reason: reason.to_string(),
    };

    if line.quantity <= Decimal::ZERO {
        return Err(invalid("quantity must be positive"));
    }
    if line.unit_price < Decimal::ZERO {
        return Err(invalid("unit price must not be negative"));
    }
    if line.bonif_percent < Decimal::ZERO || line.bonif_percent > HUNDRED {
        return Err(invalid("bonification must be between 0 and 100"));
    }

    line.quantity
        .checked_mul(line.unit_price)
        .and_then(|gross| gross.checked_mul(discount_factor(line.bonif_percent)))
        .ok_or_else(|| invalid("amount overflow"))
}

/// Prices every line and computes the total, `round2(Σ amount)`.
///
/// # Errors
///
/// Returns `EmptyInvoice`, `InvalidLine` or `NonPositiveTotal`.
pub fn price_lines(lines: &[LineInput]) -> Result<(Vec<InvoiceLine>, Decimal), LedgerError> {
    if lines.is_empty() {
        return Err(LedgerError::EmptyInvoice);
    }

    let mut priced = Vec::with_capacity(lines.len());
    let mut sum = Decimal::ZERO;
    for (index, line) in lines.iter().enumerate() {
        let amount = line_amount(index, line)?;
        sum = sum.checked_add(amount).ok_or_else(|| LedgerError::InvalidLine {
            index,
            reason: "amount overflow".to_string(),
        })?;
        priced.push(InvoiceLine {
            product_id: line.product_id,
            description: line.description.trim().to_string(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            bonif_percent: line.bonif_percent,
            amount: round_money(amount),
        });
    }

    let total = round_money(sum);
    if total <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveTotal(total));
    }
    Ok((priced, total))
}

/// Computes the server-side total of a set of lines.
///
/// # Errors
///
/// Same as [`price_lines`].
pub fn compute_total(lines: &[LineInput]) -> Result<Decimal, LedgerError> {
    price_lines(lines).map(|(_, total)| total)
}

/// An invoice ready to commit.
#[derive(Debug, Clone)]
pub struct InvoicePlan {
    /// The invoice document.
    pub invoice: Invoice,
    /// Invoice, its movement and stock decrements.
    pub batch: WriteBatch,
}

/// Plans an invoice: the invoice itself, a cash income (cash term) or a
/// current-account debit (open account), and optional stock decrements.
///
/// # Errors
///
/// Returns a validation `LedgerError` if the draft is invalid.
pub fn plan_invoice(
    tenant: TenantId,
    draft: &InvoiceDraft,
    quote_id: Option<QuoteId>,
    now: DateTime<Utc>,
) -> Result<InvoicePlan, LedgerError> {
    if draft.payment_term == PaymentTerm::OpenAccount && draft.customer_id.0.is_nil() {
        return Err(LedgerError::MissingField("customer_id"));
    }
    let (lines, total) = price_lines(&draft.lines)?;

    let invoice = Invoice {
        id: InvoiceId::new(),
        tenant_id: tenant,
        customer_id: draft.customer_id,
        customer_name: draft.customer_name.trim().to_string(),
        lines,
        payment_term: draft.payment_term,
        subtotal: total,
        total,
        status: InvoiceStatus::Closed,
        notes: draft.notes.clone(),
        quote_id,
        created_at: now,
    };

    let description = format!("Invoice {}", invoice.id);
    let movement = match draft.payment_term {
        PaymentTerm::Cash => Write::InsertCashMovement(CashMovement {
            id: MovementId::new(),
            tenant_id: tenant,
            created_at: now,
            direction: CashDirection::Income,
            amount: total,
            method: CASH_METHOD.to_string(),
            origin: CashOrigin::Invoice,
            invoice_id: Some(invoice.id),
            receipt_id: None,
            description,
        }),
        PaymentTerm::OpenAccount => {
            Write::InsertCurrentAccountMovement(CurrentAccountMovement {
                id: MovementId::new(),
                tenant_id: tenant,
                created_at: now,
                customer_id: invoice.customer_id,
                customer_name: invoice.customer_name.clone(),
                direction: AccountDirection::Debit,
                amount: total,
                invoice_id: Some(invoice.id),
                receipt_id: None,
                description,
            })
        }
    };

    let mut batch = WriteBatch::new(tenant);
    batch.push(Write::InsertInvoice(invoice.clone())).push(movement);
    if draft.decrement_stock {
        for line in &invoice.lines {
            if let Some(product_id) = line.product_id {
                batch.push(Write::DecrementStock {
                    product_id,
                    quantity: line.quantity,
                });
            }
        }
    }

    Ok(InvoicePlan { invoice, batch })
}

/// A payment ready to commit.
#[derive(Debug, Clone)]
pub struct PaymentPlan {
    /// The receipt document.
    pub receipt: Receipt,
    /// Receipt, current-account credit and cash income.
    pub batch: WriteBatch,
}

/// Plans an open-account payment: exactly three documents sharing one
/// receipt ID.
///
/// # Errors
///
/// Returns `InvalidAmount` or `MissingField` on invalid input.
pub fn plan_payment(
    tenant: TenantId,
    request: &PaymentRequest,
    now: DateTime<Utc>,
) -> Result<PaymentPlan, LedgerError> {
    let amount = round_money(request.amount);
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(request.amount));
    }
    if request.customer_id.0.is_nil() {
        return Err(LedgerError::MissingField("customer_id"));
    }
    let customer_name = non_empty(&request.customer_name, "customer_name")?;
    let method = non_empty(&request.method, "method")?;

    let receipt = Receipt {
        id: ReceiptId::new(),
        tenant_id: tenant,
        created_at: now,
        customer_id: request.customer_id,
        customer_name: customer_name.clone(),
        amount,
        method: method.clone(),
        description: request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_RECEIPT_DESCRIPTION)
            .to_string(),
        invoice_id: request.invoice_id,
    };

    let credit = CurrentAccountMovement {
        id: MovementId::new(),
        tenant_id: tenant,
        created_at: now,
        customer_id: receipt.customer_id,
        customer_name: customer_name.clone(),
        direction: AccountDirection::Credit,
        amount,
        invoice_id: request.invoice_id,
        receipt_id: Some(receipt.id),
        description: receipt.description.clone(),
    };

    let income = CashMovement {
        id: MovementId::new(),
        tenant_id: tenant,
        created_at: now,
        direction: CashDirection::Income,
        amount,
        method,
        origin: CashOrigin::Receipt,
        // Reaches the invoice through the receipt.
        invoice_id: None,
        receipt_id: Some(receipt.id),
        description: format!("Receipt {} - {customer_name}", receipt.id),
    };

    let mut batch = WriteBatch::new(tenant);
    batch
        .push(Write::InsertReceipt(receipt.clone()))
        .push(Write::InsertCurrentAccountMovement(credit))
        .push(Write::InsertCashMovement(income));

    Ok(PaymentPlan { receipt, batch })
}

/// Plans a manual treasury movement.
///
/// # Errors
///
/// Returns `InvalidAmount` or `MissingField` on invalid input.
pub fn plan_manual_cash(
    tenant: TenantId,
    input: &ManualCashMovementInput,
    now: DateTime<Utc>,
) -> Result<(CashMovement, WriteBatch), LedgerError> {
    let amount = round_money(input.amount);
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(input.amount));
    }
    let method = non_empty(&input.method, "method")?;
    let description = non_empty(&input.description, "description")?;

    let movement = CashMovement {
        id: MovementId::new(),
        tenant_id: tenant,
        created_at: now,
        direction: input.direction,
        amount,
        method,
        origin: CashOrigin::Manual,
        invoice_id: input.invoice_id,
        receipt_id: input.receipt_id,
        description,
    };

    let mut batch = WriteBatch::new(tenant);
    batch.push(Write::InsertCashMovement(movement.clone()));
    Ok((movement, batch))
}

fn non_empty(value: &str, field: &'static str) -> Result<String, LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::MissingField(field));
    }
    Ok(trimmed.to_string())
}
