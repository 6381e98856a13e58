//! Posting service: invoices, payments and manual cash movements.
//!
//! Every posting is planned from fresh state and committed as one atomic
//! batch. A transaction conflict re-runs the whole plan-and-commit step under
//! the configured [`RetryPolicy`].

use std::sync::Arc;

use arqon_shared::types::{CustomerId, TenantId};
use chrono::Utc;
use tracing::{error, info, instrument};

use super::error::LedgerError;
use super::posting::{plan_invoice, plan_manual_cash, plan_payment};
use super::retry::RetryPolicy;
use super::types::{CashMovement, Invoice, InvoiceDraft, ManualCashMovementInput, PaymentRequest, Receipt};
use crate::store::DocumentStore;

/// Posts ledger documents through a [`DocumentStore`].
#[derive(Clone)]
pub struct PostingService {
    store: Arc<dyn DocumentStore>,
    retry: RetryPolicy,
}

impl PostingService {
    /// Creates a posting service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Returns the retry policy in use.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Issues an invoice together with its cash income or current-account
    /// debit, and optional stock decrements, in one atomic commit.
    ///
    /// The total is always computed from the lines.
    ///
    /// # Errors
    ///
    /// Returns a validation `LedgerError`, `UnknownCustomer`,
    /// `TransactionConflict` once retries are exhausted, or `Store` on any
    /// other store failure. On error nothing was written.
    #[instrument(skip_all, fields(tenant_id = %tenant, term = ?draft.payment_term))]
    pub async fn issue_invoice(
        &self,
        tenant: TenantId,
        draft: &InvoiceDraft,
    ) -> Result<Invoice, LedgerError> {
        let invoice = self
            .retry
            .run("issue_invoice", move || async move {
                let plan = plan_invoice(tenant, draft, None, Utc::now())?;
                self.require_customer(tenant, draft.customer_id).await?;
                self.store.commit(plan.batch).await?;
                Ok(plan.invoice)
            })
            .await
            .inspect_err(log_store_failure)?;

        info!(
            invoice_id = %invoice.id,
            total = %invoice.total,
            lines = invoice.lines.len(),
            "invoice issued"
        );
        Ok(invoice)
    }

    /// Registers an open-account payment: receipt, current-account credit and
    /// cash income, all or none.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount`/`MissingField` on invalid input,
    /// `UnknownCustomer`, `TransactionConflict` once retries are exhausted, or
    /// `Store`.
    #[instrument(skip_all, fields(tenant_id = %tenant, customer_id = %request.customer_id))]
    pub async fn register_payment(
        &self,
        tenant: TenantId,
        request: &PaymentRequest,
    ) -> Result<Receipt, LedgerError> {
        let receipt = self
            .retry
            .run("register_payment", move || async move {
                let plan = plan_payment(tenant, request, Utc::now())?;
                self.require_customer(tenant, request.customer_id).await?;
                self.store.commit(plan.batch).await?;
                Ok(plan.receipt)
            })
            .await
            .inspect_err(log_store_failure)?;

        info!(
            receipt_id = %receipt.id,
            amount = %receipt.amount,
            "payment registered"
        );
        Ok(receipt)
    }

    /// Records a manual income or expense.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount`/`MissingField` on invalid input, or a store
    /// error.
    #[instrument(skip_all, fields(tenant_id = %tenant, direction = ?input.direction))]
    pub async fn record_cash_movement(
        &self,
        tenant: TenantId,
        input: &ManualCashMovementInput,
    ) -> Result<CashMovement, LedgerError> {
        let movement = self
            .retry
            .run("record_cash_movement", move || async move {
                let (movement, batch) = plan_manual_cash(tenant, input, Utc::now())?;
                self.store.commit(batch).await?;
                Ok(movement)
            })
            .await
            .inspect_err(log_store_failure)?;

        info!(movement_id = %movement.id, amount = %movement.amount, "cash movement recorded");
        Ok(movement)
    }

    // Customers are never deleted, so a check before the commit still holds
    // when the commit lands.
    async fn require_customer(&self, tenant: TenantId, id: CustomerId) -> Result<(), LedgerError> {
        match self.store.get_customer(tenant, id).await? {
            Some(_) => Ok(()),
            None => Err(LedgerError::UnknownCustomer(id)),
        }
    }
}

fn log_store_failure(err: &LedgerError) {
    if let LedgerError::Store(store_err) = err {
        error!(error = %store_err, "posting failed in store");
    }
}
