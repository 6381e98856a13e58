//! Quote service: creation, workflow transitions and conversion to invoices.

use std::sync::Arc;

use arqon_shared::types::{QuoteId, TenantId};
use chrono::Utc;
use tracing::{info, instrument};

use super::error::QuoteError;
use super::types::{ConvertRequest, ConvertedQuote, Quote, QuoteDraft, QuoteStatus};
use super::workflow::QuoteWorkflow;
use crate::ledger::LedgerError;
use crate::ledger::posting::{InvoicePlan, plan_invoice, price_lines};
use crate::ledger::retry::RetryPolicy;
use crate::ledger::types::{InvoiceDraft, LineInput};
use crate::store::{DocumentStore, Write, WriteBatch};

type Transition = fn(QuoteStatus) -> Result<QuoteStatus, QuoteError>;

/// Manages quotes through a [`DocumentStore`].
#[derive(Clone)]
pub struct QuoteService {
    store: Arc<dyn DocumentStore>,
    retry: RetryPolicy,
}

impl QuoteService {
    /// Creates a quote service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Creates a quote in `Draft`, or `Sent` when requested.
    ///
    /// Lines are validated and priced like invoice lines.
    ///
    /// # Errors
    ///
    /// Returns a validation `Ledger` error, `Ledger(UnknownCustomer)` or a
    /// store failure.
    #[instrument(skip_all, fields(tenant_id = %tenant))]
    pub async fn create(&self, tenant: TenantId, draft: &QuoteDraft) -> Result<Quote, QuoteError> {
        let (lines, total) = price_lines(&draft.lines)?;
        // Conversion posts against this customer without checking again.
        if self.store.get_customer(tenant, draft.customer_id).await?.is_none() {
            return Err(LedgerError::UnknownCustomer(draft.customer_id).into());
        }
        let now = Utc::now();
        let quote = Quote {
            id: QuoteId::new(),
            tenant_id: tenant,
            customer_id: draft.customer_id,
            customer_name: draft.customer_name.trim().to_string(),
            lines,
            total,
            status: if draft.send {
                QuoteStatus::Sent
            } else {
                QuoteStatus::Draft
            },
            invoice_id: None,
            notes: draft.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        let mut batch = WriteBatch::new(tenant);
        batch.push(Write::InsertQuote(quote.clone()));
        self.store.commit(batch).await?;

        info!(quote_id = %quote.id, total = %quote.total, status = %quote.status, "quote created");
        Ok(quote)
    }

    /// Gets a quote by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the quote does not exist for the tenant.
    pub async fn get(&self, tenant: TenantId, id: QuoteId) -> Result<Quote, QuoteError> {
        self.store
            .get_quote(tenant, id)
            .await?
            .ok_or(QuoteError::NotFound(id))
    }

    /// Lists the newest quotes.
    ///
    /// # Errors
    ///
    /// Returns a store failure.
    pub async fn list(&self, tenant: TenantId, limit: u64) -> Result<Vec<Quote>, QuoteError> {
        Ok(self.store.list_quotes(tenant, limit).await?)
    }

    /// Draft → Sent.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidTransition` or a store failure.
    pub async fn send(&self, tenant: TenantId, id: QuoteId) -> Result<Quote, QuoteError> {
        self.transition(tenant, id, "send_quote", QuoteWorkflow::send)
            .await
    }

    /// Sent → Approved.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidTransition` or a store failure.
    pub async fn approve(&self, tenant: TenantId, id: QuoteId) -> Result<Quote, QuoteError> {
        self.transition(tenant, id, "approve_quote", QuoteWorkflow::approve)
            .await
    }

    /// Sent → Rejected.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidTransition` or a store failure.
    pub async fn reject(&self, tenant: TenantId, id: QuoteId) -> Result<Quote, QuoteError> {
        self.transition(tenant, id, "reject_quote", QuoteWorkflow::reject)
            .await
    }

    /// Converts an approved quote into an invoice.
    ///
    /// The invoice, its movement, any stock decrements and the quote update
    /// are one atomic commit. The quote update only applies while the stored
    /// quote is still `Approved`, so of two concurrent conversions exactly
    /// one succeeds; the other re-reads the quote on retry and fails with
    /// `AlreadyConverted`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `AlreadyConverted`, `InvalidTransition`, a line
    /// validation error or a store failure.
    #[instrument(skip_all, fields(tenant_id = %tenant, quote_id = %id, term = ?request.payment_term))]
    pub async fn convert(
        &self,
        tenant: TenantId,
        id: QuoteId,
        request: ConvertRequest,
    ) -> Result<ConvertedQuote, QuoteError> {
        let converted = self
            .retry
            .run("convert_quote", move || async move {
                let mut quote = self.get(tenant, id).await?;
                if quote.status == QuoteStatus::Invoiced {
                    return Err(QuoteError::AlreadyConverted {
                        quote_id: id,
                        invoice_id: quote.invoice_id,
                    });
                }
                let expected = quote.status;
                let next = QuoteWorkflow::mark_invoiced(expected)?;

                let draft = InvoiceDraft {
                    customer_id: quote.customer_id,
                    customer_name: quote.customer_name.clone(),
                    lines: quote.lines.iter().map(LineInput::from).collect(),
                    payment_term: request.payment_term,
                    decrement_stock: request.decrement_stock,
                    notes: quote.notes.clone(),
                };
                let now = Utc::now();
                let InvoicePlan { invoice, mut batch } = plan_invoice(tenant, &draft, Some(id), now)?;

                quote.status = next;
                quote.invoice_id = Some(invoice.id);
                quote.updated_at = now;
                batch.push(Write::UpdateQuote {
                    quote: quote.clone(),
                    expected_status: expected,
                });
                self.store.commit(batch).await?;
                Ok(ConvertedQuote { quote, invoice })
            })
            .await?;

        info!(
            invoice_id = %converted.invoice.id,
            total = %converted.invoice.total,
            "quote converted"
        );
        Ok(converted)
    }

    #[instrument(skip_all, fields(tenant_id = %tenant, quote_id = %id, operation = operation))]
    async fn transition(
        &self,
        tenant: TenantId,
        id: QuoteId,
        operation: &'static str,
        step: Transition,
    ) -> Result<Quote, QuoteError> {
        let quote = self
            .retry
            .run(operation, move || async move {
                let mut quote = self.get(tenant, id).await?;
                let expected = quote.status;
                quote.status = step(expected)?;
                quote.updated_at = Utc::now();

                let mut batch = WriteBatch::new(tenant);
                batch.push(Write::UpdateQuote {
                    quote: quote.clone(),
                    expected_status: expected,
                });
                self.store.commit(batch).await?;
                Ok::<_, QuoteError>(quote)
            })
            .await?;

        info!(status = %quote.status, "quote status changed");
        Ok(quote)
    }
}
