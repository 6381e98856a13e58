//! Store wrapper that lets a test slip a concurrent write in between a
//! service's read and its commit.

use std::sync::Arc;

use arqon_shared::types::{
    CustomerId, InvoiceId, LeadId, MovementId, PriceListId, ProductId, QuoteId, ReceiptId,
    TenantId,
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{DocumentStore, InMemoryStore, StoreResult, TimeRange, Write, WriteBatch};
use crate::catalog::types::{PriceEntry, PriceList, Product};
use crate::customer::types::{Customer, CustomerFields, CustomerQuery, Lead, LeadStage};
use crate::ledger::types::{CashMovement, CurrentAccountMovement, Invoice, Receipt};
use crate::quote::types::Quote;

/// Inserts a customer named "ACME" for `tenant` and returns its ID.
pub(crate) async fn seed_customer(store: &dyn DocumentStore, tenant: TenantId) -> CustomerId {
    let fields = CustomerFields {
        name: Some("ACME".into()),
        ..CustomerFields::default()
    };
    let customer = Customer::create(tenant, fields, true, Utc::now()).unwrap();
    let mut batch = WriteBatch::new(tenant);
    batch.push(Write::InsertCustomer(customer.clone()));
    store.commit(batch).await.unwrap();
    customer.id
}

/// Delegates to an [`InMemoryStore`]; a batch queued with
/// [`InterleavingStore::before_next_commit`] is committed first, right before
/// the next caller's batch.
pub(crate) struct InterleavingStore {
    inner: Arc<InMemoryStore>,
    pending: Mutex<Option<WriteBatch>>,
}

impl InterleavingStore {
    pub(crate) fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            pending: Mutex::new(None),
        }
    }

    pub(crate) async fn before_next_commit(&self, batch: WriteBatch) {
        *self.pending.lock().await = Some(batch);
    }
}

#[async_trait]
impl DocumentStore for InterleavingStore {
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let pending = self.pending.lock().await.take();
        if let Some(concurrent) = pending {
            self.inner.commit(concurrent).await?;
        }
        self.inner.commit(batch).await
    }

    async fn get_product(&self, tenant: TenantId, id: ProductId) -> StoreResult<Option<Product>> {
        self.inner.get_product(tenant, id).await
    }

    async fn find_products_by_sku(
        &self,
        tenant: TenantId,
        skus: &[String],
    ) -> StoreResult<Vec<Product>> {
        self.inner.find_products_by_sku(tenant, skus).await
    }

    async fn list_products(&self, tenant: TenantId, limit: u64) -> StoreResult<Vec<Product>> {
        self.inner.list_products(tenant, limit).await
    }

    async fn get_invoice(&self, tenant: TenantId, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        self.inner.get_invoice(tenant, id).await
    }

    async fn list_invoices(&self, tenant: TenantId, limit: u64) -> StoreResult<Vec<Invoice>> {
        self.inner.list_invoices(tenant, limit).await
    }

    async fn get_receipt(&self, tenant: TenantId, id: ReceiptId) -> StoreResult<Option<Receipt>> {
        self.inner.get_receipt(tenant, id).await
    }

    async fn current_account_movements(
        &self,
        tenant: TenantId,
        customer: CustomerId,
    ) -> StoreResult<Vec<CurrentAccountMovement>> {
        self.inner.current_account_movements(tenant, customer).await
    }

    async fn cash_movements(
        &self,
        tenant: TenantId,
        range: TimeRange,
    ) -> StoreResult<Vec<CashMovement>> {
        self.inner.cash_movements(tenant, range).await
    }

    async fn get_cash_movement(
        &self,
        tenant: TenantId,
        id: MovementId,
    ) -> StoreResult<Option<CashMovement>> {
        self.inner.get_cash_movement(tenant, id).await
    }

    async fn get_quote(&self, tenant: TenantId, id: QuoteId) -> StoreResult<Option<Quote>> {
        self.inner.get_quote(tenant, id).await
    }

    async fn list_quotes(&self, tenant: TenantId, limit: u64) -> StoreResult<Vec<Quote>> {
        self.inner.list_quotes(tenant, limit).await
    }

    async fn get_price_list_by_code(
        &self,
        tenant: TenantId,
        code: &str,
    ) -> StoreResult<Option<PriceList>> {
        self.inner.get_price_list_by_code(tenant, code).await
    }

    async fn list_price_entries(
        &self,
        tenant: TenantId,
        list_id: PriceListId,
    ) -> StoreResult<Vec<PriceEntry>> {
        self.inner.list_price_entries(tenant, list_id).await
    }

    async fn get_customer(
        &self,
        tenant: TenantId,
        id: CustomerId,
    ) -> StoreResult<Option<Customer>> {
        self.inner.get_customer(tenant, id).await
    }

    async fn find_customers(
        &self,
        tenant: TenantId,
        doc_numbers: &[String],
        emails: &[String],
    ) -> StoreResult<Vec<Customer>> {
        self.inner.find_customers(tenant, doc_numbers, emails).await
    }

    async fn list_customers(
        &self,
        tenant: TenantId,
        query: &CustomerQuery,
    ) -> StoreResult<Vec<Customer>> {
        self.inner.list_customers(tenant, query).await
    }

    async fn get_lead(&self, tenant: TenantId, id: LeadId) -> StoreResult<Option<Lead>> {
        self.inner.get_lead(tenant, id).await
    }

    async fn list_leads(
        &self,
        tenant: TenantId,
        stage: Option<LeadStage>,
        limit: u64,
    ) -> StoreResult<Vec<Lead>> {
        self.inner.list_leads(tenant, stage, limit).await
    }
}
