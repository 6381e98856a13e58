//! In-process document store for development and tests.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::Display;
use std::hash::Hash;

use arqon_shared::types::{
    CustomerId, InvoiceId, LeadId, MovementId, PriceListId, ProductId, QuoteId, ReceiptId,
    TenantId,
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use super::{DocumentStore, StoreError, StoreResult, TimeRange, Write, WriteBatch};
use crate::catalog::types::{PriceEntry, PriceList, Product};
use crate::customer::types::{Customer, CustomerQuery, Lead, LeadStage};
use crate::ledger::types::{CashMovement, CurrentAccountMovement, Invoice, Receipt};
use crate::quote::types::Quote;

#[derive(Debug, Clone, Default)]
struct Collections {
    products: HashMap<(TenantId, ProductId), Product>,
    invoices: HashMap<(TenantId, InvoiceId), Invoice>,
    receipts: HashMap<(TenantId, ReceiptId), Receipt>,
    cash: HashMap<(TenantId, MovementId), CashMovement>,
    current_account: HashMap<(TenantId, MovementId), CurrentAccountMovement>,
    quotes: HashMap<(TenantId, QuoteId), Quote>,
    price_lists: HashMap<(TenantId, PriceListId), PriceList>,
    prices: HashMap<(TenantId, String), PriceEntry>,
    customers: HashMap<(TenantId, CustomerId), Customer>,
    leads: HashMap<(TenantId, LeadId), Lead>,
}

impl Collections {
    fn apply(&mut self, tenant: TenantId, write: Write) -> StoreResult<()> {
        match write {
            Write::InsertInvoice(doc) => {
                insert_new(&mut self.invoices, (tenant, doc.id), doc, "invoices")
            }
            Write::InsertCashMovement(doc) => {
                insert_new(&mut self.cash, (tenant, doc.id), doc, "cash_movements")
            }
            Write::InsertCurrentAccountMovement(doc) => insert_new(
                &mut self.current_account,
                (tenant, doc.id),
                doc,
                "current_account_movements",
            ),
            Write::InsertReceipt(doc) => {
                insert_new(&mut self.receipts, (tenant, doc.id), doc, "receipts")
            }
            Write::InsertProduct(doc) => {
                insert_new(&mut self.products, (tenant, doc.id), doc, "products")
            }
            Write::UpdateProductDetails {
                product_id,
                details,
            } => {
                if let Some(product) = self.products.get_mut(&(tenant, product_id)) {
                    product.apply_details(details, Utc::now());
                }
                Ok(())
            }
            Write::SetProductPricing {
                product_id,
                pricing,
            } => {
                if let Some(product) = self.products.get_mut(&(tenant, product_id)) {
                    product.apply_pricing(pricing, Utc::now());
                }
                Ok(())
            }
            Write::DecrementStock {
                product_id,
                quantity,
            } => {
                if let Some(product) = self.products.get_mut(&(tenant, product_id)) {
                    product.stock = product
                        .stock
                        .checked_sub(quantity)
                        .ok_or_else(|| StoreError::Backend("stock overflow".into()))?;
                    product.updated_at = Utc::now();
                }
                Ok(())
            }
            Write::UpsertPriceList(doc) => {
                self.price_lists.insert((tenant, doc.id), doc);
                Ok(())
            }
            Write::UpsertPriceEntry(doc) => {
                self.prices.insert((tenant, doc.id.clone()), doc);
                Ok(())
            }
            Write::InsertQuote(doc) => insert_new(&mut self.quotes, (tenant, doc.id), doc, "quotes"),
            Write::UpdateQuote {
                quote,
                expected_status,
            } => match self.quotes.get_mut(&(tenant, quote.id)) {
                Some(stored) if stored.status == expected_status => {
                    *stored = quote;
                    Ok(())
                }
                Some(stored) => Err(StoreError::Conflict(format!(
                    "quote {} is {}, expected {expected_status}",
                    quote.id, stored.status
                ))),
                None => Err(StoreError::Conflict(format!("quote {} not found", quote.id))),
            },
            Write::InsertCustomer(doc) => {
                insert_new(&mut self.customers, (tenant, doc.id), doc, "customers")
            }
            Write::UpdateCustomer {
                customer_id,
                fields,
            } => {
                if let Some(customer) = self.customers.get_mut(&(tenant, customer_id)) {
                    customer.apply(fields, Utc::now());
                }
                Ok(())
            }
            Write::InsertLead(doc) => insert_new(&mut self.leads, (tenant, doc.id), doc, "leads"),
            Write::SetLeadStage { lead_id, stage } => {
                if let Some(lead) = self.leads.get_mut(&(tenant, lead_id)) {
                    lead.stage = stage;
                    lead.updated_at = Utc::now();
                }
                Ok(())
            }
        }
    }

    fn len(&self) -> usize {
        self.products.len()
            + self.invoices.len()
            + self.receipts.len()
            + self.cash.len()
            + self.current_account.len()
            + self.quotes.len()
            + self.price_lists.len()
            + self.prices.len()
            + self.customers.len()
            + self.leads.len()
    }
}

fn insert_new<I, V>(
    map: &mut HashMap<(TenantId, I), V>,
    key: (TenantId, I),
    value: V,
    collection: &'static str,
) -> StoreResult<()>
where
    I: Eq + Hash + Display,
{
    match map.entry(key) {
        Entry::Occupied(entry) => Err(StoreError::AlreadyExists {
            collection,
            id: entry.key().1.to_string(),
        }),
        Entry::Vacant(entry) => {
            entry.insert(value);
            Ok(())
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    conflicts: u32,
    fail_at_write: Option<usize>,
    commits_before_failure: u32,
}

/// Document store held in process memory.
///
/// A batch is applied to a staged copy under one write lock and swapped in
/// only if every write succeeded, so a failing batch leaves no trace.
///
/// Faults can be injected to exercise conflict retries and atomicity.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<Collections>,
    faults: Mutex<Faults>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` commits fail with [`StoreError::Conflict`].
    pub async fn inject_conflicts(&self, count: u32) {
        self.faults.lock().await.conflicts = count;
    }

    /// Makes the next commit fail when it reaches write number `position`
    /// (1-based).
    pub async fn fail_next_commit_at(&self, position: usize) {
        self.fail_commit_at(0, position).await;
    }

    /// Lets `successful` commits through, then fails the following one at
    /// write number `position` (1-based).
    pub async fn fail_commit_at(&self, successful: u32, position: usize) {
        let mut faults = self.faults.lock().await;
        faults.commits_before_failure = successful;
        faults.fail_at_write = Some(position);
    }

    /// Total number of stored documents across all tenants and collections.
    pub async fn document_count(&self) -> usize {
        self.data.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let fail_at = {
            let mut faults = self.faults.lock().await;
            if faults.conflicts > 0 {
                faults.conflicts -= 1;
                return Err(StoreError::Conflict("injected conflict".into()));
            }
            if faults.commits_before_failure > 0 {
                faults.commits_before_failure -= 1;
                None
            } else {
                faults.fail_at_write.take()
            }
        };

        let tenant = batch.tenant_id();
        let mut data = self.data.write().await;
        let mut staged = data.clone();
        for (index, write) in batch.into_writes().into_iter().enumerate() {
            if fail_at == Some(index + 1) {
                return Err(StoreError::Backend(format!(
                    "injected failure at write {}",
                    index + 1
                )));
            }
            staged.apply(tenant, write)?;
        }
        *data = staged;
        Ok(())
    }

    async fn get_product(&self, tenant: TenantId, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.data.read().await.products.get(&(tenant, id)).cloned())
    }

    async fn find_products_by_sku(
        &self,
        tenant: TenantId,
        skus: &[String],
    ) -> StoreResult<Vec<Product>> {
        let data = self.data.read().await;
        Ok(data
            .products
            .iter()
            .filter(|((t, _), p)| {
                *t == tenant && p.sku.as_ref().is_some_and(|sku| skus.contains(sku))
            })
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn list_products(&self, tenant: TenantId, limit: u64) -> StoreResult<Vec<Product>> {
        let data = self.data.read().await;
        let mut products: Vec<Product> = data
            .products
            .iter()
            .filter(|((t, _), _)| *t == tenant)
            .map(|(_, p)| p.clone())
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        products.truncate(to_len(limit));
        Ok(products)
    }

    async fn get_invoice(&self, tenant: TenantId, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        Ok(self.data.read().await.invoices.get(&(tenant, id)).cloned())
    }

    async fn list_invoices(&self, tenant: TenantId, limit: u64) -> StoreResult<Vec<Invoice>> {
        let data = self.data.read().await;
        let mut invoices: Vec<Invoice> = data
            .invoices
            .iter()
            .filter(|((t, _), _)| *t == tenant)
            .map(|(_, i)| i.clone())
            .collect();
        invoices.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        invoices.truncate(to_len(limit));
        Ok(invoices)
    }

    async fn get_receipt(&self, tenant: TenantId, id: ReceiptId) -> StoreResult<Option<Receipt>> {
        Ok(self.data.read().await.receipts.get(&(tenant, id)).cloned())
    }

    async fn current_account_movements(
        &self,
        tenant: TenantId,
        customer: CustomerId,
    ) -> StoreResult<Vec<CurrentAccountMovement>> {
        let data = self.data.read().await;
        let mut movements: Vec<CurrentAccountMovement> = data
            .current_account
            .iter()
            .filter(|((t, _), m)| *t == tenant && m.customer_id == customer)
            .map(|(_, m)| m.clone())
            .collect();
        movements.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(movements)
    }

    async fn cash_movements(
        &self,
        tenant: TenantId,
        range: TimeRange,
    ) -> StoreResult<Vec<CashMovement>> {
        let data = self.data.read().await;
        let mut movements: Vec<CashMovement> = data
            .cash
            .iter()
            .filter(|((t, _), m)| *t == tenant && range.contains(m.created_at))
            .map(|(_, m)| m.clone())
            .collect();
        movements.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(movements)
    }

    async fn get_cash_movement(
        &self,
        tenant: TenantId,
        id: MovementId,
    ) -> StoreResult<Option<CashMovement>> {
        Ok(self.data.read().await.cash.get(&(tenant, id)).cloned())
    }

    async fn get_quote(&self, tenant: TenantId, id: QuoteId) -> StoreResult<Option<Quote>> {
        Ok(self.data.read().await.quotes.get(&(tenant, id)).cloned())
    }

    async fn list_quotes(&self, tenant: TenantId, limit: u64) -> StoreResult<Vec<Quote>> {
        let data = self.data.read().await;
        let mut quotes: Vec<Quote> = data
            .quotes
            .iter()
            .filter(|((t, _), _)| *t == tenant)
            .map(|(_, q)| q.clone())
            .collect();
        quotes.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        quotes.truncate(to_len(limit));
        Ok(quotes)
    }

    async fn get_price_list_by_code(
        &self,
        tenant: TenantId,
        code: &str,
    ) -> StoreResult<Option<PriceList>> {
        let data = self.data.read().await;
        Ok(data
            .price_lists
            .iter()
            .find(|((t, _), l)| *t == tenant && l.code == code)
            .map(|(_, l)| l.clone()))
    }

    async fn list_price_entries(
        &self,
        tenant: TenantId,
        list_id: PriceListId,
    ) -> StoreResult<Vec<PriceEntry>> {
        let data = self.data.read().await;
        let mut entries: Vec<PriceEntry> = data
            .prices
            .iter()
            .filter(|((t, _), e)| *t == tenant && e.list_id == list_id)
            .map(|(_, e)| e.clone())
            .collect();
        entries.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(entries)
    }

    async fn get_customer(
        &self,
        tenant: TenantId,
        id: CustomerId,
    ) -> StoreResult<Option<Customer>> {
        Ok(self.data.read().await.customers.get(&(tenant, id)).cloned())
    }

    async fn find_customers(
        &self,
        tenant: TenantId,
        doc_numbers: &[String],
        emails: &[String],
    ) -> StoreResult<Vec<Customer>> {
        let data = self.data.read().await;
        let mut customers: Vec<Customer> = data
            .customers
            .iter()
            .filter(|((t, _), c)| {
                *t == tenant
                    && (c.doc_number.as_ref().is_some_and(|doc| doc_numbers.contains(doc))
                        || c.email.as_ref().is_some_and(|email| emails.contains(email)))
            })
            .map(|(_, c)| c.clone())
            .collect();
        customers.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(customers)
    }

    async fn list_customers(
        &self,
        tenant: TenantId,
        query: &CustomerQuery,
    ) -> StoreResult<Vec<Customer>> {
        let data = self.data.read().await;
        let mut customers: Vec<Customer> = data
            .customers
            .iter()
            .filter(|((t, _), c)| *t == tenant && query.matches(c))
            .map(|(_, c)| c.clone())
            .collect();
        customers.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        customers.truncate(to_len(query.limit));
        Ok(customers)
    }

    async fn get_lead(&self, tenant: TenantId, id: LeadId) -> StoreResult<Option<Lead>> {
        Ok(self.data.read().await.leads.get(&(tenant, id)).cloned())
    }

    async fn list_leads(
        &self,
        tenant: TenantId,
        stage: Option<LeadStage>,
        limit: u64,
    ) -> StoreResult<Vec<Lead>> {
        let data = self.data.read().await;
        let mut leads: Vec<Lead> = data
            .leads
            .iter()
            .filter(|((t, _), l)| *t == tenant && stage.is_none_or(|s| l.stage == s))
            .map(|(_, l)| l.clone())
            .collect();
        leads.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        leads.truncate(to_len(limit));
        Ok(leads)
    }
}

fn to_len(limit: u64) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}
