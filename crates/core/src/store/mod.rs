//! Document store seam.
//!
//! Every multi-document change goes through [`DocumentStore::commit`], which
//! applies a [`WriteBatch`] atomically: either every write is visible or
//! none is. Reads are tenant scoped.

mod error;
mod memory;
#[cfg(test)]
pub(crate) mod testing;

pub use error::StoreError;
pub use memory::InMemoryStore;

use arqon_shared::types::{
    CustomerId, InvoiceId, LeadId, MovementId, PriceListId, ProductId, QuoteId, ReceiptId,
    TenantId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::catalog::types::{PriceEntry, PriceList, Product, ProductDetails};
use crate::customer::types::{Customer, CustomerFields, CustomerQuery, Lead, LeadStage};
use crate::ledger::types::{CashMovement, CurrentAccountMovement, Invoice, Receipt};
use crate::pricing::ProductPricing;
use crate::quote::types::{Quote, QuoteStatus};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A single write inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    /// Insert an invoice; fails if the ID exists.
    InsertInvoice(Invoice),
    /// Insert a cash movement; fails if the ID exists.
    InsertCashMovement(CashMovement),
    /// Insert a current-account movement; fails if the ID exists.
    InsertCurrentAccountMovement(CurrentAccountMovement),
    /// Insert a receipt; fails if the ID exists.
    InsertReceipt(Receipt),
    /// Insert a product; fails if the ID (and so the SKU) exists.
    InsertProduct(Product),
    /// Overwrite a product's descriptive fields and price. Stock changes
    /// only when `details.stock` is set; a new price clears the stored
    /// derivation. A missing product is skipped.
    UpdateProductDetails {
        /// Product to update.
        product_id: ProductId,
        /// New field values.
        details: ProductDetails,
    },
    /// Store a derivation result on a product: price, cost when the
    /// derivation has one, and the pricing record. Nothing else changes. A
    /// missing product is skipped.
    SetProductPricing {
        /// Product to update.
        product_id: ProductId,
        /// Parameters and result of the derivation.
        pricing: ProductPricing,
    },
    /// Subtract `quantity` from a product's stock. A missing product is
    /// skipped.
    DecrementStock {
        /// Product to update.
        product_id: ProductId,
        /// Units to subtract.
        quantity: Decimal,
    },
    /// Insert or replace a price list.
    UpsertPriceList(PriceList),
    /// Insert or replace a price entry.
    UpsertPriceEntry(PriceEntry),
    /// Insert a quote; fails if the ID exists.
    InsertQuote(Quote),
    /// Replace a quote, only if its stored status is still `expected_status`.
    /// Otherwise the whole batch fails with [`StoreError::Conflict`].
    UpdateQuote {
        /// New quote state.
        quote: Quote,
        /// Status the stored quote must have.
        expected_status: QuoteStatus,
    },
    /// Insert a customer; fails if the ID exists.
    InsertCustomer(Customer),
    /// Overwrite the fields `fields` sets on a customer. A missing customer
    /// is skipped.
    UpdateCustomer {
        /// Customer to update.
        customer_id: CustomerId,
        /// Normalized field values.
        fields: CustomerFields,
    },
    /// Insert a lead; fails if the ID exists.
    InsertLead(Lead),
    /// Move a lead to `stage`. A missing lead is skipped.
    SetLeadStage {
        /// Lead to update.
        lead_id: LeadId,
        /// New stage.
        stage: LeadStage,
    },
}

impl Write {
    /// Collection touched by this write, for logs.
    #[must_use]
    pub const fn collection(&self) -> &'static str {
        match self {
            Self::InsertInvoice(_) => "invoices",
            Self::InsertCashMovement(_) => "cash_movements",
            Self::InsertCurrentAccountMovement(_) => "current_account_movements",
            Self::InsertReceipt(_) => "receipts",
            Self::InsertProduct(_)
            | Self::UpdateProductDetails { .. }
            | Self::SetProductPricing { .. }
            | Self::DecrementStock { .. } => "products",
            Self::UpsertPriceList(_) => "price_lists",
            Self::UpsertPriceEntry(_) => "prices",
            Self::InsertQuote(_) | Self::UpdateQuote { .. } => "quotes",
            Self::InsertCustomer(_) | Self::UpdateCustomer { .. } => "customers",
            Self::InsertLead(_) | Self::SetLeadStage { .. } => "leads",
        }
    }
}

/// Writes applied together, all or nothing, for one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    tenant_id: TenantId,
    writes: Vec<Write>,
}

impl WriteBatch {
    /// Creates an empty batch for a tenant.
    #[must_use]
    pub const fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            writes: Vec::new(),
        }
    }

    /// Appends a write.
    pub fn push(&mut self, write: Write) -> &mut Self {
        self.writes.push(write);
        self
    }

    /// Tenant the batch belongs to.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Writes in application order.
    #[must_use]
    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    /// Consumes the batch, returning its writes.
    #[must_use]
    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }

    /// Number of writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns true if the batch has no writes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Inclusive time range filter. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    /// Lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Upper bound.
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Returns true if `at` falls inside the range.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }
}

/// External document store with an atomic multi-document commit.
///
/// Listing methods return newest first unless stated otherwise.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Applies every write in the batch atomically.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Fetches a product.
    async fn get_product(&self, tenant: TenantId, id: ProductId) -> StoreResult<Option<Product>>;

    /// Fetches the products whose SKU is in `skus`.
    async fn find_products_by_sku(
        &self,
        tenant: TenantId,
        skus: &[String],
    ) -> StoreResult<Vec<Product>>;

    /// Lists products ordered by name.
    async fn list_products(&self, tenant: TenantId, limit: u64) -> StoreResult<Vec<Product>>;

    /// Fetches an invoice.
    async fn get_invoice(&self, tenant: TenantId, id: InvoiceId) -> StoreResult<Option<Invoice>>;

    /// Lists invoices.
    async fn list_invoices(&self, tenant: TenantId, limit: u64) -> StoreResult<Vec<Invoice>>;

    /// Fetches a receipt.
    async fn get_receipt(&self, tenant: TenantId, id: ReceiptId) -> StoreResult<Option<Receipt>>;

    /// Every current-account movement of a customer.
    async fn current_account_movements(
        &self,
        tenant: TenantId,
        customer: CustomerId,
    ) -> StoreResult<Vec<CurrentAccountMovement>>;

    /// Every cash movement inside `range`.
    async fn cash_movements(
        &self,
        tenant: TenantId,
        range: TimeRange,
    ) -> StoreResult<Vec<CashMovement>>;

    /// Fetches a cash movement.
    async fn get_cash_movement(
        &self,
        tenant: TenantId,
        id: MovementId,
    ) -> StoreResult<Option<CashMovement>>;

    /// Fetches a quote.
    async fn get_quote(&self, tenant: TenantId, id: QuoteId) -> StoreResult<Option<Quote>>;

    /// Lists quotes.
    async fn list_quotes(&self, tenant: TenantId, limit: u64) -> StoreResult<Vec<Quote>>;

    /// Fetches a price list by code.
    async fn get_price_list_by_code(
        &self,
        tenant: TenantId,
        code: &str,
    ) -> StoreResult<Option<PriceList>>;

    /// Lists the entries of a price list ordered by SKU.
    async fn list_price_entries(
        &self,
        tenant: TenantId,
        list_id: PriceListId,
    ) -> StoreResult<Vec<PriceEntry>>;

    /// Fetches a customer.
    async fn get_customer(
        &self,
        tenant: TenantId,
        id: CustomerId,
    ) -> StoreResult<Option<Customer>>;

    /// Fetches the customers whose document number is in `doc_numbers` or
    /// whose email is in `emails`, oldest first.
    async fn find_customers(
        &self,
        tenant: TenantId,
        doc_numbers: &[String],
        emails: &[String],
    ) -> StoreResult<Vec<Customer>>;

    /// Lists the customers matching `query`.
    async fn list_customers(
        &self,
        tenant: TenantId,
        query: &CustomerQuery,
    ) -> StoreResult<Vec<Customer>>;

    /// Fetches a lead.
    async fn get_lead(&self, tenant: TenantId, id: LeadId) -> StoreResult<Option<Lead>>;

    /// Lists leads, optionally only those in `stage`.
    async fn list_leads(
        &self,
        tenant: TenantId,
        stage: Option<LeadStage>,
        limit: u64,
    ) -> StoreResult<Vec<Lead>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_time_range_bounds_are_inclusive() {
        let now = Utc::now();
        let range = TimeRange {
            from: Some(now - Duration::hours(1)),
            to: Some(now),
        };
        assert!(range.contains(now));
        assert!(range.contains(now - Duration::hours(1)));
        assert!(!range.contains(now + Duration::seconds(1)));
        assert!(TimeRange::default().contains(now));
    }

    #[test]
    fn test_batch_keeps_order() {
        let tenant = TenantId::new();
        let mut batch = WriteBatch::new(tenant);
        let a = ProductId::new();
        let b = ProductId::new();
        batch
            .push(Write::DecrementStock {
                product_id: a,
                quantity: Decimal::ONE,
            })
            .push(Write::DecrementStock {
                product_id: b,
                quantity: Decimal::TWO,
            });

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.tenant_id(), tenant);
        assert!(matches!(
            batch.writes()[1],
            Write::DecrementStock { product_id, .. } if product_id == b
        ));
    }
}
