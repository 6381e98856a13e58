//! PostgreSQL implementation of the document store.
//!
//! Each batch runs in one SERIALIZABLE transaction. Serialization failures
//! and deadlocks surface as [`StoreError::Conflict`] so the posting layer can
//! re-run its read-plan-commit step.

use arqon_core::catalog::{PriceEntry, PriceList, Product};
use arqon_core::customer::{Customer, CustomerFields, CustomerQuery, Lead, LeadStage};
use arqon_core::ledger::{CashMovement, CurrentAccountMovement, Invoice, Receipt};
use arqon_core::quote::Quote;
use arqon_core::store::{DocumentStore, StoreError, StoreResult, TimeRange, Write, WriteBatch};
use arqon_shared::types::{
    CustomerId, InvoiceId, LeadId, MovementId, PriceListId, ProductId, QuoteId, ReceiptId,
    TenantId,
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::prelude::Json;
use sea_orm::sea_query::{Expr, Func, OnConflict};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, IsolationLevel,
    QueryFilter, QueryOrder, QuerySelect, RuntimeErr, SqlErr, TransactionTrait,
};
use tracing::{debug, warn};

use crate::convert::{
    account_from_row, account_row, cash_from_row, cash_row, customer_from_row, customer_row,
    invoice_from_row, invoice_row, lead_from_row, lead_row, price_entry_from_row,
    price_entry_row, price_list_from_row, price_list_row, product_from_row, product_row,
    quote_from_row, quote_row, receipt_from_row, receipt_row, to_json, to_text, ts,
};
use crate::entities::{
    cash_movements, current_account_movements, customers, invoices, leads, price_lists, prices,
    products, quotes, receipts,
};

/// SQLSTATE codes that mean "lost a race, retry the transaction".
const RETRYABLE_SQLSTATES: [&str; 2] = ["40001", "40P01"];

/// Document store backed by PostgreSQL through `SeaORM`.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    db: DatabaseConnection,
}

impl PgDocumentStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code.into_owned())
}

/// Maps a `SeaORM` error onto the store taxonomy.
pub(crate) fn map_db_err(err: DbErr) -> StoreError {
    let state = match &err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx_err))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx_err)) => sqlstate(sqlx_err),
        _ => None,
    };
    if state
        .as_deref()
        .is_some_and(|code| RETRYABLE_SQLSTATES.contains(&code))
    {
        return StoreError::Conflict(err.to_string());
    }
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => StoreError::Unavailable(err.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

fn map_insert_err(collection: &'static str, id: String) -> impl FnOnce(DbErr) -> StoreError {
    move |err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::AlreadyExists { collection, id },
        _ => map_db_err(err),
    }
}

/// `%needle%` for a case-insensitive `LIKE` on a lowercased column, with the
/// pattern characters of `needle` escaped.
fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Column updates for the fields an update sets; absent fields are kept.
fn customer_updates(
    fields: CustomerFields,
) -> StoreResult<Vec<(customers::Column, sea_orm::sea_query::SimpleExpr)>> {
    let mut updates = Vec::new();
    let text_columns = [
        (customers::Column::DocNumber, fields.doc_number),
        (customers::Column::Name, fields.name),
        (customers::Column::TradeName, fields.trade_name),
        (customers::Column::Email, fields.email),
        (customers::Column::Phone, fields.phone),
        (customers::Column::Address, fields.address),
        (customers::Column::City, fields.city),
        (customers::Column::Province, fields.province),
        (customers::Column::Notes, fields.notes),
    ];
    for (column, value) in text_columns {
        if let Some(value) = value {
            updates.push((column, Expr::value(value)));
        }
    }
    if let Some(vat) = fields.vat_condition {
        updates.push((customers::Column::VatCondition, Expr::value(to_text(&vat)?)));
    }
    if let Some(bonif) = fields.bonif_percent {
        updates.push((customers::Column::BonifPercent, Expr::value(bonif)));
    }
    if let Some(active) = fields.active {
        updates.push((customers::Column::Active, Expr::value(active)));
    }
    updates.push((customers::Column::UpdatedAt, Expr::value(ts(Utc::now()))));
    Ok(updates)
}

async fn apply(txn: &DatabaseTransaction, tenant: TenantId, write: Write) -> StoreResult<()> {
    let collection = write.collection();
    match write {
        Write::InsertInvoice(invoice) => {
            invoices::Entity::insert(invoice_row(&invoice)?)
                .exec_without_returning(txn)
                .await
                .map_err(map_insert_err(collection, invoice.id.to_string()))?;
        }
        Write::InsertCashMovement(movement) => {
            cash_movements::Entity::insert(cash_row(&movement)?)
                .exec_without_returning(txn)
                .await
                .map_err(map_insert_err(collection, movement.id.to_string()))?;
        }
        Write::InsertCurrentAccountMovement(movement) => {
            current_account_movements::Entity::insert(account_row(&movement)?)
                .exec_without_returning(txn)
                .await
                .map_err(map_insert_err(collection, movement.id.to_string()))?;
        }
        Write::InsertReceipt(receipt) => {
            receipts::Entity::insert(receipt_row(&receipt))
                .exec_without_returning(txn)
                .await
                .map_err(map_insert_err(collection, receipt.id.to_string()))?;
        }
        Write::InsertProduct(product) => {
            products::Entity::insert(product_row(&product)?)
                .exec_without_returning(txn)
                .await
                .map_err(map_insert_err(collection, product.id.to_string()))?;
        }
        Write::UpdateProductDetails {
            product_id,
            details,
        } => {
            // Compared against the stored price: a new price drops the
            // derivation that produced the old one.
            let keep_pricing = Expr::case(
                Expr::col(products::Column::Price).eq(details.price),
                Expr::col(products::Column::Pricing),
            )
            .finally(Expr::value(Option::<Json>::None));
            let mut update = products::Entity::update_many()
                .col_expr(products::Column::Pricing, keep_pricing.into())
                .col_expr(products::Column::Name, Expr::value(details.name))
                .col_expr(products::Column::Price, Expr::value(details.price))
                .col_expr(products::Column::Cost, Expr::value(details.cost))
                .col_expr(products::Column::VatPercent, Expr::value(details.vat_percent))
                .col_expr(products::Column::Unit, Expr::value(details.unit))
                .col_expr(products::Column::Category, Expr::value(details.category))
                .col_expr(products::Column::Notes, Expr::value(details.notes))
                .col_expr(products::Column::UpdatedAt, Expr::value(ts(Utc::now())));
            if let Some(stock) = details.stock {
                update = update.col_expr(products::Column::Stock, Expr::value(stock));
            }
            update
                .filter(products::Column::TenantId.eq(tenant.0))
                .filter(products::Column::Id.eq(product_id.0))
                .exec(txn)
                .await
                .map_err(map_db_err)?;
        }
        Write::SetProductPricing {
            product_id,
            pricing,
        } => {
            let mut update = products::Entity::update_many()
                .col_expr(
                    products::Column::Price,
                    Expr::value(pricing.derived.final_price),
                )
                .col_expr(products::Column::Pricing, Expr::value(to_json(&pricing)?))
                .col_expr(products::Column::UpdatedAt, Expr::value(ts(Utc::now())));
            if let Some(net_cost) = pricing.derived.net_cost {
                update = update.col_expr(products::Column::Cost, Expr::value(net_cost));
            }
            update
                .filter(products::Column::TenantId.eq(tenant.0))
                .filter(products::Column::Id.eq(product_id.0))
                .exec(txn)
                .await
                .map_err(map_db_err)?;
        }
        Write::DecrementStock {
            product_id,
            quantity,
        } => {
            // A missing product matches no row and is skipped.
            products::Entity::update_many()
                .col_expr(
                    products::Column::Stock,
                    Expr::col(products::Column::Stock).sub(quantity),
                )
                .col_expr(products::Column::UpdatedAt, Expr::value(ts(Utc::now())))
                .filter(products::Column::TenantId.eq(tenant.0))
                .filter(products::Column::Id.eq(product_id.0))
                .exec(txn)
                .await
                .map_err(map_db_err)?;
        }
        Write::UpsertPriceList(list) => {
            price_lists::Entity::insert(price_list_row(&list))
                .on_conflict(
                    OnConflict::column(price_lists::Column::Id)
                        .update_columns([
                            price_lists::Column::Name,
                            price_lists::Column::ValidFrom,
                            price_lists::Column::Active,
                            price_lists::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(txn)
                .await
                .map_err(map_db_err)?;
        }
        Write::UpsertPriceEntry(entry) => {
            prices::Entity::insert(price_entry_row(&entry))
                .on_conflict(
                    OnConflict::column(prices::Column::Id)
                        .update_columns([
                            prices::Column::Cost,
                            prices::Column::Price,
                            prices::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(txn)
                .await
                .map_err(map_db_err)?;
        }
        Write::InsertQuote(quote) => {
            quotes::Entity::insert(quote_row(&quote)?)
                .exec_without_returning(txn)
                .await
                .map_err(map_insert_err(collection, quote.id.to_string()))?;
        }
        Write::UpdateQuote {
            quote,
            expected_status,
        } => {
            let result = quotes::Entity::update_many()
                .set(quote_row(&quote)?)
                .filter(quotes::Column::TenantId.eq(tenant.0))
                .filter(quotes::Column::Id.eq(quote.id.0))
                .filter(quotes::Column::Status.eq(expected_status.as_str()))
                .exec(txn)
                .await
                .map_err(map_db_err)?;
            if result.rows_affected == 0 {
                return Err(StoreError::Conflict(format!(
                    "quote {} is no longer {expected_status}",
                    quote.id
                )));
            }
        }
        Write::InsertCustomer(customer) => {
            customers::Entity::insert(customer_row(&customer)?)
                .exec_without_returning(txn)
                .await
                .map_err(map_insert_err(collection, customer.id.to_string()))?;
        }
        Write::UpdateCustomer {
            customer_id,
            fields,
        } => {
            let mut update = customers::Entity::update_many();
            for (column, value) in customer_updates(fields)? {
                update = update.col_expr(column, value);
            }
            update
                .filter(customers::Column::TenantId.eq(tenant.0))
                .filter(customers::Column::Id.eq(customer_id.0))
                .exec(txn)
                .await
                .map_err(map_db_err)?;
        }
        Write::InsertLead(lead) => {
            leads::Entity::insert(lead_row(&lead))
                .exec_without_returning(txn)
                .await
                .map_err(map_insert_err(collection, lead.id.to_string()))?;
        }
        Write::SetLeadStage { lead_id, stage } => {
            leads::Entity::update_many()
                .col_expr(leads::Column::Stage, Expr::value(stage.as_str()))
                .col_expr(leads::Column::UpdatedAt, Expr::value(ts(Utc::now())))
                .filter(leads::Column::TenantId.eq(tenant.0))
                .filter(leads::Column::Id.eq(lead_id.0))
                .exec(txn)
                .await
                .map_err(map_db_err)?;
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let tenant = batch.tenant_id();
        let writes = batch.len();
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await
            .map_err(map_db_err)?;

        for write in batch.into_writes() {
            if let Err(err) = apply(&txn, tenant, write).await {
                // Dropping the transaction rolls it back; roll back explicitly
                // to release the connection promptly.
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "rollback failed");
                }
                return Err(err);
            }
        }

        txn.commit().await.map_err(map_db_err)?;
        debug!(tenant_id = %tenant, writes, "batch committed");
        Ok(())
    }

    async fn get_product(&self, tenant: TenantId, id: ProductId) -> StoreResult<Option<Product>> {
        products::Entity::find_by_id(id.0)
            .filter(products::Column::TenantId.eq(tenant.0))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(product_from_row)
            .transpose()
    }

    async fn find_products_by_sku(
        &self,
        tenant: TenantId,
        skus: &[String],
    ) -> StoreResult<Vec<Product>> {
        if skus.is_empty() {
            return Ok(Vec::new());
        }
        products::Entity::find()
            .filter(products::Column::TenantId.eq(tenant.0))
            .filter(products::Column::Sku.is_in(skus.iter().cloned()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(product_from_row)
            .collect()
    }

    async fn list_products(&self, tenant: TenantId, limit: u64) -> StoreResult<Vec<Product>> {
        products::Entity::find()
            .filter(products::Column::TenantId.eq(tenant.0))
            .order_by_asc(products::Column::Name)
            .order_by_asc(products::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(product_from_row)
            .collect()
    }

    async fn get_invoice(&self, tenant: TenantId, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        invoices::Entity::find_by_id(id.0)
            .filter(invoices::Column::TenantId.eq(tenant.0))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(invoice_from_row)
            .transpose()
    }

    async fn list_invoices(&self, tenant: TenantId, limit: u64) -> StoreResult<Vec<Invoice>> {
        invoices::Entity::find()
            .filter(invoices::Column::TenantId.eq(tenant.0))
            .order_by_desc(invoices::Column::CreatedAt)
            .order_by_desc(invoices::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(invoice_from_row)
            .collect()
    }

    async fn get_receipt(&self, tenant: TenantId, id: ReceiptId) -> StoreResult<Option<Receipt>> {
        Ok(receipts::Entity::find_by_id(id.0)
            .filter(receipts::Column::TenantId.eq(tenant.0))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(receipt_from_row))
    }

    async fn current_account_movements(
        &self,
        tenant: TenantId,
        customer: CustomerId,
    ) -> StoreResult<Vec<CurrentAccountMovement>> {
        current_account_movements::Entity::find()
            .filter(current_account_movements::Column::TenantId.eq(tenant.0))
            .filter(current_account_movements::Column::CustomerId.eq(customer.0))
            .order_by_desc(current_account_movements::Column::CreatedAt)
            .order_by_desc(current_account_movements::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(account_from_row)
            .collect()
    }

    async fn cash_movements(
        &self,
        tenant: TenantId,
        range: TimeRange,
    ) -> StoreResult<Vec<CashMovement>> {
        let mut query =
            cash_movements::Entity::find().filter(cash_movements::Column::TenantId.eq(tenant.0));
        if let Some(from) = range.from {
            query = query.filter(cash_movements::Column::CreatedAt.gte(ts(from)));
        }
        if let Some(to) = range.to {
            query = query.filter(cash_movements::Column::CreatedAt.lte(ts(to)));
        }
        query
            .order_by_desc(cash_movements::Column::CreatedAt)
            .order_by_desc(cash_movements::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(cash_from_row)
            .collect()
    }

    async fn get_cash_movement(
        &self,
        tenant: TenantId,
        id: MovementId,
    ) -> StoreResult<Option<CashMovement>> {
        cash_movements::Entity::find_by_id(id.0)
            .filter(cash_movements::Column::TenantId.eq(tenant.0))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(cash_from_row)
            .transpose()
    }

    async fn get_quote(&self, tenant: TenantId, id: QuoteId) -> StoreResult<Option<Quote>> {
        quotes::Entity::find_by_id(id.0)
            .filter(quotes::Column::TenantId.eq(tenant.0))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(quote_from_row)
            .transpose()
    }

    async fn list_quotes(&self, tenant: TenantId, limit: u64) -> StoreResult<Vec<Quote>> {
        quotes::Entity::find()
            .filter(quotes::Column::TenantId.eq(tenant.0))
            .order_by_desc(quotes::Column::CreatedAt)
            .order_by_desc(quotes::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(quote_from_row)
            .collect()
    }

    async fn get_price_list_by_code(
        &self,
        tenant: TenantId,
        code: &str,
    ) -> StoreResult<Option<PriceList>> {
        Ok(price_lists::Entity::find()
            .filter(price_lists::Column::TenantId.eq(tenant.0))
            .filter(price_lists::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(price_list_from_row))
    }

    async fn list_price_entries(
        &self,
        tenant: TenantId,
        list_id: PriceListId,
    ) -> StoreResult<Vec<PriceEntry>> {
        Ok(prices::Entity::find()
            .filter(prices::Column::TenantId.eq(tenant.0))
            .filter(prices::Column::ListId.eq(list_id.0))
            .order_by_asc(prices::Column::Sku)
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(price_entry_from_row)
            .collect())
    }

    async fn get_customer(
        &self,
        tenant: TenantId,
        id: CustomerId,
    ) -> StoreResult<Option<Customer>> {
        customers::Entity::find_by_id(id.0)
            .filter(customers::Column::TenantId.eq(tenant.0))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(customer_from_row)
            .transpose()
    }

    async fn find_customers(
        &self,
        tenant: TenantId,
        doc_numbers: &[String],
        emails: &[String],
    ) -> StoreResult<Vec<Customer>> {
        if doc_numbers.is_empty() && emails.is_empty() {
            return Ok(Vec::new());
        }
        let mut keys = Condition::any();
        if !doc_numbers.is_empty() {
            keys = keys.add(customers::Column::DocNumber.is_in(doc_numbers.iter().cloned()));
        }
        if !emails.is_empty() {
            keys = keys.add(customers::Column::Email.is_in(emails.iter().cloned()));
        }
        customers::Entity::find()
            .filter(customers::Column::TenantId.eq(tenant.0))
            .filter(keys)
            .order_by_asc(customers::Column::CreatedAt)
            .order_by_asc(customers::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(customer_from_row)
            .collect()
    }

    async fn list_customers(
        &self,
        tenant: TenantId,
        query: &CustomerQuery,
    ) -> StoreResult<Vec<Customer>> {
        let mut select =
            customers::Entity::find().filter(customers::Column::TenantId.eq(tenant.0));
        if let Some(search) = &query.search {
            let pattern = contains_pattern(search);
            let mut text = Condition::any();
            for column in [
                customers::Column::Name,
                customers::Column::TradeName,
                customers::Column::Email,
                customers::Column::DocNumber,
            ] {
                text = text.add(Expr::expr(Func::lower(Expr::col(column))).like(pattern.as_str()));
            }
            select = select.filter(text);
        }
        if let Some(doc) = &query.doc_number {
            select = select.filter(customers::Column::DocNumber.eq(doc.as_str()));
        }
        if let Some(email) = &query.email {
            select = select.filter(customers::Column::Email.eq(email.as_str()));
        }
        if let Some(active) = query.active {
            select = select.filter(customers::Column::Active.eq(active));
        }
        select
            .order_by_desc(customers::Column::CreatedAt)
            .order_by_desc(customers::Column::Id)
            .limit(query.limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(customer_from_row)
            .collect()
    }

    async fn get_lead(&self, tenant: TenantId, id: LeadId) -> StoreResult<Option<Lead>> {
        leads::Entity::find_by_id(id.0)
            .filter(leads::Column::TenantId.eq(tenant.0))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(lead_from_row)
            .transpose()
    }

    async fn list_leads(
        &self,
        tenant: TenantId,
        stage: Option<LeadStage>,
        limit: u64,
    ) -> StoreResult<Vec<Lead>> {
        let mut select = leads::Entity::find().filter(leads::Column::TenantId.eq(tenant.0));
        if let Some(stage) = stage {
            select = select.filter(leads::Column::Stage.eq(stage.as_str()));
        }
        select
            .order_by_desc(leads::Column::CreatedAt)
            .order_by_desc(leads::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(lead_from_row)
            .collect()
    }
}
