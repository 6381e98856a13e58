//! Mapping between domain documents and table rows.
//!
//! Enums are stored as their serde names and nested values (invoice lines,
//! pricing) as JSONB, so the wire format and the stored format never drift.

use arqon_core::catalog::{PriceEntry, PriceList, Product};
use arqon_core::customer::{Customer, Lead};
use arqon_core::ledger::{CashMovement, CurrentAccountMovement, Invoice, Receipt};
use arqon_core::quote::Quote;
use arqon_core::store::{StoreError, StoreResult};
use arqon_shared::types::{
    CustomerId, InvoiceId, LeadId, MovementId, PriceListId, ProductId, QuoteId, ReceiptId,
    TenantId,
};
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::{DateTimeWithTimeZone, Json};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::entities::{
    cash_movements, current_account_movements, customers, invoices, leads, price_lists, prices,
    products, quotes, receipts,
};

fn corrupt(err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("corrupt document: {err}"))
}

pub(crate) fn to_text<T: Serialize>(value: &T) -> StoreResult<String> {
    match serde_json::to_value(value).map_err(corrupt)? {
        Value::String(text) => Ok(text),
        other => Err(corrupt(format!("expected a string tag, got {other}"))),
    }
}

fn from_text<T: DeserializeOwned>(text: &str) -> StoreResult<T> {
    serde_json::from_value(Value::String(text.to_string())).map_err(corrupt)
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> StoreResult<Json> {
    serde_json::to_value(value).map_err(corrupt)
}

fn from_json<T: DeserializeOwned>(value: Json) -> StoreResult<T> {
    serde_json::from_value(value).map_err(corrupt)
}

pub(crate) fn ts(at: DateTime<Utc>) -> DateTimeWithTimeZone {
    at.fixed_offset()
}

fn utc(at: DateTimeWithTimeZone) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

// ========== Catalog ==========

pub(crate) fn product_row(product: &Product) -> StoreResult<products::ActiveModel> {
    Ok(products::ActiveModel {
        id: Set(product.id.0),
        tenant_id: Set(product.tenant_id.0),
        sku: Set(product.sku.clone()),
        name: Set(product.name.clone()),
        price: Set(product.price),
        cost: Set(product.cost),
        vat_percent: Set(product.vat_percent),
        stock: Set(product.stock),
        unit: Set(product.unit.clone()),
        category: Set(product.category.clone()),
        notes: Set(product.notes.clone()),
        pricing: Set(product.pricing.as_ref().map(to_json).transpose()?),
        created_at: Set(ts(product.created_at)),
        updated_at: Set(ts(product.updated_at)),
    })
}

pub(crate) fn product_from_row(row: products::Model) -> StoreResult<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        sku: row.sku,
        name: row.name,
        price: row.price,
        cost: row.cost,
        vat_percent: row.vat_percent,
        stock: row.stock,
        unit: row.unit,
        category: row.category,
        notes: row.notes,
        pricing: row.pricing.map(from_json).transpose()?,
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
    })
}

pub(crate) fn price_list_row(list: &PriceList) -> price_lists::ActiveModel {
    price_lists::ActiveModel {
        id: Set(list.id.0),
        tenant_id: Set(list.tenant_id.0),
        code: Set(list.code.clone()),
        name: Set(list.name.clone()),
        valid_from: Set(list.valid_from),
        active: Set(list.active),
        updated_at: Set(ts(list.updated_at)),
    }
}

pub(crate) fn price_list_from_row(row: price_lists::Model) -> PriceList {
    PriceList {
        id: PriceListId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        code: row.code,
        name: row.name,
        valid_from: row.valid_from,
        active: row.active,
        updated_at: utc(row.updated_at),
    }
}

pub(crate) fn price_entry_row(entry: &PriceEntry) -> prices::ActiveModel {
    prices::ActiveModel {
        id: Set(entry.id.clone()),
        tenant_id: Set(entry.tenant_id.0),
        list_id: Set(entry.list_id.0),
        sku: Set(entry.sku.clone()),
        cost: Set(entry.cost),
        price: Set(entry.price),
        updated_at: Set(ts(entry.updated_at)),
    }
}

pub(crate) fn price_entry_from_row(row: prices::Model) -> PriceEntry {
    PriceEntry {
        id: row.id,
        tenant_id: TenantId::from_uuid(row.tenant_id),
        list_id: PriceListId::from_uuid(row.list_id),
        sku: row.sku,
        cost: row.cost,
        price: row.price,
        updated_at: utc(row.updated_at),
    }
}

// ========== Ledger ==========

pub(crate) fn invoice_row(invoice: &Invoice) -> StoreResult<invoices::ActiveModel> {
    Ok(invoices::ActiveModel {
        id: Set(invoice.id.0),
        tenant_id: Set(invoice.tenant_id.0),
        customer_id: Set(invoice.customer_id.0),
        customer_name: Set(invoice.customer_name.clone()),
        lines: Set(to_json(&invoice.lines)?),
        payment_term: Set(to_text(&invoice.payment_term)?),
        subtotal: Set(invoice.subtotal),
        total: Set(invoice.total),
        status: Set(to_text(&invoice.status)?),
        notes: Set(invoice.notes.clone()),
        quote_id: Set(invoice.quote_id.map(|id| id.0)),
        created_at: Set(ts(invoice.created_at)),
    })
}

pub(crate) fn invoice_from_row(row: invoices::Model) -> StoreResult<Invoice> {
    Ok(Invoice {
        id: InvoiceId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        customer_id: CustomerId::from_uuid(row.customer_id),
        customer_name: row.customer_name,
        lines: from_json(row.lines)?,
        payment_term: from_text(&row.payment_term)?,
        subtotal: row.subtotal,
        total: row.total,
        status: from_text(&row.status)?,
        notes: row.notes,
        quote_id: row.quote_id.map(QuoteId::from_uuid),
        created_at: utc(row.created_at),
    })
}

pub(crate) fn cash_row(movement: &CashMovement) -> StoreResult<cash_movements::ActiveModel> {
    Ok(cash_movements::ActiveModel {
        id: Set(movement.id.0),
        tenant_id: Set(movement.tenant_id.0),
        created_at: Set(ts(movement.created_at)),
        direction: Set(to_text(&movement.direction)?),
        amount: Set(movement.amount),
        method: Set(movement.method.clone()),
        origin: Set(to_text(&movement.origin)?),
        invoice_id: Set(movement.invoice_id.map(|id| id.0)),
        receipt_id: Set(movement.receipt_id.map(|id| id.0)),
        description: Set(movement.description.clone()),
    })
}

pub(crate) fn cash_from_row(row: cash_movements::Model) -> StoreResult<CashMovement> {
    Ok(CashMovement {
        id: MovementId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        created_at: utc(row.created_at),
        direction: from_text(&row.direction)?,
        amount: row.amount,
        method: row.method,
        origin: from_text(&row.origin)?,
        invoice_id: row.invoice_id.map(InvoiceId::from_uuid),
        receipt_id: row.receipt_id.map(ReceiptId::from_uuid),
        description: row.description,
    })
}

pub(crate) fn account_row(
    movement: &CurrentAccountMovement,
) -> StoreResult<current_account_movements::ActiveModel> {
    Ok(current_account_movements::ActiveModel {
        id: Set(movement.id.0),
        tenant_id: Set(movement.tenant_id.0),
        created_at: Set(ts(movement.created_at)),
        customer_id: Set(movement.customer_id.0),
        customer_name: Set(movement.customer_name.clone()),
        direction: Set(to_text(&movement.direction)?),
        amount: Set(movement.amount),
        invoice_id: Set(movement.invoice_id.map(|id| id.0)),
        receipt_id: Set(movement.receipt_id.map(|id| id.0)),
        description: Set(movement.description.clone()),
    })
}

pub(crate) fn account_from_row(
    row: current_account_movements::Model,
) -> StoreResult<CurrentAccountMovement> {
    Ok(CurrentAccountMovement {
        id: MovementId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        created_at: utc(row.created_at),
        customer_id: CustomerId::from_uuid(row.customer_id),
        customer_name: row.customer_name,
        direction: from_text(&row.direction)?,
        amount: row.amount,
        invoice_id: row.invoice_id.map(InvoiceId::from_uuid),
        receipt_id: row.receipt_id.map(ReceiptId::from_uuid),
        description: row.description,
    })
}

pub(crate) fn receipt_row(receipt: &Receipt) -> receipts::ActiveModel {
    receipts::ActiveModel {
        id: Set(receipt.id.0),
        tenant_id: Set(receipt.tenant_id.0),
        created_at: Set(ts(receipt.created_at)),
        customer_id: Set(receipt.customer_id.0),
        customer_name: Set(receipt.customer_name.clone()),
        amount: Set(receipt.amount),
        method: Set(receipt.method.clone()),
        description: Set(receipt.description.clone()),
        invoice_id: Set(receipt.invoice_id.map(|id| id.0)),
    }
}

pub(crate) fn receipt_from_row(row: receipts::Model) -> Receipt {
    Receipt {
        id: ReceiptId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        created_at: utc(row.created_at),
        customer_id: CustomerId::from_uuid(row.customer_id),
        customer_name: row.customer_name,
        amount: row.amount,
        method: row.method,
        description: row.description,
        invoice_id: row.invoice_id.map(InvoiceId::from_uuid),
    }
}

// ========== Quotes ==========

pub(crate) fn quote_row(quote: &Quote) -> StoreResult<quotes::ActiveModel> {
    Ok(quotes::ActiveModel {
        id: Set(quote.id.0),
        tenant_id: Set(quote.tenant_id.0),
        customer_id: Set(quote.customer_id.0),
        customer_name: Set(quote.customer_name.clone()),
        lines: Set(to_json(&quote.lines)?),
        total: Set(quote.total),
        status: Set(quote.status.as_str().to_string()),
        invoice_id: Set(quote.invoice_id.map(|id| id.0)),
        notes: Set(quote.notes.clone()),
        created_at: Set(ts(quote.created_at)),
        updated_at: Set(ts(quote.updated_at)),
    })
}

pub(crate) fn quote_from_row(row: quotes::Model) -> StoreResult<Quote> {
    Ok(Quote {
        id: QuoteId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        customer_id: CustomerId::from_uuid(row.customer_id),
        customer_name: row.customer_name,
        lines: from_json(row.lines)?,
        total: row.total,
        status: from_text(&row.status)?,
        invoice_id: row.invoice_id.map(InvoiceId::from_uuid),
        notes: row.notes,
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
    })
}

// ========== Customers ==========

pub(crate) fn customer_row(customer: &Customer) -> StoreResult<customers::ActiveModel> {
    Ok(customers::ActiveModel {
        id: Set(customer.id.0),
        tenant_id: Set(customer.tenant_id.0),
        doc_number: Set(customer.doc_number.clone()),
        name: Set(customer.name.clone()),
        trade_name: Set(customer.trade_name.clone()),
        email: Set(customer.email.clone()),
        phone: Set(customer.phone.clone()),
        address: Set(customer.address.clone()),
        city: Set(customer.city.clone()),
        province: Set(customer.province.clone()),
        vat_condition: Set(customer.vat_condition.as_ref().map(to_text).transpose()?),
        bonif_percent: Set(customer.bonif_percent),
        notes: Set(customer.notes.clone()),
        active: Set(customer.active),
        created_at: Set(ts(customer.created_at)),
        updated_at: Set(ts(customer.updated_at)),
    })
}

pub(crate) fn customer_from_row(row: customers::Model) -> StoreResult<Customer> {
    Ok(Customer {
        id: CustomerId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        doc_number: row.doc_number,
        name: row.name,
        trade_name: row.trade_name,
        email: row.email,
        phone: row.phone,
        address: row.address,
        city: row.city,
        province: row.province,
        vat_condition: row.vat_condition.as_deref().map(from_text).transpose()?,
        bonif_percent: row.bonif_percent,
        notes: row.notes,
        active: row.active,
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
    })
}

pub(crate) fn lead_row(lead: &Lead) -> leads::ActiveModel {
    leads::ActiveModel {
        id: Set(lead.id.0),
        tenant_id: Set(lead.tenant_id.0),
        name: Set(lead.name.clone()),
        company: Set(lead.company.clone()),
        email: Set(lead.email.clone()),
        phone: Set(lead.phone.clone()),
        notes: Set(lead.notes.clone()),
        stage: Set(lead.stage.as_str().to_string()),
        created_at: Set(ts(lead.created_at)),
        updated_at: Set(ts(lead.updated_at)),
    }
}

pub(crate) fn lead_from_row(row: leads::Model) -> StoreResult<Lead> {
    Ok(Lead {
        id: LeadId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        name: row.name,
        company: row.company,
        email: row.email,
        phone: row.phone,
        notes: row.notes,
        stage: from_text(&row.stage)?,
        created_at: utc(row.created_at),
        updated_at: utc(row.updated_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arqon_core::ledger::{AccountDirection, CashDirection, CashOrigin, PaymentTerm};
    use arqon_core::customer::{LeadStage, VatCondition};
    use arqon_core::quote::QuoteStatus;
    use sea_orm::ActiveValue;

    #[test]
    fn test_enum_tags_match_wire_names() {
        assert_eq!(to_text(&PaymentTerm::OpenAccount).unwrap(), "open_account");
        assert_eq!(to_text(&CashOrigin::Receipt).unwrap(), "receipt");
        assert_eq!(from_text::<CashDirection>("expense").unwrap(), CashDirection::Expense);
        assert_eq!(from_text::<AccountDirection>("debit").unwrap(), AccountDirection::Debit);
        assert_eq!(from_text::<QuoteStatus>("invoiced").unwrap(), QuoteStatus::Invoiced);
        assert_eq!(to_text(&VatCondition::NotResponsible).unwrap(), "No Responsable");
        assert_eq!(from_text::<LeadStage>("won").unwrap(), LeadStage::Won);
    }

    #[test]
    fn test_unknown_tag_is_reported_as_corrupt() {
        let err = from_text::<CashDirection>("sideways").unwrap_err();
        assert!(matches!(err, StoreError::Backend(msg) if msg.starts_with("corrupt document")));
    }

    #[test]
    fn test_timestamps_keep_the_instant() {
        let now = Utc::now();
        assert_eq!(utc(ts(now)), now);
    }

    #[test]
    fn test_quote_status_column_uses_wire_name() {
        let quote = Quote {
            id: QuoteId::new(),
            tenant_id: TenantId::new(),
            customer_id: CustomerId::new(),
            customer_name: "ACME".into(),
            lines: Vec::new(),
            total: rust_decimal::Decimal::ZERO,
            status: QuoteStatus::Approved,
            invoice_id: None,
            notes: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let row = quote_row(&quote).unwrap();
        assert_eq!(row.status, ActiveValue::Set("approved".to_string()));
    }
}
