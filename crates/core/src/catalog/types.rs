//! Catalog documents: products, price lists and price entries.

use arqon_shared::types::{PriceListId, ProductId, TenantId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::ProductPricing;

/// VAT applied to products created without an explicit rate.
pub const DEFAULT_VAT_PERCENT: Decimal = Decimal::from_parts(21, 0, 0, false, 0);

/// Code of the price list whose prices flow back into the product catalog.
pub const BASE_LIST_CODE: &str = "BASE";

/// Derives the product ID for a SKU. The same SKU always maps to the same ID
/// within a tenant.
#[must_use]
pub fn product_id_for_sku(tenant: TenantId, sku: &str) -> ProductId {
    ProductId::from_natural_key(tenant, &format!("sku:{sku}"))
}

/// Derives the price list ID for a list code.
#[must_use]
pub fn price_list_id_for_code(tenant: TenantId, code: &str) -> PriceListId {
    PriceListId::from_natural_key(tenant, &format!("price-list:{code}"))
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Stock keeping unit, unique within a tenant.
    pub sku: Option<String>,
    /// Display name.
    pub name: String,
    /// Selling price.
    pub price: Decimal,
    /// Supplier cost.
    pub cost: Option<Decimal>,
    /// VAT rate in percent.
    pub vat_percent: Decimal,
    /// Units on hand. May go negative when selling without stock.
    pub stock: Decimal,
    /// Unit of measure.
    pub unit: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// Free text notes.
    pub notes: String,
    /// Parameters and result of the last price derivation.
    pub pricing: Option<ProductPricing>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Builds a new product. SKU products get a deterministic ID.
    #[must_use]
    pub fn create(tenant_id: TenantId, input: NewProduct, now: DateTime<Utc>) -> Self {
        let sku = input.sku.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let id = sku
            .as_deref()
            .map_or_else(ProductId::new, |s| product_id_for_sku(tenant_id, s));
        Self {
            id,
            tenant_id,
            sku,
            name: input.name.trim().to_string(),
            price: input.price,
            cost: input.cost,
            vat_percent: input.vat_percent,
            stock: input.stock,
            unit: input.unit,
            category: input.category,
            notes: input.notes,
            pricing: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the descriptive fields and price. Stock changes only when
    /// `details.stock` is set. A new price drops the stored derivation, which
    /// no longer describes it.
    pub fn apply_details(&mut self, details: ProductDetails, now: DateTime<Utc>) {
        if details.price != self.price {
            self.pricing = None;
        }
        self.name = details.name;
        self.price = details.price;
        self.cost = details.cost;
        self.vat_percent = details.vat_percent;
        self.unit = details.unit;
        self.category = details.category;
        self.notes = details.notes;
        if let Some(stock) = details.stock {
            self.stock = stock;
        }
        self.updated_at = now;
    }

    /// Stores a derivation result; the selling price follows the derived price.
    pub fn apply_pricing(&mut self, pricing: ProductPricing, now: DateTime<Utc>) {
        self.price = pricing.derived.final_price;
        if let Some(net_cost) = pricing.derived.net_cost {
            self.cost = Some(net_cost);
        }
        self.pricing = Some(pricing);
        self.updated_at = now;
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    /// Stock keeping unit.
    #[serde(default)]
    pub sku: Option<String>,
    /// Display name, required.
    pub name: String,
    /// Selling price.
    pub price: Decimal,
    /// Supplier cost.
    #[serde(default)]
    pub cost: Option<Decimal>,
    /// VAT rate in percent.
    #[serde(default = "default_vat")]
    pub vat_percent: Decimal,
    /// Initial stock.
    #[serde(default)]
    pub stock: Decimal,
    /// Unit of measure.
    #[serde(default)]
    pub unit: Option<String>,
    /// Category.
    #[serde(default)]
    pub category: Option<String>,
    /// Free text notes.
    #[serde(default)]
    pub notes: String,
}

fn default_vat() -> Decimal {
    DEFAULT_VAT_PERCENT
}

/// Fields an import row overwrites on a product that already exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    /// Display name.
    pub name: String,
    /// Selling price.
    pub price: Decimal,
    /// Supplier cost.
    pub cost: Option<Decimal>,
    /// VAT rate in percent.
    pub vat_percent: Decimal,
    /// Unit of measure.
    pub unit: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// Free text notes.
    pub notes: String,
    /// New stock, or `None` to keep the stored quantity.
    pub stock: Option<Decimal>,
}

impl ProductDetails {
    /// Takes the overwritable fields of `input`, dropping its stock unless
    /// `with_stock` is set.
    #[must_use]
    pub fn from_input(input: NewProduct, with_stock: bool) -> Self {
        Self {
            name: input.name.trim().to_string(),
            price: input.price,
            cost: input.cost,
            vat_percent: input.vat_percent,
            unit: input.unit,
            category: input.category,
            notes: input.notes,
            stock: with_stock.then_some(input.stock),
        }
    }
}

/// A named set of prices, e.g. `BASE` or `WHOLESALE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceList {
    /// Price list ID, derived from the code.
    pub id: PriceListId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Short code, unique within a tenant.
    pub code: String,
    /// Display name.
    pub name: String,
    /// First day the prices apply.
    pub valid_from: Option<NaiveDate>,
    /// Whether the list is in use.
    pub active: bool,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Price of one SKU in one price list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    /// `<list_id>__<sku>`.
    pub id: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Price list.
    pub list_id: PriceListId,
    /// SKU the price applies to.
    pub sku: String,
    /// Cost read from the file, if any.
    pub cost: Option<Decimal>,
    /// Derived selling price.
    pub price: Decimal,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl PriceEntry {
    /// Document ID of the entry for `sku` in `list_id`.
    #[must_use]
    pub fn entry_id(list_id: PriceListId, sku: &str) -> String {
        format!("{list_id}__{sku}")
    }
}
