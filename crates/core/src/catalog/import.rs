//! Bulk catalog imports: products and price lists.
//!
//! Rows are validated up front and written in chunks of `chunk_size` rows.
//! Each chunk is one atomic commit; the import as a whole is not. Document
//! IDs come from natural keys (SKU, list code), so re-running an import after
//! a partial failure converges to the same state instead of duplicating rows.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arqon_shared::ImportConfig;
use arqon_shared::types::{ProductId, TenantId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use super::error::{ImportError, SkippedRow};
use super::types::{
    BASE_LIST_CODE, DEFAULT_VAT_PERCENT, NewProduct, PriceEntry, PriceList, Product,
    ProductDetails, price_list_id_for_code,
};
use crate::ledger::retry::RetryPolicy;
use crate::pricing::{
    BonificationChain, PriceDerivationEngine, PricingParameters, ProductPricing, RoundingPolicy,
    SourceAmount,
};
use crate::store::{DocumentStore, Write, WriteBatch};

/// One product row. Numeric cells may be numbers or raw text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductRow {
    /// Stock keeping unit.
    #[serde(default)]
    pub sku: Option<String>,
    /// Display name, required.
    #[serde(default)]
    pub name: Option<String>,
    /// Selling price, required and not negative.
    #[serde(default)]
    pub price: Option<SourceAmount>,
    /// Supplier cost.
    #[serde(default)]
    pub cost: Option<SourceAmount>,
    /// VAT rate in percent, 21 when missing.
    #[serde(default)]
    pub vat: Option<SourceAmount>,
    /// Unit of measure.
    #[serde(default)]
    pub unit: Option<String>,
    /// Category.
    #[serde(default)]
    pub category: Option<String>,
    /// Stock on hand, 0 when missing.
    #[serde(default)]
    pub stock: Option<SourceAmount>,
    /// Free text notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Product import request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductImport {
    /// Update products whose SKU already exists instead of skipping them.
    #[serde(default)]
    pub upsert: bool,
    /// Rows to import.
    #[serde(default)]
    pub items: Vec<ProductRow>,
}

/// Price list header of an import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceListHeader {
    /// List code, required. `BASE` is the catalog's own list.
    pub code: String,
    /// Display name. Defaults to the stored name, then the code.
    #[serde(default)]
    pub name: Option<String>,
    /// First day the prices apply.
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,
    /// Whether the list is in use. Defaults to the stored flag, then true.
    #[serde(default)]
    pub active: Option<bool>,
}

/// How file rows become prices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceListOptions {
    /// Take the file's price column as the final price when present.
    #[serde(default)]
    pub use_file_price: bool,
    /// Markup over cost, in percent.
    #[serde(default)]
    pub markup_percent: Decimal,
    /// Supplier bonifications applied to every cost.
    #[serde(default)]
    pub bonifications: BonificationChain,
    /// Rounding of prices derived from cost.
    #[serde(default)]
    pub rounding_policy: RoundingPolicy,
    /// When importing the `BASE` list, also update matching products.
    #[serde(default)]
    pub update_base_products: bool,
}

/// One price row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceRow {
    /// SKU, required.
    #[serde(default)]
    pub sku: Option<String>,
    /// Supplier cost.
    #[serde(default)]
    pub cost: Option<SourceAmount>,
    /// Final price from the file.
    #[serde(default)]
    pub price: Option<SourceAmount>,
}

/// Price list import request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceListImport {
    /// Target list, created when missing.
    pub list: PriceListHeader,
    /// Derivation options.
    #[serde(default)]
    pub options: PriceListOptions,
    /// Rows to import.
    #[serde(default)]
    pub items: Vec<PriceRow>,
}

/// Outcome of a completed import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Rows in the request.
    pub total: usize,
    /// New documents written.
    pub inserted: usize,
    /// Existing documents overwritten.
    pub updated: usize,
    /// Base products repriced by a `BASE` price list import.
    pub products_updated: usize,
    /// Chunks committed.
    pub chunks_committed: usize,
    /// Rows that were not imported.
    pub skipped: Vec<SkippedRow>,
}

/// The writes produced by one accepted row.
pub(crate) struct RowWrites {
    pub(crate) writes: Vec<Write>,
}

/// Runs catalog imports against a [`DocumentStore`].
#[derive(Clone)]
pub struct CatalogImporter {
    store: Arc<dyn DocumentStore>,
    retry: RetryPolicy,
    chunk_size: usize,
}

impl CatalogImporter {
    /// Creates an importer. A zero chunk size is treated as one.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, retry: RetryPolicy, config: &ImportConfig) -> Self {
        Self {
            store,
            retry,
            chunk_size: config.chunk_size.max(1),
        }
    }

    /// Imports product rows.
    ///
    /// Rows without a name or with a missing, unparseable or negative price
    /// are skipped and reported. A row whose SKU already exists (in the store
    /// or earlier in the same request) updates that product when `upsert` is
    /// set and is skipped otherwise.
    ///
    /// # Errors
    ///
    /// Returns `NoValidRows`, a `Store` error from the initial lookup, or
    /// `ChunkFailed` with the progress made so far.
    #[instrument(skip_all, fields(tenant_id = %tenant, rows = request.items.len(), upsert = request.upsert))]
    pub async fn import_products(
        &self,
        tenant: TenantId,
        request: &ProductImport,
    ) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport {
            total: request.items.len(),
            ..ImportReport::default()
        };

        let mut accepted = Vec::new();
        for (index, row) in request.items.iter().enumerate() {
            match normalize_product_row(row) {
                Ok(product) => accepted.push((index, product)),
                Err(reason) => report.skipped.push(SkippedRow::new(index, reason)),
            }
        }
        if accepted.is_empty() {
            return Err(ImportError::NoValidRows {
                skipped: report.skipped,
            });
        }

        let skus: Vec<String> = accepted
            .iter()
            .filter_map(|(_, p)| p.sku.as_deref().map(str::trim))
            .filter(|sku| !sku.is_empty())
            .map(str::to_string)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let mut existing: HashMap<String, ProductId> = self
            .store
            .find_products_by_sku(tenant, &skus)
            .await?
            .into_iter()
            .filter_map(|p| p.sku.map(|sku| (sku, p.id)))
            .collect();

        let now = Utc::now();
        let mut rows = Vec::with_capacity(accepted.len());
        for (index, input) in accepted {
            let fresh = Product::create(tenant, input.clone(), now);
            let Some(sku) = fresh.sku.clone() else {
                report.inserted += 1;
                rows.push(RowWrites {
                    writes: vec![Write::InsertProduct(fresh)],
                });
                continue;
            };

            match existing.get(&sku) {
                Some(&product_id) if request.upsert => {
                    let with_stock = request.items[index].stock.is_some();
                    report.updated += 1;
                    rows.push(RowWrites {
                        writes: vec![Write::UpdateProductDetails {
                            product_id,
                            details: ProductDetails::from_input(input, with_stock),
                        }],
                    });
                }
                Some(_) => report
                    .skipped
                    .push(SkippedRow::new(index, format!("SKU {sku} already exists"))),
                None => {
                    existing.insert(sku, fresh.id);
                    report.inserted += 1;
                    rows.push(RowWrites {
                        writes: vec![Write::InsertProduct(fresh)],
                    });
                }
            }
        }

        commit_chunks(
            self.store.as_ref(),
            self.retry,
            tenant,
            self.chunk_size,
            rows,
            &mut report,
        )
        .await?;
        info!(
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped.len(),
            "product import finished"
        );
        Ok(report)
    }

    /// Imports a price list.
    ///
    /// Each row becomes [`PricingParameters`]: the file price when
    /// `use_file_price` is set and the row has one, otherwise the cost with
    /// the configured bonifications, markup and rounding. Rows are derived in
    /// parallel; rows without a SKU, without any amount, or whose derivation
    /// fails are skipped and reported.
    ///
    /// # Errors
    ///
    /// Returns `MissingListCode`, `NoValidRows`, a `Store` error from the
    /// initial lookups, or `ChunkFailed` with the progress made so far.
    #[instrument(skip_all, fields(tenant_id = %tenant, code = %request.list.code, rows = request.items.len()))]
    pub async fn import_price_list(
        &self,
        tenant: TenantId,
        request: &PriceListImport,
    ) -> Result<ImportReport, ImportError> {
        let code = request.list.code.trim();
        if code.is_empty() {
            return Err(ImportError::MissingListCode);
        }
        let mut report = ImportReport {
            total: request.items.len(),
            ..ImportReport::default()
        };

        let mut candidates = Vec::new();
        for (index, row) in request.items.iter().enumerate() {
            match price_parameters(row, &request.options) {
                Ok((sku, params)) => candidates.push((index, sku, row, params)),
                Err(reason) => report.skipped.push(SkippedRow::new(index, reason)),
            }
        }

        let params: Vec<PricingParameters> =
            candidates.iter().map(|(_, _, _, p)| p.clone()).collect();
        let derived = PriceDerivationEngine::derive_all(&params);

        let mut priced = Vec::new();
        for ((index, sku, row, params), result) in candidates.into_iter().zip(derived) {
            match result {
                Ok(derived) => priced.push((sku, row, ProductPricing { parameters: params, derived })),
                Err(err) => report.skipped.push(SkippedRow::new(index, err.to_string())),
            }
        }
        report.skipped.sort_by_key(|row| row.index);
        if priced.is_empty() {
            return Err(ImportError::NoValidRows {
                skipped: report.skipped,
            });
        }

        let now = Utc::now();
        let list = self.resolve_list(tenant, code, &request.list, now).await?;
        let known: HashSet<String> = self
            .store
            .list_price_entries(tenant, list.id)
            .await?
            .into_iter()
            .map(|entry| entry.id)
            .collect();

        let update_products =
            list.code.eq_ignore_ascii_case(BASE_LIST_CODE) && request.options.update_base_products;
        let products: HashMap<String, ProductId> = if update_products {
            let skus: Vec<String> = priced.iter().map(|(sku, _, _)| sku.clone()).collect();
            self.store
                .find_products_by_sku(tenant, &skus)
                .await?
                .into_iter()
                .filter_map(|p| p.sku.map(|sku| (sku, p.id)))
                .collect()
        } else {
            HashMap::new()
        };

        let mut rows = Vec::with_capacity(priced.len());
        for (sku, row, pricing) in priced {
            let entry = PriceEntry {
                id: PriceEntry::entry_id(list.id, &sku),
                tenant_id: tenant,
                list_id: list.id,
                sku: sku.clone(),
                cost: row.cost.as_ref().and_then(|c| c.resolve().ok()),
                price: pricing.derived.final_price,
                updated_at: now,
            };
            if known.contains(&entry.id) {
                report.updated += 1;
            } else {
                report.inserted += 1;
            }

            let mut writes = vec![Write::UpsertPriceEntry(entry)];
            if let Some(&product_id) = products.get(&sku) {
                writes.push(Write::SetProductPricing {
                    product_id,
                    pricing,
                });
                report.products_updated += 1;
            }
            rows.push(RowWrites { writes });
        }
        // The list header travels with the first chunk.
        if let Some(first) = rows.first_mut() {
            first.writes.insert(0, Write::UpsertPriceList(list.clone()));
        }

        commit_chunks(
            self.store.as_ref(),
            self.retry,
            tenant,
            self.chunk_size,
            rows,
            &mut report,
        )
        .await?;
        info!(
            list_id = %list.id,
            inserted = report.inserted,
            updated = report.updated,
            products_updated = report.products_updated,
            skipped = report.skipped.len(),
            "price list import finished"
        );
        Ok(report)
    }

    async fn resolve_list(
        &self,
        tenant: TenantId,
        code: &str,
        header: &PriceListHeader,
        now: DateTime<Utc>,
    ) -> Result<PriceList, ImportError> {
        let stored = self.store.get_price_list_by_code(tenant, code).await?;
        let name = header
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| stored.as_ref().map(|l| l.name.clone()))
            .unwrap_or_else(|| code.to_string());
        Ok(PriceList {
            id: stored
                .as_ref()
                .map_or_else(|| price_list_id_for_code(tenant, code), |l| l.id),
            tenant_id: tenant,
            code: code.to_string(),
            name,
            valid_from: header
                .valid_from
                .or_else(|| stored.as_ref().and_then(|l| l.valid_from)),
            active: header
                .active
                .or_else(|| stored.as_ref().map(|l| l.active))
                .unwrap_or(true),
            updated_at: now,
        })
    }
}

/// Commits `rows` in chunks of `chunk_size` rows, one atomic batch per chunk.
/// A row's writes never straddle two chunks.
pub(crate) async fn commit_chunks(
    store: &dyn DocumentStore,
    retry: RetryPolicy,
    tenant: TenantId,
    chunk_size: usize,
    rows: Vec<RowWrites>,
    report: &mut ImportReport,
) -> Result<(), ImportError> {
    let mut rows_committed = 0;
    for (chunk, rows) in rows.chunks(chunk_size.max(1)).enumerate() {
        let mut batch = WriteBatch::new(tenant);
        for write in rows.iter().flat_map(|row| row.writes.iter()) {
            batch.push(write.clone());
        }

        let result = retry
            .run("import_chunk", move || {
                let batch = batch.clone();
                async move { store.commit(batch).await }
            })
            .await;
        if let Err(source) = result {
            error!(chunk, rows_committed, error = %source, "import chunk failed");
            return Err(ImportError::ChunkFailed {
                chunk,
                chunks_committed: report.chunks_committed,
                rows_committed,
                source,
            });
        }
        report.chunks_committed += 1;
        rows_committed += rows.len();
    }
    Ok(())
}

fn clean(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn cell(value: Option<&SourceAmount>, field: &str) -> Result<Option<Decimal>, String> {
    value
        .map(|v| v.resolve().map_err(|e| format!("{field}: {e}")))
        .transpose()
}

fn normalize_product_row(row: &ProductRow) -> Result<NewProduct, String> {
    let name = clean(row.name.as_deref()).ok_or("name is required")?;
    let price = cell(row.price.as_ref(), "price")?.ok_or("price is required")?;
    if price < Decimal::ZERO {
        return Err(format!("price must not be negative, got {price}"));
    }
    let cost = cell(row.cost.as_ref(), "cost")?;
    if let Some(cost) = cost.filter(|c| *c < Decimal::ZERO) {
        return Err(format!("cost must not be negative, got {cost}"));
    }

    Ok(NewProduct {
        sku: clean(row.sku.as_deref()),
        name,
        price,
        cost,
        vat_percent: cell(row.vat.as_ref(), "vat")?.unwrap_or(DEFAULT_VAT_PERCENT),
        stock: cell(row.stock.as_ref(), "stock")?.unwrap_or_default(),
        unit: clean(row.unit.as_deref()),
        category: clean(row.category.as_deref()),
        notes: row.notes.clone().unwrap_or_default(),
    })
}

fn price_parameters(
    row: &PriceRow,
    options: &PriceListOptions,
) -> Result<(String, PricingParameters), String> {
    let sku = clean(row.sku.as_deref()).ok_or("sku is required")?;
    let params = match (&row.price, &row.cost) {
        (Some(price), _) if options.use_file_price => PricingParameters::FinalPrice {
            source_amount: price.clone(),
            rounding_policy: RoundingPolicy::None,
        },
        (_, Some(cost)) => PricingParameters::Cost {
            source_amount: cost.clone(),
            bonifications: options.bonifications.clone(),
            markup_percent: options.markup_percent,
            rounding_policy: options.rounding_policy,
        },
        _ => return Err("row has no cost or usable price".to_string()),
    };
    Ok((sku, params))
}
