//! Catalog service: product CRUD and stored price derivation.

use std::sync::Arc;

use arqon_shared::types::{ProductId, TenantId};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use super::error::CatalogError;
use super::types::{NewProduct, Product};
use crate::pricing::{PriceDerivationEngine, PricingParameters, ProductPricing};
use crate::store::{DocumentStore, Write, WriteBatch};

/// Manages catalog products through a [`DocumentStore`].
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn DocumentStore>,
}

impl CatalogService {
    /// Creates a catalog service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Creates a product. A product with a SKU gets an ID derived from it, so
    /// creating the same SKU twice fails with `AlreadyExists`.
    ///
    /// # Errors
    ///
    /// Returns `MissingName`, `NegativeAmount` or a store failure.
    #[instrument(skip_all, fields(tenant_id = %tenant))]
    pub async fn create_product(
        &self,
        tenant: TenantId,
        input: NewProduct,
    ) -> Result<Product, CatalogError> {
        if input.name.trim().is_empty() {
            return Err(CatalogError::MissingName);
        }
        for amount in std::iter::once(input.price).chain(input.cost) {
            if amount < Decimal::ZERO {
                return Err(CatalogError::NegativeAmount(amount));
            }
        }

        let product = Product::create(tenant, input, Utc::now());
        let mut batch = WriteBatch::new(tenant);
        batch.push(Write::InsertProduct(product.clone()));
        self.store.commit(batch).await?;

        info!(product_id = %product.id, sku = ?product.sku, "product created");
        Ok(product)
    }

    /// Gets a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist for the tenant.
    pub async fn get_product(
        &self,
        tenant: TenantId,
        id: ProductId,
    ) -> Result<Product, CatalogError> {
        self.store
            .get_product(tenant, id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Lists products ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a store failure.
    pub async fn list_products(
        &self,
        tenant: TenantId,
        limit: u64,
    ) -> Result<Vec<Product>, CatalogError> {
        Ok(self.store.list_products(tenant, limit).await?)
    }

    /// Derives a price from `parameters` and stores both on the product. The
    /// product's selling price becomes the derived final price; stock and
    /// descriptive fields are left as they are in the store.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, a `Derivation` error or a store failure. On error
    /// the product is unchanged.
    #[instrument(skip_all, fields(tenant_id = %tenant, product_id = %id))]
    pub async fn update_pricing(
        &self,
        tenant: TenantId,
        id: ProductId,
        parameters: PricingParameters,
    ) -> Result<Product, CatalogError> {
        self.get_product(tenant, id).await?;
        let derived = PriceDerivationEngine::derive(&parameters)?;

        let mut batch = WriteBatch::new(tenant);
        batch.push(Write::SetProductPricing {
            product_id: id,
            pricing: ProductPricing { parameters, derived },
        });
        self.store.commit(batch).await?;

        // Re-read: other fields may have moved since the first read.
        let product = self.get_product(tenant, id).await?;
        info!(price = %product.price, "product pricing updated");
        Ok(product)
    }
}
