//! Product catalog routes.

use arqon_core::catalog::{NewProduct, Product};
use arqon_core::pricing::PricingParameters;
use arqon_shared::types::{ListBounds, ListRequest, ListResponse, ProductId};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError, extractors::{ApiJson, ApiPath, ApiQuery, Tenant}};

/// Creates the product routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/{product_id}", get(get_product))
        .route("/products/{product_id}/pricing", put(update_pricing))
}

/// GET `/products` - List products ordered by name.
async fn list_products(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiQuery(query): ApiQuery<ListRequest>,
) -> Result<Json<ListResponse<Product>>, ApiError> {
    let limit = query.resolve(ListBounds::CATALOG);
    let products = state.catalog.list_products(tenant, limit).await?;
    Ok(Json(ListResponse::new(products, limit)))
}

/// POST `/products` - Create a product. A duplicate SKU is a 409.
async fn create_product(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiJson(input): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state.catalog.create_product(tenant, input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET `/products/{product_id}`.
async fn get_product(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiPath(product_id): ApiPath<Uuid>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .catalog
        .get_product(tenant, ProductId::from_uuid(product_id))
        .await?;
    Ok(Json(product))
}

/// PUT `/products/{product_id}/pricing` - Derive a price and store it on the
/// product together with its parameters.
async fn update_pricing(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiPath(product_id): ApiPath<Uuid>,
    ApiJson(params): ApiJson<PricingParameters>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .catalog
        .update_pricing(tenant, ProductId::from_uuid(product_id), params)
        .await?;
    Ok(Json(product))
}
