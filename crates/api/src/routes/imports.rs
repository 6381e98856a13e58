//! Bulk import routes.

use arqon_core::catalog::{ImportReport, PriceListImport, ProductImport};
use arqon_core::customer::CustomerImport;
use axum::{Json, Router, extract::State, routing::post};

use crate::{AppState, error::ApiError, extractors::{ApiJson, Tenant}};

/// Creates the import routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/import/products", post(import_products))
        .route("/import/price-lists", post(import_price_list))
        .route("/import/customers", post(import_customers))
}

/// POST `/import/products` - Import product rows in atomic chunks.
async fn import_products(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiJson(request): ApiJson<ProductImport>,
) -> Result<Json<ImportReport>, ApiError> {
    Ok(Json(state.importer.import_products(tenant, &request).await?))
}

/// POST `/import/price-lists` - Derive and store a price list.
async fn import_price_list(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiJson(request): ApiJson<PriceListImport>,
) -> Result<Json<ImportReport>, ApiError> {
    Ok(Json(state.importer.import_price_list(tenant, &request).await?))
}

/// POST `/import/customers` - Import customer rows in atomic chunks.
async fn import_customers(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiJson(request): ApiJson<CustomerImport>,
) -> Result<Json<ImportReport>, ApiError> {
    Ok(Json(state.customer_importer.import_customers(tenant, &request).await?))
}

#[cfg(test)]
mod tests {
    use arqon_core::catalog::product_id_for_sku;
    use arqon_core::store::DocumentStore;
    use arqon_shared::types::TenantId;
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::routes::test_support::{send, test_app};

    #[tokio::test]
    async fn test_import_products_then_base_prices() {
        let (app, store) = test_app();
        let tenant = TenantId::new();

        let (status, report) = send(
            &app,
            "POST",
            "/api/v1/import/products",
            Some(tenant),
            Some(json!({
                "upsert": true,
                "items": [
                    { "sku": "A-1", "name": "Hammer", "price": "1.234,50", "stock": "3" },
                    { "sku": "A-2", "name": "Pliers", "price": "80" },
                    { "sku": "A-3", "price": "10" }
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["total"], 3);
        assert_eq!(report["inserted"], 2);
        assert_eq!(report["skipped"][0]["index"], 2);

        let hammer = product_id_for_sku(tenant, "A-1");
        let stored = store.get_product(tenant, hammer).await.unwrap().unwrap();
        assert_eq!(stored.price, dec!(1234.50));

        let (status, report) = send(
            &app,
            "POST",
            "/api/v1/import/price-lists",
            Some(tenant),
            Some(json!({
                "list": { "code": "BASE" },
                "options": {
                    "markup_percent": "18",
                    "bonifications": "20+10",
                    "rounding_policy": "nearest10",
                    "update_base_products": true
                },
                "items": [
                    { "sku": "A-1", "cost": "1000" },
                    { "sku": "A-9" }
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["inserted"], 1);
        assert_eq!(report["products_updated"], 1);
        assert_eq!(report["skipped"].as_array().unwrap().len(), 1);

        let stored = store.get_product(tenant, hammer).await.unwrap().unwrap();
        assert_eq!(stored.price, dec!(850));
        assert_eq!(stored.stock, dec!(3));
    }

    #[tokio::test]
    async fn test_all_rows_invalid_is_400() {
        let (app, store) = test_app();
        let (status, error) = send(
            &app,
            "POST",
            "/api/v1/import/products",
            Some(TenantId::new()),
            Some(json!({ "items": [{ "name": "No price" }] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "NO_VALID_ROWS");
        assert_eq!(error["details"]["skipped"][0]["index"], 0);
        assert_eq!(store.document_count().await, 0);
    }

    #[tokio::test]
    async fn test_failed_chunk_reports_progress() {
        let (app, store) = test_app();
        // chunk size is 2 in tests: the second chunk fails on its first write
        store.fail_commit_at(1, 1).await;
        let items: Vec<_> = (0..4)
            .map(|i| json!({ "sku": format!("S-{i}"), "name": "Item", "price": "5" }))
            .collect();

        let (status, error) = send(
            &app,
            "POST",
            "/api/v1/import/products",
            Some(TenantId::new()),
            Some(json!({ "items": items })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error["error"], "IMPORT_PARTIALLY_COMMITTED");
        assert_eq!(error["details"]["chunks_committed"], 1);
        assert_eq!(error["details"]["rows_committed"], 2);
        assert_eq!(store.document_count().await, 2);
    }

    #[tokio::test]
    async fn test_missing_list_code_is_400() {
        let (app, _) = test_app();
        let (status, error) = send(
            &app,
            "POST",
            "/api/v1/import/price-lists",
            Some(TenantId::new()),
            Some(json!({ "list": { "code": " " }, "items": [{ "sku": "A", "cost": "1" }] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "MISSING_LIST_CODE");
    }

    #[tokio::test]
    async fn test_import_customers_then_upsert() {
        let (app, _) = test_app();
        let tenant = Some(TenantId::new());

        let (status, report) = send(
            &app,
            "POST",
            "/api/v1/import/customers",
            tenant,
            Some(json!({
                "items": [
                    { "doc_number": "30-1", "name": "ACME", "vat_condition": "ri", "active": "Sí" },
                    { "doc_number": "30-2", "name": "Beta", "bonif_percent": "5,5" },
                    { "name": "Gamma", "email": "broken" }
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["inserted"], 2);
        assert_eq!(report["skipped"][0]["index"], 2);

        let (_, report) = send(
            &app,
            "POST",
            "/api/v1/import/customers",
            tenant,
            Some(json!({
                "upsert": true,
                "items": [{ "doc_number": "30-1", "city": "Rosario", "active": "no" }]
            })),
        )
        .await;
        assert_eq!(report["updated"], 1);

        let (_, found) = send(&app, "GET", "/api/v1/customers?doc_number=30-1", tenant, None).await;
        let acme = &found["data"][0];
        assert_eq!(acme["city"], "Rosario");
        assert_eq!(acme["vat_condition"], "RI");
        assert_eq!(acme["active"], false);
    }
}
