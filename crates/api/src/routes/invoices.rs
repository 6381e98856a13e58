//! Invoice routes.

use arqon_core::ledger::{Invoice, InvoiceDraft};
use arqon_shared::types::{InvoiceId, ListBounds, ListRequest, ListResponse};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError, extractors::{ApiJson, ApiPath, ApiQuery, Tenant}};

/// Creates the invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(issue_invoice))
        .route("/invoices/{invoice_id}", get(get_invoice))
}

/// POST `/invoices` - Issue an invoice with its cash or current-account
/// movement in one commit. Client-side amounts are ignored.
async fn issue_invoice(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiJson(draft): ApiJson<InvoiceDraft>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    let invoice = state.posting.issue_invoice(tenant, &draft).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// GET `/invoices` - Newest first.
async fn list_invoices(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiQuery(query): ApiQuery<ListRequest>,
) -> Result<Json<ListResponse<Invoice>>, ApiError> {
    let limit = query.resolve(ListBounds::INVOICES);
    let invoices = state.store.list_invoices(tenant, limit).await?;
    Ok(Json(ListResponse::new(invoices, limit)))
}

/// GET `/invoices/{invoice_id}`.
async fn get_invoice(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiPath(invoice_id): ApiPath<Uuid>,
) -> Result<Json<Invoice>, ApiError> {
    let id = InvoiceId::from_uuid(invoice_id);
    state.store.get_invoice(tenant, id).await?.map(Json).ok_or_else(|| {
        ApiError::new(
            StatusCode::NOT_FOUND,
            "INVOICE_NOT_FOUND",
            format!("Invoice not found: {id}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use arqon_core::store::{DocumentStore, TimeRange};
    use arqon_shared::types::{CustomerId, TenantId};
    use axum::Router;
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    use crate::routes::test_support::{decimal, seed_customer, send, test_app};

    fn draft(customer: &Value, term: &str) -> Value {
        json!({
            "customer_id": customer,
            "customer_name": "ACME",
            "payment_term": term,
            "lines": [
                { "description": "Drill", "quantity": "2", "unit_price": "100" },
                { "description": "Bits", "quantity": "1", "unit_price": "50", "bonif_percent": "10" }
            ]
        })
    }

    async fn customer_draft(app: &Router, tenant: TenantId, term: &str) -> Value {
        draft(&seed_customer(app, tenant).await, term)
    }

    #[tokio::test]
    async fn test_cash_invoice_posts_one_cash_movement() {
        let (app, store) = test_app();
        let tenant = TenantId::new();

        let body = customer_draft(&app, tenant, "cash").await;
        let (status, invoice) = send(&app, "POST", "/api/v1/invoices", Some(tenant), Some(body)).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(decimal(&invoice["total"]), dec!(245.00));
        let cash = store.cash_movements(tenant, TimeRange::default()).await.unwrap();
        assert_eq!(cash.len(), 1);
        assert_eq!(cash[0].amount, dec!(245.00));
    }

    #[tokio::test]
    async fn test_client_total_is_ignored() {
        let (app, _) = test_app();
        let tenant = TenantId::new();
        let mut body = customer_draft(&app, tenant, "open_account").await;
        body["total"] = json!("1");
        body["lines"][0]["amount"] = json!("1");

        let (_, invoice) = send(&app, "POST", "/api/v1/invoices", Some(tenant), Some(body)).await;

        assert_eq!(decimal(&invoice["total"]), dec!(245.00));
    }

    #[tokio::test]
    async fn test_empty_invoice_is_400() {
        let (app, store) = test_app();
        let mut body = draft(&json!(CustomerId::new()), "cash");
        body["lines"] = json!([]);

        let (status, error) = send(&app, "POST", "/api/v1/invoices", Some(TenantId::new()), Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "EMPTY_INVOICE");
        assert_eq!(store.document_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_customer_is_404() {
        let (app, store) = test_app();
        let body = draft(&json!(CustomerId::new()), "open_account");

        let (status, error) = send(&app, "POST", "/api/v1/invoices", Some(TenantId::new()), Some(body)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"], "CUSTOMER_NOT_FOUND");
        assert_eq!(store.document_count().await, 0);
    }

    #[tokio::test]
    async fn test_get_and_list_invoices() {
        let (app, _) = test_app();
        let id = TenantId::new();
        let tenant = Some(id);
        let body = customer_draft(&app, id, "cash").await;
        let (_, invoice) = send(&app, "POST", "/api/v1/invoices", tenant, Some(body)).await;
        let id = invoice["id"].as_str().unwrap();

        let (status, fetched) = send(&app, "GET", &format!("/api/v1/invoices/{id}"), tenant, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["id"], invoice["id"]);

        let (_, list) = send(&app, "GET", "/api/v1/invoices?limit=500", tenant, None).await;
        assert_eq!(list["data"].as_array().unwrap().len(), 1);
        assert_eq!(list["limit"], 100);

        let missing = uuid::Uuid::new_v4();
        let (status, error) =
            send(&app, "GET", &format!("/api/v1/invoices/{missing}"), tenant, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"], "INVOICE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_malformed_requests_get_json_errors() {
        let (app, _) = test_app();
        let tenant = Some(TenantId::new());

        let (status, error) =
            send(&app, "POST", "/api/v1/invoices", tenant, Some(json!({ "lines": [] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "INVALID_BODY");

        let (status, error) = send(&app, "GET", "/api/v1/invoices/not-a-uuid", tenant, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "INVALID_PATH");

        let (status, error) = send(&app, "GET", "/api/v1/invoices?limit=ten", tenant, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "INVALID_QUERY");
    }
}
