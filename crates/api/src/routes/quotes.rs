//! Quote routes: lifecycle and conversion into an invoice.

use arqon_core::quote::{ConvertRequest, ConvertedQuote, Quote, QuoteDraft};
use arqon_shared::types::{ListBounds, ListRequest, ListResponse, QuoteId};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError, extractors::{ApiJson, ApiPath, ApiQuery, Tenant}};

/// Creates the quote routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quotes", get(list_quotes).post(create_quote))
        .route("/quotes/{quote_id}", get(get_quote))
        .route("/quotes/{quote_id}/send", post(send_quote))
        .route("/quotes/{quote_id}/approve", post(approve_quote))
        .route("/quotes/{quote_id}/reject", post(reject_quote))
        .route("/quotes/{quote_id}/convert", post(convert_quote))
}

/// POST `/quotes` - Create a quote in draft, or sent when `send` is set.
async fn create_quote(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiJson(draft): ApiJson<QuoteDraft>,
) -> Result<(StatusCode, Json<Quote>), ApiError> {
    let quote = state.quotes.create(tenant, &draft).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// GET `/quotes`.
async fn list_quotes(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiQuery(query): ApiQuery<ListRequest>,
) -> Result<Json<ListResponse<Quote>>, ApiError> {
    let limit = query.resolve(ListBounds::CATALOG);
    let quotes = state.quotes.list(tenant, limit).await?;
    Ok(Json(ListResponse::new(quotes, limit)))
}

/// GET `/quotes/{quote_id}`.
async fn get_quote(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiPath(quote_id): ApiPath<Uuid>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(state.quotes.get(tenant, QuoteId::from_uuid(quote_id)).await?))
}

/// POST `/quotes/{quote_id}/send` - Draft to Sent.
async fn send_quote(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiPath(quote_id): ApiPath<Uuid>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(state.quotes.send(tenant, QuoteId::from_uuid(quote_id)).await?))
}

/// POST `/quotes/{quote_id}/approve` - Sent to Approved.
async fn approve_quote(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiPath(quote_id): ApiPath<Uuid>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(state.quotes.approve(tenant, QuoteId::from_uuid(quote_id)).await?))
}

/// POST `/quotes/{quote_id}/reject` - Sent to Rejected.
async fn reject_quote(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiPath(quote_id): ApiPath<Uuid>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(state.quotes.reject(tenant, QuoteId::from_uuid(quote_id)).await?))
}

/// POST `/quotes/{quote_id}/convert` - Issue the invoice of an approved quote.
/// A second conversion is a 409.
async fn convert_quote(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiPath(quote_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ConvertRequest>,
) -> Result<(StatusCode, Json<ConvertedQuote>), ApiError> {
    let converted = state
        .quotes
        .convert(tenant, QuoteId::from_uuid(quote_id), request)
        .await?;
    Ok((StatusCode::CREATED, Json(converted)))
}

#[cfg(test)]
mod tests {
    use arqon_shared::types::TenantId;
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    use crate::routes::test_support::{decimal, seed_customer, send, test_app};

    fn draft(customer: &Value, send_now: bool) -> Value {
        json!({
            "customer_id": customer,
            "customer_name": "ACME",
            "send": send_now,
            "lines": [{ "description": "Install", "quantity": "3", "unit_price": "40" }]
        })
    }

    #[tokio::test]
    async fn test_quote_lifecycle_and_conversion() {
        let (app, _) = test_app();
        let id = TenantId::new();
        let tenant = Some(id);
        let body = draft(&seed_customer(&app, id).await, false);

        let (status, quote) = send(&app, "POST", "/api/v1/quotes", tenant, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(quote["status"], "draft");
        assert_eq!(decimal(&quote["total"]), dec!(120.00));
        let base = format!("/api/v1/quotes/{}", quote["id"].as_str().unwrap());

        let (_, sent) = send(&app, "POST", &format!("{base}/send"), tenant, None).await;
        assert_eq!(sent["status"], "sent");
        let (_, approved) = send(&app, "POST", &format!("{base}/approve"), tenant, None).await;
        assert_eq!(approved["status"], "approved");

        let (status, converted) = send(
            &app,
            "POST",
            &format!("{base}/convert"),
            tenant,
            Some(json!({ "payment_term": "cash" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(converted["quote"]["status"], "invoiced");
        assert_eq!(converted["quote"]["invoice_id"], converted["invoice"]["id"]);
        assert_eq!(converted["invoice"]["quote_id"], quote["id"]);
        assert_eq!(decimal(&converted["invoice"]["total"]), dec!(120.00));

        let (status, error) = send(
            &app,
            "POST",
            &format!("{base}/convert"),
            tenant,
            Some(json!({ "payment_term": "cash" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error["error"], "ALREADY_CONVERTED");

        let (_, invoices) = send(&app, "GET", "/api/v1/invoices", tenant, None).await;
        assert_eq!(invoices["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_transition_is_409() {
        let (app, _) = test_app();
        let id = TenantId::new();
        let tenant = Some(id);
        let body = draft(&seed_customer(&app, id).await, true);
        let (_, quote) = send(&app, "POST", "/api/v1/quotes", tenant, Some(body)).await;
        assert_eq!(quote["status"], "sent");
        let base = format!("/api/v1/quotes/{}", quote["id"].as_str().unwrap());

        send(&app, "POST", &format!("{base}/reject"), tenant, None).await;
        let (status, error) = send(&app, "POST", &format!("{base}/approve"), tenant, None).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error["error"], "INVALID_TRANSITION");
        assert_eq!(
            error["message"],
            "Invalid status transition from rejected to approved"
        );
    }

    #[tokio::test]
    async fn test_unknown_quote_is_404() {
        let (app, _) = test_app();
        let missing = uuid::Uuid::new_v4();
        let (status, error) = send(
            &app,
            "GET",
            &format!("/api/v1/quotes/{missing}"),
            Some(TenantId::new()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"], "QUOTE_NOT_FOUND");
    }
}
