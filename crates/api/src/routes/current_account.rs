//! Current-account routes: open-account payments and customer statements.

use arqon_core::ledger::{AccountBalance, PaymentRequest, Receipt, StatementLine, running_balance};
use arqon_shared::types::{CustomerId, ListBounds, ListRequest};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extractors::{ApiJson, ApiPath, ApiQuery, Tenant}};

/// Creates the current-account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/current-account/payments", post(register_payment))
        .route("/customers/{customer_id}/current-account", get(statement))
}

/// A customer's statement.
#[derive(Debug, Serialize)]
pub struct StatementResponse {
    /// Customer.
    pub customer_id: CustomerId,
    /// Totals over every movement, not only the returned lines.
    #[serde(flatten)]
    pub totals: AccountBalance,
    /// Most recent lines, newest first, each with its running balance.
    pub movements: Vec<StatementLine>,
    /// Limit that was applied to `movements`.
    pub limit: u64,
}

/// POST `/current-account/payments` - Receipt, credit and cash income in one
/// commit.
async fn register_payment(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiJson(request): ApiJson<PaymentRequest>,
) -> Result<(StatusCode, Json<Receipt>), ApiError> {
    let receipt = state.posting.register_payment(tenant, &request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET `/customers/{customer_id}/current-account`.
async fn statement(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiPath(customer_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ListRequest>,
) -> Result<Json<StatementResponse>, ApiError> {
    let customer_id = CustomerId::from_uuid(customer_id);
    let limit = query.resolve(ListBounds::CURRENT_ACCOUNT);
    let movements = state
        .store
        .current_account_movements(tenant, customer_id)
        .await?;

    let totals = AccountBalance::from_movements(&movements)?;
    let keep = usize::try_from(limit).unwrap_or(usize::MAX);
    let lines: Vec<StatementLine> = running_balance(&movements)?
        .into_iter()
        .rev()
        .take(keep)
        .collect();

    Ok(Json(StatementResponse {
        customer_id,
        totals,
        movements: lines,
        limit,
    }))
}

#[cfg(test)]
mod tests {
    use arqon_shared::types::{CustomerId, TenantId};
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::routes::test_support::{decimal, seed_customer, send, test_app};

    #[tokio::test]
    async fn test_statement_after_invoice_and_payments() {
        let (app, store) = test_app();
        let id = TenantId::new();
        let tenant = Some(id);
        let customer = seed_customer(&app, id).await;
        let customer_id = customer.as_str().unwrap();

        let (status, invoice) = send(
            &app,
            "POST",
            "/api/v1/invoices",
            tenant,
            Some(json!({
                "customer_id": customer,
                "customer_name": "ACME",
                "payment_term": "open_account",
                "lines": [{ "description": "Service", "quantity": "1", "unit_price": "500" }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        for amount in ["200", "100"] {
            let (status, receipt) = send(
                &app,
                "POST",
                "/api/v1/current-account/payments",
                tenant,
                Some(json!({
                    "customer_id": customer,
                    "customer_name": "ACME",
                    "amount": amount,
                    "method": "transfer",
                    "invoice_id": invoice["id"],
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(receipt["description"], "Payment on open account");
        }
        // customer, invoice + debit, then receipt + credit + cash income per payment
        assert_eq!(store.document_count().await, 9);

        let (status, statement) = send(
            &app,
            "GET",
            &format!("/api/v1/customers/{customer_id}/current-account"),
            tenant,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&statement["balance"]), dec!(200.00));
        assert_eq!(decimal(&statement["debit_total"]), dec!(500.00));
        assert_eq!(decimal(&statement["credit_total"]), dec!(300.00));

        let lines = statement["movements"].as_array().unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(decimal(&lines[0]["current_balance"]), dec!(200.00));
    }

    #[tokio::test]
    async fn test_statement_limit_keeps_full_balance() {
        let (app, _) = test_app();
        let id = TenantId::new();
        let tenant = Some(id);
        let customer = seed_customer(&app, id).await;
        let customer_id = customer.as_str().unwrap();
        for amount in ["10", "20", "30"] {
            send(
                &app,
                "POST",
                "/api/v1/current-account/payments",
                tenant,
                Some(json!({
                    "customer_id": customer,
                    "customer_name": "ACME",
                    "amount": amount,
                    "method": "cash",
                })),
            )
            .await;
        }

        let (_, statement) = send(
            &app,
            "GET",
            &format!("/api/v1/customers/{customer_id}/current-account?limit=1"),
            tenant,
            None,
        )
        .await;

        assert_eq!(statement["movements"].as_array().unwrap().len(), 1);
        assert_eq!(decimal(&statement["balance"]), dec!(-60.00));
    }

    #[tokio::test]
    async fn test_unknown_customer_has_zero_balance() {
        let (app, _) = test_app();
        let customer = CustomerId::new();
        let (status, statement) = send(
            &app,
            "GET",
            &format!("/api/v1/customers/{customer}/current-account"),
            Some(TenantId::new()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&statement["balance"]), dec!(0));
        assert!(statement["movements"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_positive_payment_is_400() {
        let (app, store) = test_app();
        let (status, error) = send(
            &app,
            "POST",
            "/api/v1/current-account/payments",
            Some(TenantId::new()),
            Some(json!({
                "customer_id": CustomerId::new(),
                "customer_name": "ACME",
                "amount": "0",
                "method": "cash",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "INVALID_AMOUNT");
        assert_eq!(store.document_count().await, 0);
    }

    #[tokio::test]
    async fn test_payment_for_unknown_customer_is_404() {
        let (app, store) = test_app();
        let (status, error) = send(
            &app,
            "POST",
            "/api/v1/current-account/payments",
            Some(TenantId::new()),
            Some(json!({
                "customer_id": CustomerId::new(),
                "customer_name": "ACME",
                "amount": "10",
                "method": "cash",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"], "CUSTOMER_NOT_FOUND");
        assert_eq!(store.document_count().await, 0);
    }
}
