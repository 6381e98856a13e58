//! Cash (treasury) routes.

use arqon_core::ledger::{CashMovement, CashSummary, ManualCashMovementInput};
use arqon_core::store::TimeRange;
use arqon_shared::types::{ListBounds, ListRequest};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, extractors::{ApiJson, ApiQuery, Tenant}};

/// Creates the cash routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/cash", get(list_cash).post(record_movement))
}

/// Query parameters for the cash listing. Bounds are inclusive RFC 3339
/// timestamps.
#[derive(Debug, Default, Deserialize)]
pub struct CashQuery {
    /// Lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Upper bound.
    pub to: Option<DateTime<Utc>>,
    /// Page size.
    pub limit: Option<u64>,
}

/// Cash movements in a range with their totals.
#[derive(Debug, Serialize)]
pub struct CashResponse {
    /// Totals over the whole range, not only the returned movements.
    pub summary: CashSummary,
    /// Movements, newest first.
    pub data: Vec<CashMovement>,
    /// Limit that was applied to `data`.
    pub limit: u64,
}

/// GET `/cash` - Movements in a time range plus income/expense totals.
async fn list_cash(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiQuery(query): ApiQuery<CashQuery>,
) -> Result<Json<CashResponse>, ApiError> {
    if let (Some(from), Some(to)) = (query.from, query.to)
        && from > to
    {
        return Err(ApiError::bad_request(
            "INVALID_RANGE",
            "from must not be after to",
        ));
    }

    let limit = ListRequest { limit: query.limit }.resolve(ListBounds::CASH);
    let range = TimeRange {
        from: query.from,
        to: query.to,
    };
    let mut movements = state.store.cash_movements(tenant, range).await?;
    let summary = CashSummary::from_movements(&movements)?;
    movements.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

    Ok(Json(CashResponse {
        summary,
        data: movements,
        limit,
    }))
}

/// POST `/cash` - Record a manual income or expense.
async fn record_movement(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiJson(input): ApiJson<ManualCashMovementInput>,
) -> Result<(StatusCode, Json<CashMovement>), ApiError> {
    let movement = state.posting.record_cash_movement(tenant, &input).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

#[cfg(test)]
mod tests {
    use arqon_shared::types::TenantId;
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::routes::test_support::{decimal, send, test_app};

    async fn record(app: &axum::Router, tenant: TenantId, direction: &str, amount: &str) {
        let (status, movement) = send(
            app,
            "POST",
            "/api/v1/cash",
            Some(tenant),
            Some(json!({
                "direction": direction,
                "amount": amount,
                "method": "cash",
                "description": "till",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(movement["origin"], "manual");
    }

    #[tokio::test]
    async fn test_cash_listing_with_summary() {
        let (app, _) = test_app();
        let tenant = TenantId::new();
        record(&app, tenant, "income", "300").await;
        record(&app, tenant, "income", "45.5").await;
        record(&app, tenant, "expense", "120.25").await;

        let (status, cash) = send(&app, "GET", "/api/v1/cash?limit=2", Some(tenant), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(cash["data"].as_array().unwrap().len(), 2);
        assert_eq!(decimal(&cash["summary"]["income"]), dec!(345.50));
        assert_eq!(decimal(&cash["summary"]["expense"]), dec!(120.25));
        assert_eq!(decimal(&cash["summary"]["balance"]), dec!(225.25));
    }

    #[tokio::test]
    async fn test_future_range_is_empty() {
        let (app, _) = test_app();
        let tenant = TenantId::new();
        record(&app, tenant, "income", "10").await;

        let (status, cash) = send(
            &app,
            "GET",
            "/api/v1/cash?from=2999-01-01T00:00:00Z",
            Some(tenant),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(cash["data"].as_array().unwrap().is_empty());
        assert_eq!(decimal(&cash["summary"]["balance"]), dec!(0));
    }

    #[tokio::test]
    async fn test_inverted_range_is_400() {
        let (app, _) = test_app();
        let (status, error) = send(
            &app,
            "GET",
            "/api/v1/cash?from=2026-02-01T00:00:00Z&to=2026-01-01T00:00:00Z",
            Some(TenantId::new()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "INVALID_RANGE");
    }

    #[tokio::test]
    async fn test_manual_movement_requires_description() {
        let (app, _) = test_app();
        let (status, error) = send(
            &app,
            "POST",
            "/api/v1/cash",
            Some(TenantId::new()),
            Some(json!({ "direction": "expense", "amount": "5", "method": "cash", "description": " " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "MISSING_FIELD");
    }

    #[tokio::test]
    async fn test_totals_out_of_range_are_a_json_error() {
        let (app, _) = test_app();
        let tenant = TenantId::new();
        record(&app, tenant, "income", "40000000000000000000000000000").await;
        record(&app, tenant, "income", "40000000000000000000000000000").await;

        let (status, error) = send(&app, "GET", "/api/v1/cash", Some(tenant), None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error["error"], "BALANCE_OVERFLOW");
    }
}
