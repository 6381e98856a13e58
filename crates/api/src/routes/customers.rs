//! Customer and lead routes.

use arqon_core::customer::{Customer, CustomerFields, CustomerQuery, Lead, LeadStage, NewLead, UpsertOutcome};
use arqon_shared::types::{CustomerId, LeadId, ListBounds, ListRequest, ListResponse};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extractors::{ApiJson, ApiPath, ApiQuery, Tenant}};

/// Creates the customer and lead routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/{customer_id}", get(get_customer).put(update_customer))
        .route("/leads", get(list_leads).post(create_lead))
        .route("/leads/{lead_id}", get(get_lead))
        .route("/leads/{lead_id}/stage", put(move_lead))
}

/// Filters for `GET /customers`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CustomerListParams {
    q: Option<String>,
    doc_number: Option<String>,
    email: Option<String>,
    active: Option<bool>,
    limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpsertParams {
    upsert: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LeadListParams {
    stage: Option<LeadStage>,
    limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct StageChange {
    stage: LeadStage,
}

/// GET `/customers` - Search by name, trade name, email or document number
/// (`q`), or filter on exact fields.
async fn list_customers(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiQuery(params): ApiQuery<CustomerListParams>,
) -> Result<Json<ListResponse<Customer>>, ApiError> {
    let limit = ListRequest { limit: params.limit }.resolve(ListBounds::CUSTOMERS);
    let query = CustomerQuery {
        search: params.q,
        doc_number: params.doc_number,
        email: params.email,
        active: params.active,
        limit,
    };
    let customers = state.customers.list_customers(tenant, &query).await?;
    Ok(Json(ListResponse::new(customers, limit)))
}

/// POST `/customers` - Create a customer. With `?upsert=true` an existing
/// customer with the same document number, or else the same email, is
/// updated instead (200).
async fn create_customer(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiQuery(params): ApiQuery<UpsertParams>,
    ApiJson(fields): ApiJson<CustomerFields>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    if !params.upsert {
        let customer = state.customers.create_customer(tenant, fields).await?;
        return Ok((StatusCode::CREATED, Json(customer)));
    }
    let (customer, outcome) = state.customers.upsert_customer(tenant, fields).await?;
    let status = match outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Updated => StatusCode::OK,
    };
    Ok((status, Json(customer)))
}

/// GET `/customers/{customer_id}`.
async fn get_customer(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiPath(customer_id): ApiPath<Uuid>,
) -> Result<Json<Customer>, ApiError> {
    let customer = state
        .customers
        .get_customer(tenant, CustomerId::from_uuid(customer_id))
        .await?;
    Ok(Json(customer))
}

/// PUT `/customers/{customer_id}` - Overwrite the fields present in the body.
async fn update_customer(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiPath(customer_id): ApiPath<Uuid>,
    ApiJson(fields): ApiJson<CustomerFields>,
) -> Result<Json<Customer>, ApiError> {
    let customer = state
        .customers
        .update_customer(tenant, CustomerId::from_uuid(customer_id), fields)
        .await?;
    Ok(Json(customer))
}

/// GET `/leads`, optionally filtered by `stage`.
async fn list_leads(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiQuery(params): ApiQuery<LeadListParams>,
) -> Result<Json<ListResponse<Lead>>, ApiError> {
    let limit = ListRequest { limit: params.limit }.resolve(ListBounds::CUSTOMERS);
    let leads = state.customers.list_leads(tenant, params.stage, limit).await?;
    Ok(Json(ListResponse::new(leads, limit)))
}

/// POST `/leads` - Create a lead in the `new` stage.
async fn create_lead(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiJson(input): ApiJson<NewLead>,
) -> Result<(StatusCode, Json<Lead>), ApiError> {
    let lead = state.customers.create_lead(tenant, input).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

/// GET `/leads/{lead_id}`.
async fn get_lead(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiPath(lead_id): ApiPath<Uuid>,
) -> Result<Json<Lead>, ApiError> {
    Ok(Json(state.customers.get_lead(tenant, LeadId::from_uuid(lead_id)).await?))
}

/// PUT `/leads/{lead_id}/stage` - Move a lead to any stage.
async fn move_lead(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    ApiPath(lead_id): ApiPath<Uuid>,
    ApiJson(change): ApiJson<StageChange>,
) -> Result<Json<Lead>, ApiError> {
    let lead = state
        .customers
        .move_lead(tenant, LeadId::from_uuid(lead_id), change.stage)
        .await?;
    Ok(Json(lead))
}

#[cfg(test)]
mod tests {
    use arqon_shared::types::TenantId;
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::routes::test_support::{decimal, send, test_app};

    #[tokio::test]
    async fn test_customer_create_get_update_and_search() {
        let (app, _) = test_app();
        let tenant = Some(TenantId::new());

        let (status, created) = send(
            &app,
            "POST",
            "/api/v1/customers",
            tenant,
            Some(json!({
                "doc_number": "30-71234567-8",
                "name": " ACME SA ",
                "email": "compras@acme.com",
                "vat_condition": "RI"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["name"], "ACME SA");
        assert_eq!(created["active"], true);
        assert_eq!(decimal(&created["bonif_percent"]), dec!(0));
        let uri = format!("/api/v1/customers/{}", created["id"].as_str().unwrap());

        let (status, updated) = send(
            &app,
            "PUT",
            &uri,
            tenant,
            Some(json!({ "bonif_percent": "12.5", "city": "Rosario" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["city"], "Rosario");
        assert_eq!(updated["name"], "ACME SA");

        let (_, fetched) = send(&app, "GET", &uri, tenant, None).await;
        assert_eq!(decimal(&fetched["bonif_percent"]), dec!(12.5));

        let (_, found) = send(&app, "GET", "/api/v1/customers?q=acme", tenant, None).await;
        assert_eq!(found["data"].as_array().unwrap().len(), 1);
        assert_eq!(found["limit"], 50);
        let (_, none) = send(&app, "GET", "/api/v1/customers?active=false", tenant, None).await;
        assert!(none["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_query_flag_selects_status() {
        let (app, _) = test_app();
        let tenant = Some(TenantId::new());
        let body = json!({ "doc_number": "20-1", "name": "Juan" });

        let (status, first) =
            send(&app, "POST", "/api/v1/customers?upsert=true", tenant, Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, second) =
            send(&app, "POST", "/api/v1/customers?upsert=true", tenant, Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["id"], first["id"]);
    }

    #[tokio::test]
    async fn test_customer_validation_errors() {
        let (app, _) = test_app();
        let tenant = Some(TenantId::new());

        let (status, error) = send(
            &app,
            "POST",
            "/api/v1/customers",
            tenant,
            Some(json!({ "name": "X", "email": "not-an-email" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "INVALID_EMAIL");

        let (status, error) =
            send(&app, "POST", "/api/v1/customers", tenant, Some(json!({ "city": "Rosario" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "MISSING_NAME");

        let missing = uuid::Uuid::new_v4();
        let (status, error) =
            send(&app, "GET", &format!("/api/v1/customers/{missing}"), tenant, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"], "CUSTOMER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_lead_pipeline() {
        let (app, _) = test_app();
        let tenant = Some(TenantId::new());

        let (status, lead) = send(
            &app,
            "POST",
            "/api/v1/leads",
            tenant,
            Some(json!({ "name": "Obra Norte", "email": "obra@norte.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(lead["stage"], "new");
        let uri = format!("/api/v1/leads/{}/stage", lead["id"].as_str().unwrap());

        let (status, moved) =
            send(&app, "PUT", &uri, tenant, Some(json!({ "stage": "proposal" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(moved["stage"], "proposal");

        let (_, proposals) = send(&app, "GET", "/api/v1/leads?stage=proposal", tenant, None).await;
        assert_eq!(proposals["data"].as_array().unwrap().len(), 1);
        let (_, won) = send(&app, "GET", "/api/v1/leads?stage=won", tenant, None).await;
        assert!(won["data"].as_array().unwrap().is_empty());

        let (status, _) = send(&app, "PUT", &uri, tenant, Some(json!({ "stage": "archived" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
