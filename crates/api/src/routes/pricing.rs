//! Price derivation endpoint.

use arqon_core::pricing::{DerivedPrice, PriceDerivationEngine, PricingParameters};
use axum::{Json, Router, routing::post};

use crate::{AppState, error::ApiError, extractors::{ApiJson, Tenant}};

/// Creates the pricing routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/pricing/derive", post(derive))
}

/// POST `/pricing/derive` - Derive a price without storing anything.
async fn derive(
    _tenant: Tenant,
    ApiJson(params): ApiJson<PricingParameters>,
) -> Result<Json<DerivedPrice>, ApiError> {
    Ok(Json(PriceDerivationEngine::derive(&params)?))
}
