//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod cash;
pub mod current_account;
pub mod customers;
pub mod health;
pub mod imports;
pub mod invoices;
pub mod pricing;
pub mod products;
pub mod quotes;

/// Creates the API router with all routes. Every route except `/health`
/// requires the `x-org-id` header.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(pricing::routes())
        .merge(products::routes())
        .merge(invoices::routes())
        .merge(current_account::routes())
        .merge(cash::routes())
        .merge(customers::routes())
        .merge(quotes::routes())
        .merge(imports::routes())
}
