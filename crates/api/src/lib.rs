//! HTTP API layer with Axum routes and extractors.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - The `x-org-id` tenant extractor
//! - JSON error responses

pub mod error;
pub mod extractors;
pub mod routes;

use std::sync::Arc;

use arqon_core::catalog::{CatalogImporter, CatalogService};
use arqon_core::customer::{CustomerImporter, CustomerService};
use arqon_core::ledger::{PostingService, RetryPolicy};
use arqon_core::quote::QuoteService;
use arqon_core::store::DocumentStore;
use arqon_shared::AppConfig;
use arqon_shared::AppError;
use axum::Router;
use axum::http::{Method, Uri};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Document store used for reads.
    pub store: Arc<dyn DocumentStore>,
    /// Invoice, payment and cash postings.
    pub posting: PostingService,
    /// Quote lifecycle and conversion.
    pub quotes: QuoteService,
    /// Product catalog.
    pub catalog: CatalogService,
    /// Bulk product and price-list imports.
    pub importer: CatalogImporter,
    /// Customers and the lead pipeline.
    pub customers: CustomerService,
    /// Bulk customer imports.
    pub customer_importer: CustomerImporter,
}

impl AppState {
    /// Builds every service on top of one store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        let retry = RetryPolicy::from(&config.posting);
        Self {
            posting: PostingService::new(store.clone(), retry),
            quotes: QuoteService::new(store.clone(), retry),
            catalog: CatalogService::new(store.clone()),
            importer: CatalogImporter::new(store.clone(), retry, &config.import),
            customers: CustomerService::new(store.clone()),
            customer_importer: CustomerImporter::new(store.clone(), retry, &config.import),
            store,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    AppError::RouteNotFound(format!("{method} {}", uri.path())).into()
}
