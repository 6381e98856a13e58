//! Arqon API Server
//!
//! Main entry point for the Arqon backend service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arqon_api::{AppState, create_router};
use arqon_core::store::{DocumentStore, InMemoryStore};
use arqon_db::{PgDocumentStore, connect};
use arqon_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arqon=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let store: Arc<dyn DocumentStore> = if config.database.is_in_memory() {
        info!("Using in-memory document store");
        Arc::new(InMemoryStore::new())
    } else {
        let db = connect(&config.database)
            .await
            .context("failed to connect to database")?;
        info!(
            max_connections = config.database.max_connections,
            "Connected to database"
        );
        Arc::new(PgDocumentStore::new(db))
    };

    info!(
        max_attempts = config.posting.max_attempts,
        chunk_size = config.import.chunk_size,
        "Services configured"
    );
    let app = create_router(AppState::new(store, &config));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
