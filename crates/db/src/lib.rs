//! Database layer with `SeaORM` entities, migrations and the PostgreSQL
//! document store.
//!
//! This crate provides:
//! - `SeaORM` entity definitions, one table per document collection
//! - [`PgDocumentStore`], the production [`DocumentStore`](arqon_core::store::DocumentStore)
//! - Database migrations

mod convert;
pub mod entities;
pub mod migration;
mod store;

pub use store::PgDocumentStore;

use std::time::Duration;

use arqon_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(false);
    Database::connect(options).await
}
