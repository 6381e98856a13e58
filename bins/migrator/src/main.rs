//! Database migration runner for Arqon.
//!
//! Usage:
//!   migrator up      - Create the document tables
//!   migrator down    - Drop them again
//!   migrator status  - Show migration status
//!
//! The connection string is read from `DATABASE_URL`.

use arqon_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // run_cli installs its own tracing subscriber
    cli::run_cli(Migrator).await;
}
