//! Schema migration runner for Opsdesk.
//!
//! ```text
//! migrator up      apply pending migrations
//! migrator down    roll back the latest migration
//! migrator status  list applied and pending migrations
//! migrator fresh   drop every table, then apply all migrations
//! ```
//!
//! The target database comes from `DATABASE_URL` (a `.env` file is honoured).

use opsdesk_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if std::env::var_os("DATABASE_URL").is_none() {
        eprintln!("DATABASE_URL is not set; add it to the environment or .env");
        std::process::exit(2);
    }

    cli::run_cli(Migrator).await;
}
