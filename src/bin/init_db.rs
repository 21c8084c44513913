//! Utility to bootstrap the accounts schema before first run.

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;

use rust_accounts_api::db_storage::PgAccountStore;

/// Connects to the database and creates the accounts table and its
/// unique index on the Salesforce id, if they do not exist yet.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let database_url = env::var("DB_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .expect("DB_URL or DATABASE_URL must be set");
    let pool = PgPoolOptions::new().connect(&database_url).await?;

    let store = PgAccountStore::new(pool);
    store.ensure_schema().await?;

    println!("accounts schema ready");
    Ok(())
}
