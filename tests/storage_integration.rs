use std::env;
use std::sync::Arc;
use uuid::Uuid;

use rust_accounts_api::data::db_storage::PgAccountStore;
use rust_accounts_api::db::Database;
use rust_accounts_api::models::{UpsertAccountRequest, UpsertOutcome};
use rust_accounts_api::reconciler::AccountReconciler;

/// Integration smoke test for the Postgres account store.
/// Marked ignored to avoid running against production by accident; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn upsert_against_postgres_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url).await?;
    let store = PgAccountStore::new(db.pool.clone());
    store.ensure_schema().await?;

    let reconciler = AccountReconciler::new(Arc::new(store));

    // Use a unique Salesforce id to avoid conflicts on repeated runs.
    let sf_id = format!("SFTEST{}", Uuid::new_v4().simple());

    let fields = |phone: &str| UpsertAccountRequest {
        name: Some("Smoke Test Account".to_string()),
        email: Some("smoke@test.com".to_string()),
        phone: Some(phone.to_string()),
    };

    let (outcome, id) = reconciler.upsert_by_external_id(&sf_id, fields("1")).await?;
    assert_eq!(outcome, UpsertOutcome::Created);

    let (outcome, _) = reconciler.upsert_by_external_id(&sf_id, fields("1")).await?;
    assert_eq!(outcome, UpsertOutcome::Unchanged);

    let (outcome, _) = reconciler.upsert_by_external_id(&sf_id, fields("2")).await?;
    assert_eq!(outcome, UpsertOutcome::Updated);

    let account = reconciler.fetch_by_internal_id(&id.to_string()).await?;
    assert_eq!(account.phone, "2");
    assert_eq!(account.salesforce_id.as_deref(), Some(sf_id.as_str()));

    Ok(())
}
