use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Account, AccountPatch, NewAccount};
use crate::store::{AccountStore, UpdateReport};

/// Postgres-backed account store.
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the accounts table and the partial unique index on
    /// `salesforce_id`. The index is the safeguard that turns a racing
    /// duplicate insert into a conflict instead of a second record.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                salesforce_id text,
                name text NOT NULL,
                email text NOT NULL,
                phone text NOT NULL,
                created_at timestamptz NOT NULL DEFAULT now(),
                updated_at timestamptz
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS accounts_salesforce_id_key
            ON accounts (salesforce_id)
            WHERE salesforce_id IS NOT NULL
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Matched count for a Salesforce id lookup, read separately from the
    /// write so a no-op update is distinguishable from a missing record.
    async fn matched_by_salesforce_id(&self, salesforce_id: &str) -> Result<u64, AppError> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM accounts WHERE salesforce_id = $1")
                .bind(salesforce_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(u64::from(row.is_some()))
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_by_salesforce_id(
        &self,
        salesforce_id: &str,
    ) -> Result<Option<Account>, AppError> {
        let account =
            sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE salesforce_id = $1")
                .bind(salesforce_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(account)
    }

    async fn find_all(&self) -> Result<Vec<Account>, AppError> {
        let accounts =
            sqlx::query_as::<_, Account>("SELECT * FROM accounts ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(accounts)
    }

    async fn insert(&self, account: NewAccount) -> Result<Uuid, AppError> {
        let row: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO accounts (salesforce_id, name, email, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&account.salesforce_id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.phone)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn update_by_id(&self, id: Uuid, patch: &AccountPatch) -> Result<u64, AppError> {
        // The IS DISTINCT FROM guard keeps rows_affected at 0 when the
        // patch would not change any value, which is the modified count
        // the idempotence contract is built on.
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                updated_at = now()
            WHERE id = $1
              AND (name IS DISTINCT FROM COALESCE($2, name)
                OR email IS DISTINCT FROM COALESCE($3, email)
                OR phone IS DISTINCT FROM COALESCE($4, phone))
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.email)
        .bind(&patch.phone)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn update_by_salesforce_id(
        &self,
        salesforce_id: &str,
        patch: &AccountPatch,
    ) -> Result<UpdateReport, AppError> {
        let matched = self.matched_by_salesforce_id(salesforce_id).await?;
        if matched == 0 {
            return Ok(UpdateReport {
                matched: 0,
                modified: 0,
            });
        }

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                updated_at = now()
            WHERE salesforce_id = $1
              AND (name IS DISTINCT FROM COALESCE($2, name)
                OR email IS DISTINCT FROM COALESCE($3, email)
                OR phone IS DISTINCT FROM COALESCE($4, phone))
            "#,
        )
        .bind(salesforce_id)
        .bind(&patch.name)
        .bind(&patch.email)
        .bind(&patch.phone)
        .execute(&self.pool)
        .await?;

        Ok(UpdateReport {
            matched,
            modified: result.rows_affected(),
        })
    }

    async fn replace_fields_by_salesforce_id(
        &self,
        salesforce_id: &str,
        name: &str,
        email: &str,
        phone: &str,
    ) -> Result<UpdateReport, AppError> {
        let matched = self.matched_by_salesforce_id(salesforce_id).await?;
        if matched == 0 {
            return Ok(UpdateReport {
                matched: 0,
                modified: 0,
            });
        }

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET name = $2,
                email = $3,
                phone = $4,
                updated_at = now()
            WHERE salesforce_id = $1
              AND (name IS DISTINCT FROM $2
                OR email IS DISTINCT FROM $3
                OR phone IS DISTINCT FROM $4)
            "#,
        )
        .bind(salesforce_id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .execute(&self.pool)
        .await?;

        Ok(UpdateReport {
            matched,
            modified: result.rows_affected(),
        })
    }
}
