use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Account, AccountPatch, NewAccount};
use crate::store::{AccountStore, UpdateReport};

/// In-memory account store.
///
/// Backs the test suite and lets the API run without a database. Enforces
/// the same `salesforce_id` uniqueness rule as the Postgres schema and
/// reports modified counts with the same no-op-write semantics.
#[derive(Default)]
pub struct MemAccountStore {
    accounts: RwLock<Vec<Account>>,
}

impl MemAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Applies the supplied fields, returning whether any value changed.
fn apply_patch(account: &mut Account, patch: &AccountPatch) -> bool {
    let mut changed = false;
    if let Some(name) = &patch.name {
        if account.name != *name {
            account.name = name.clone();
            changed = true;
        }
    }
    if let Some(email) = &patch.email {
        if account.email != *email {
            account.email = email.clone();
            changed = true;
        }
    }
    if let Some(phone) = &patch.phone {
        if account.phone != *phone {
            account.phone = phone.clone();
            changed = true;
        }
    }
    if changed {
        account.updated_at = Some(Utc::now());
    }
    changed
}

#[async_trait]
impl AccountStore for MemAccountStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_salesforce_id(
        &self,
        salesforce_id: &str,
    ) -> Result<Option<Account>, AppError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .iter()
            .find(|a| a.salesforce_id.as_deref() == Some(salesforce_id))
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<Account>, AppError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.clone())
    }

    async fn insert(&self, account: NewAccount) -> Result<Uuid, AppError> {
        let mut accounts = self.accounts.write().await;
        if let Some(sf_id) = &account.salesforce_id {
            if accounts
                .iter()
                .any(|a| a.salesforce_id.as_deref() == Some(sf_id.as_str()))
            {
                return Err(AppError::Conflict(
                    "An account with this salesforce_id already exists".to_string(),
                ));
            }
        }

        let id = Uuid::new_v4();
        accounts.push(Account {
            id,
            salesforce_id: account.salesforce_id,
            name: account.name,
            email: account.email,
            phone: account.phone,
            created_at: Utc::now(),
            updated_at: None,
        });
        Ok(id)
    }

    async fn update_by_id(&self, id: Uuid, patch: &AccountPatch) -> Result<u64, AppError> {
        let mut accounts = self.accounts.write().await;
        match accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => Ok(u64::from(apply_patch(account, patch))),
            None => Ok(0),
        }
    }

    async fn update_by_salesforce_id(
        &self,
        salesforce_id: &str,
        patch: &AccountPatch,
    ) -> Result<UpdateReport, AppError> {
        let mut accounts = self.accounts.write().await;
        match accounts
            .iter_mut()
            .find(|a| a.salesforce_id.as_deref() == Some(salesforce_id))
        {
            Some(account) => Ok(UpdateReport {
                matched: 1,
                modified: u64::from(apply_patch(account, patch)),
            }),
            None => Ok(UpdateReport {
                matched: 0,
                modified: 0,
            }),
        }
    }

    async fn replace_fields_by_salesforce_id(
        &self,
        salesforce_id: &str,
        name: &str,
        email: &str,
        phone: &str,
    ) -> Result<UpdateReport, AppError> {
        let patch = AccountPatch {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            phone: Some(phone.to_string()),
        };
        self.update_by_salesforce_id(salesforce_id, &patch).await
    }
}
