use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Account, AccountPatch, NewAccount};

/// Outcome counts of a single targeted update, in the document-store
/// convention of reporting matched and modified rows separately. A write
/// that matches a record but changes no value reports `modified == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateReport {
    pub matched: u64,
    pub modified: u64,
}

/// Persistence seam for accounts.
///
/// Constructed once at process start and injected into the reconciler, so
/// the Postgres backend and the in-memory backend are interchangeable.
/// Implementations must enforce uniqueness of `salesforce_id` and report a
/// violated insert as `AppError::Conflict`; match-then-write sequences are
/// not required to be atomic.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Single record by internal id, or none.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    /// Single record by Salesforce id, or none.
    async fn find_by_salesforce_id(
        &self,
        salesforce_id: &str,
    ) -> Result<Option<Account>, AppError>;

    /// Full record sequence in insertion order.
    async fn find_all(&self) -> Result<Vec<Account>, AppError>;

    /// Inserts a record and returns the assigned internal id.
    async fn insert(&self, account: NewAccount) -> Result<Uuid, AppError>;

    /// Field-level merge keyed on the internal id. Returns the modified
    /// count: 0 when the id matches nothing or the patch changes nothing.
    async fn update_by_id(&self, id: Uuid, patch: &AccountPatch) -> Result<u64, AppError>;

    /// Field-level merge keyed on the Salesforce id.
    async fn update_by_salesforce_id(
        &self,
        salesforce_id: &str,
        patch: &AccountPatch,
    ) -> Result<UpdateReport, AppError>;

    /// Full overwrite of the three attribute fields on the record carrying
    /// the given Salesforce id; the id itself is left untouched.
    async fn replace_fields_by_salesforce_id(
        &self,
        salesforce_id: &str,
        name: &str,
        email: &str,
        phone: &str,
    ) -> Result<UpdateReport, AppError>;
}
