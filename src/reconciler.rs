use std::sync::Arc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    Account, AccountPatch, CreateAccountRequest, NewAccount, UpsertAccountRequest, UpsertOutcome,
};
use crate::store::AccountStore;

/// Identity-reconciliation core.
///
/// Decides, for each inbound request, whether it is a create, a targeted
/// update, or an upsert; validates required fields per operation; and
/// translates store results into caller-facing outcomes. Holds no state of
/// its own beyond the injected store handle, so every request is an
/// independent unit of work.
pub struct AccountReconciler {
    store: Arc<dyn AccountStore>,
}

impl AccountReconciler {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Creates an account. `name`, `email` and `phone` are required and
    /// must be non-empty; `salesforce_id` is optional. No uniqueness
    /// pre-check is made on the Salesforce id — the store's unique index is
    /// the only guard, and a violation surfaces as a conflict.
    pub async fn create(&self, req: CreateAccountRequest) -> Result<Uuid, AppError> {
        let name = required_field(req.name, "name")?;
        let email = required_field(req.email, "email")?;
        let phone = required_field(req.phone, "phone")?;
        let salesforce_id = req.salesforce_id.filter(|s| !s.trim().is_empty());

        self.store
            .insert(NewAccount {
                salesforce_id,
                name,
                email,
                phone,
            })
            .await
    }

    /// Full ordered sequence of accounts as currently stored.
    pub async fn fetch_all(&self) -> Result<Vec<Account>, AppError> {
        self.store.find_all().await
    }

    /// Looks up an account by its internal id token.
    pub async fn fetch_by_internal_id(&self, id: &str) -> Result<Account, AppError> {
        let id = parse_internal_id(id)?;
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account with id {} not found", id)))
    }

    /// Field-level merge keyed on the internal id. Only supplied, non-blank
    /// fields are applied. Returns the modified count; an id that matches
    /// no record reports zero modifications rather than a missing-resource
    /// error.
    pub async fn update_by_internal_id(
        &self,
        id: &str,
        patch: AccountPatch,
    ) -> Result<u64, AppError> {
        let id = parse_internal_id(id)?;
        self.store.update_by_id(id, &patch.effective()).await
    }

    /// Field-level merge keyed on the Salesforce id. Unlike the internal-id
    /// variant, an unmatched id is a missing-resource error.
    pub async fn update_by_external_id(
        &self,
        salesforce_id: &str,
        patch: AccountPatch,
    ) -> Result<u64, AppError> {
        require_external_id(salesforce_id)?;

        let report = self
            .store
            .update_by_salesforce_id(salesforce_id, &patch.effective())
            .await?;
        if report.matched == 0 {
            return Err(AppError::NotFound(format!(
                "No account with salesforce_id {}",
                salesforce_id
            )));
        }
        Ok(report.modified)
    }

    /// Idempotent reconciliation entry point.
    ///
    /// Requires the full attribute set. Absent match: inserts a record
    /// carrying the Salesforce id (`Created`). Existing match: overwrites
    /// the three attribute fields, leaving the Salesforce id untouched; the
    /// store's modified count decides `Updated` vs `Unchanged`. Two racing
    /// calls for the same previously-absent id may both reach the insert;
    /// the unique index fails the loser with a conflict, which propagates
    /// as-is.
    pub async fn upsert_by_external_id(
        &self,
        salesforce_id: &str,
        req: UpsertAccountRequest,
    ) -> Result<(UpsertOutcome, Uuid), AppError> {
        require_external_id(salesforce_id)?;
        let name = required_field(req.name, "name")?;
        let email = required_field(req.email, "email")?;
        let phone = required_field(req.phone, "phone")?;

        match self.store.find_by_salesforce_id(salesforce_id).await? {
            None => {
                let id = self
                    .store
                    .insert(NewAccount {
                        salesforce_id: Some(salesforce_id.to_string()),
                        name,
                        email,
                        phone,
                    })
                    .await?;
                Ok((UpsertOutcome::Created, id))
            }
            Some(existing) => {
                let report = self
                    .store
                    .replace_fields_by_salesforce_id(salesforce_id, &name, &email, &phone)
                    .await?;
                let outcome = if report.modified > 0 {
                    UpsertOutcome::Updated
                } else {
                    UpsertOutcome::Unchanged
                };
                Ok((outcome, existing.id))
            }
        }
    }
}

fn required_field(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!(
            "Missing required field: {}",
            field
        ))),
    }
}

fn require_external_id(salesforce_id: &str) -> Result<(), AppError> {
    if salesforce_id.trim().is_empty() {
        return Err(AppError::Validation(
            "salesforce_id must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn parse_internal_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::MalformedId(format!("'{}' is not a valid account id", raw)))
}
