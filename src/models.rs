use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ============ Database Models ============

/// A customer account, addressable by two identities: the internal id
/// assigned by the store at insertion, and the Salesforce id supplied by
/// the CRM when the record originates there.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Account {
    /// Internal identifier, assigned exactly once at creation.
    pub id: Uuid,
    /// Salesforce identifier; unique across accounts when present.
    pub salesforce_id: Option<String>,
    /// Account holder name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last update.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Validated field set handed to the store for insertion. Produced by the
/// reconciler after required-field checks; never built from raw input.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub salesforce_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
}

// ============ API Request Models ============

/// Request payload for creating an account.
///
/// Required fields are modeled as `Option` so that presence validation is a
/// reconciler decision surfaced as a `Validation` error, not a
/// deserialization rejection.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub salesforce_id: Option<String>,
}

/// Partial update payload. Each attribute is independently optional;
/// an absent attribute means "leave unchanged".
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl AccountPatch {
    /// Returns the patch restricted to fields that are present with a
    /// non-blank value. A supplied blank string is treated like an absent
    /// field, so a patch can never erase an attribute.
    pub fn effective(&self) -> AccountPatch {
        fn keep(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        }

        AccountPatch {
            name: keep(&self.name),
            email: keep(&self.email),
            phone: keep(&self.phone),
        }
    }

    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }
}

/// Request payload for the upsert endpoint. Unlike the targeted update,
/// the upsert requires the full attribute set.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertAccountRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

// ============ API Response Models ============

/// What an upsert did with the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    /// No prior match; a new record was inserted.
    Created,
    /// A match existed and at least one field value changed.
    Updated,
    /// A match existed and the write changed nothing.
    Unchanged,
}

/// Response for account creation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateAccountResponse {
    /// Internal id of the inserted account.
    pub id: Uuid,
}

/// Response for targeted updates: how many records were modified (0 or 1).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateCountResponse {
    pub modified_count: u64,
}

/// Response for the upsert endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpsertAccountResponse {
    pub outcome: UpsertOutcome,
    /// Internal id of the created or matched account.
    pub id: Uuid,
}
