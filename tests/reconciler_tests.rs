/// Unit tests for the account reconciliation core
/// Exercises create, fetch, targeted update and upsert against the
/// in-memory store double
use std::sync::Arc;

use rust_accounts_api::errors::AppError;
use rust_accounts_api::mem_store::MemAccountStore;
use rust_accounts_api::models::{
    AccountPatch, CreateAccountRequest, UpsertAccountRequest, UpsertOutcome,
};
use rust_accounts_api::reconciler::AccountReconciler;
use rust_accounts_api::store::AccountStore;

fn reconciler() -> AccountReconciler {
    AccountReconciler::new(Arc::new(MemAccountStore::new()))
}

fn create_request(salesforce_id: Option<&str>) -> CreateAccountRequest {
    CreateAccountRequest {
        name: Some("Acme Corp".to_string()),
        email: Some("ops@acme.com".to_string()),
        phone: Some("555-0100".to_string()),
        salesforce_id: salesforce_id.map(str::to_string),
    }
}

fn upsert_request(name: &str, email: &str, phone: &str) -> UpsertAccountRequest {
    UpsertAccountRequest {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        phone: Some(phone.to_string()),
    }
}

#[cfg(test)]
mod create_tests {
    use super::*;

    #[tokio::test]
    async fn create_then_fetch_roundtrips_field_values() {
        let reconciler = reconciler();

        let id = reconciler.create(create_request(None)).await.unwrap();
        let account = reconciler
            .fetch_by_internal_id(&id.to_string())
            .await
            .unwrap();

        assert_eq!(account.id, id);
        assert_eq!(account.name, "Acme Corp");
        assert_eq!(account.email, "ops@acme.com");
        assert_eq!(account.phone, "555-0100");
        assert_eq!(account.salesforce_id, None);
    }

    #[tokio::test]
    async fn create_missing_required_field_fails_without_insertion() {
        let reconciler = reconciler();

        for missing in ["name", "email", "phone"] {
            let mut request = create_request(None);
            match missing {
                "name" => request.name = None,
                "email" => request.email = None,
                _ => request.phone = None,
            }

            let err = reconciler.create(request).await.unwrap_err();
            assert!(
                matches!(err, AppError::Validation(_)),
                "expected validation error for missing {}",
                missing
            );
        }

        assert!(reconciler.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_empty_string_field_is_rejected() {
        let reconciler = reconciler();

        let mut request = create_request(None);
        request.email = Some("   ".to_string());

        let err = reconciler.create(request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn create_duplicate_salesforce_id_conflicts() {
        let reconciler = reconciler();

        reconciler
            .create(create_request(Some("SF001")))
            .await
            .unwrap();
        let err = reconciler
            .create(create_request(Some("SF001")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(reconciler.fetch_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fetch_all_preserves_insertion_order() {
        let reconciler = reconciler();

        let first = reconciler.create(create_request(Some("SF-A"))).await.unwrap();
        let second = reconciler.create(create_request(Some("SF-B"))).await.unwrap();

        let all = reconciler.fetch_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first);
        assert_eq!(all[1].id, second);
    }
}

#[cfg(test)]
mod fetch_tests {
    use super::*;

    #[tokio::test]
    async fn fetch_with_malformed_id_token_fails() {
        let reconciler = reconciler();

        let err = reconciler
            .fetch_by_internal_id("not-a-uuid")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedId(_)));
    }

    #[tokio::test]
    async fn fetch_unknown_id_is_not_found() {
        let reconciler = reconciler();

        let err = reconciler
            .fetch_by_internal_id("00000000-0000-0000-0000-000000000000")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

#[cfg(test)]
mod update_tests {
    use super::*;

    #[tokio::test]
    async fn partial_patch_leaves_other_fields_unchanged() {
        let reconciler = reconciler();
        let id = reconciler.create(create_request(None)).await.unwrap();

        let patch = AccountPatch {
            phone: Some("555-0199".to_string()),
            ..Default::default()
        };
        let modified = reconciler
            .update_by_internal_id(&id.to_string(), patch)
            .await
            .unwrap();
        assert_eq!(modified, 1);

        let account = reconciler
            .fetch_by_internal_id(&id.to_string())
            .await
            .unwrap();
        assert_eq!(account.phone, "555-0199");
        assert_eq!(account.name, "Acme Corp");
        assert_eq!(account.email, "ops@acme.com");
    }

    #[tokio::test]
    async fn repeated_patch_modifies_once_then_noops() {
        let reconciler = reconciler();
        let id = reconciler.create(create_request(None)).await.unwrap();

        let patch = AccountPatch {
            name: Some("Acme Holdings".to_string()),
            ..Default::default()
        };

        let first = reconciler
            .update_by_internal_id(&id.to_string(), patch.clone())
            .await
            .unwrap();
        let second = reconciler
            .update_by_internal_id(&id.to_string(), patch)
            .await
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn unknown_internal_id_reports_zero_modifications() {
        // Deliberate asymmetry with the Salesforce-id variant: a missing
        // internal id is a zero-count success, not a 404.
        let reconciler = reconciler();

        let patch = AccountPatch {
            name: Some("Nobody".to_string()),
            ..Default::default()
        };
        let modified = reconciler
            .update_by_internal_id("00000000-0000-0000-0000-000000000000", patch)
            .await
            .unwrap();
        assert_eq!(modified, 0);
    }

    #[tokio::test]
    async fn malformed_internal_id_is_rejected_before_the_store() {
        let reconciler = reconciler();

        let err = reconciler
            .update_by_internal_id("abc123", AccountPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedId(_)));
    }

    #[tokio::test]
    async fn update_by_salesforce_id_applies_supplied_fields() {
        let reconciler = reconciler();
        reconciler
            .create(create_request(Some("SF777")))
            .await
            .unwrap();

        let patch = AccountPatch {
            email: Some("billing@acme.com".to_string()),
            ..Default::default()
        };
        let modified = reconciler
            .update_by_external_id("SF777", patch)
            .await
            .unwrap();
        assert_eq!(modified, 1);
    }

    #[tokio::test]
    async fn update_by_unknown_salesforce_id_is_not_found() {
        let reconciler = reconciler();

        let patch = AccountPatch {
            email: Some("billing@acme.com".to_string()),
            ..Default::default()
        };
        let err = reconciler
            .update_by_external_id("SF-MISSING", patch)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_by_empty_salesforce_id_is_a_validation_error() {
        let reconciler = reconciler();

        let err = reconciler
            .update_by_external_id("  ", AccountPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn blank_patch_values_are_not_applied() {
        let reconciler = reconciler();
        reconciler
            .create(create_request(Some("SF888")))
            .await
            .unwrap();

        // Present-but-blank is treated like absent, so the patch can never
        // erase an attribute.
        let patch = AccountPatch {
            name: Some("".to_string()),
            phone: Some("   ".to_string()),
            ..Default::default()
        };
        let modified = reconciler
            .update_by_external_id("SF888", patch)
            .await
            .unwrap();
        assert_eq!(modified, 0);

        let account = reconciler
            .fetch_all()
            .await
            .unwrap()
            .into_iter()
            .next()
            .unwrap();
        assert_eq!(account.name, "Acme Corp");
        assert_eq!(account.phone, "555-0100");
    }
}

#[cfg(test)]
mod upsert_tests {
    use super::*;

    #[tokio::test]
    async fn upsert_is_created_then_unchanged_then_updated() {
        let reconciler = reconciler();

        let (outcome, id) = reconciler
            .upsert_by_external_id("SFX", upsert_request("Acme", "a@x.com", "1"))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);

        let (outcome, same_id) = reconciler
            .upsert_by_external_id("SFX", upsert_request("Acme", "a@x.com", "1"))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Unchanged);
        assert_eq!(same_id, id);

        let (outcome, same_id) = reconciler
            .upsert_by_external_id("SFX", upsert_request("Acme", "a@x.com", "2"))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(same_id, id);

        let account = reconciler
            .fetch_by_internal_id(&id.to_string())
            .await
            .unwrap();
        assert_eq!(account.phone, "2");
        assert_eq!(account.salesforce_id.as_deref(), Some("SFX"));
    }

    #[tokio::test]
    async fn upsert_requires_the_full_field_set() {
        let reconciler = reconciler();

        let request = UpsertAccountRequest {
            name: Some("Acme".to_string()),
            email: None,
            phone: Some("1".to_string()),
        };
        let err = reconciler
            .upsert_by_external_id("SFX", request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Nothing was inserted for the failed upsert
        assert!(reconciler.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_requires_a_salesforce_id() {
        let reconciler = reconciler();

        let err = reconciler
            .upsert_by_external_id("", upsert_request("Acme", "a@x.com", "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn racing_insert_for_the_same_salesforce_id_conflicts() {
        // Two concurrent upserts for an absent id can both observe "no
        // match" and both attempt insertion; the store's uniqueness rule
        // must fail the loser instead of creating a second record.
        let store = Arc::new(MemAccountStore::new());
        let reconciler = AccountReconciler::new(store.clone());

        let (outcome, _) = reconciler
            .upsert_by_external_id("SFRACE", upsert_request("Acme", "a@x.com", "1"))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);

        // The loser's insert, replayed directly against the store seam
        let err = store
            .insert(rust_accounts_api::models::NewAccount {
                salesforce_id: Some("SFRACE".to_string()),
                name: "Acme".to_string(),
                email: "a@x.com".to_string(),
                phone: "1".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(reconciler.fetch_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upsert_never_reassigns_the_internal_id() {
        let reconciler = reconciler();

        let (_, created_id) = reconciler
            .upsert_by_external_id("SFY", upsert_request("Acme", "a@x.com", "1"))
            .await
            .unwrap();
        let (_, updated_id) = reconciler
            .upsert_by_external_id("SFY", upsert_request("Acme Two", "b@x.com", "2"))
            .await
            .unwrap();

        assert_eq!(created_id, updated_id);
        assert_eq!(reconciler.fetch_all().await.unwrap().len(), 1);
    }
}
