use crate::config::Config;
use crate::errors::AppError;
use crate::models::{
    Account, AccountPatch, CreateAccountRequest, CreateAccountResponse, UpdateCountResponse,
    UpsertAccountRequest, UpsertAccountResponse, UpsertOutcome,
};
use crate::reconciler::AccountReconciler;
use crate::store::AccountStore;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend, behind the store seam.
    pub store: Arc<dyn AccountStore>,
    /// Application configuration.
    pub config: Config,
}

impl AppState {
    fn reconciler(&self) -> AccountReconciler {
        AccountReconciler::new(self.store.clone())
    }
}

/// OpenAPI document for the account endpoints.
#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_accounts,
        create_account,
        get_account,
        update_account,
        update_account_by_salesforce_id,
        upsert_account_by_salesforce_id,
    ),
    components(schemas(
        Account,
        CreateAccountRequest,
        CreateAccountResponse,
        AccountPatch,
        UpdateCountResponse,
        UpsertAccountRequest,
        UpsertAccountResponse,
        UpsertOutcome,
    )),
    tags((name = "Accounts", description = "Account reconciliation endpoints"))
)]
pub struct ApiDoc;

/// API routes, without middleware layers. The caller attaches state and
/// whatever layers the deployment needs, so tests can drive the bare
/// router against the in-memory store.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/accounts", get(list_accounts).post(create_account))
        .route(
            "/api/v1/accounts/:id",
            get(get_account).put(update_account),
        )
        .route(
            "/api/v1/accounts/salesforce/:salesforce_id",
            patch(update_account_by_salesforce_id).put(upsert_account_by_salesforce_id),
        )
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy")),
    tag = "Accounts"
)]
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-accounts-api",
            "version": "0.1.0"
        })),
    )
}

/// GET /api/v1/accounts
///
/// Returns every account in insertion order. No pagination; the collection
/// is read in one pass.
#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    responses(
        (status = 200, description = "All accounts", body = [Account]),
        (status = 500, description = "Store unavailable"),
    ),
    tag = "Accounts"
)]
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Account>>, AppError> {
    tracing::info!("GET /api/v1/accounts");

    let accounts = state.reconciler().fetch_all().await?;
    Ok(Json(accounts))
}

/// POST /api/v1/accounts
///
/// Creates an account from the supplied fields.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `payload` - Account fields; `name`, `email` and `phone` required.
///
/// # Returns
///
/// * 201 with the assigned internal id, or an error response.
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = CreateAccountResponse),
        (status = 400, description = "Missing required field"),
        (status = 409, description = "salesforce_id already in use"),
        (status = 500, description = "Store unavailable"),
    ),
    tag = "Accounts"
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<CreateAccountResponse>), AppError> {
    tracing::info!("POST /api/v1/accounts - salesforce_id: {:?}", payload.salesforce_id);

    let id = state.reconciler().create(payload).await?;
    Ok((StatusCode::CREATED, Json(CreateAccountResponse { id })))
}

/// GET /api/v1/accounts/:id
///
/// Retrieves an account by its internal id.
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}",
    params(("id" = String, Path, description = "Internal account id")),
    responses(
        (status = 200, description = "The account", body = Account),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Store unavailable"),
    ),
    tag = "Accounts"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Account>, AppError> {
    tracing::info!("GET /api/v1/accounts/{}", id);

    let account = state.reconciler().fetch_by_internal_id(&id).await?;
    Ok(Json(account))
}

/// PUT /api/v1/accounts/:id
///
/// Partial update by internal id. Only supplied, non-blank fields are
/// applied; an unmatched id reports zero modifications rather than 404.
#[utoipa::path(
    put,
    path = "/api/v1/accounts/{id}",
    params(("id" = String, Path, description = "Internal account id")),
    request_body = AccountPatch,
    responses(
        (status = 200, description = "Modification count", body = UpdateCountResponse),
        (status = 400, description = "Malformed id"),
        (status = 500, description = "Store unavailable"),
    ),
    tag = "Accounts"
)]
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<AccountPatch>,
) -> Result<Json<UpdateCountResponse>, AppError> {
    tracing::info!("PUT /api/v1/accounts/{}", id);

    let modified_count = state.reconciler().update_by_internal_id(&id, patch).await?;
    Ok(Json(UpdateCountResponse { modified_count }))
}

/// PATCH /api/v1/accounts/salesforce/:salesforce_id
///
/// Partial update keyed on the Salesforce id. 404 when no account carries
/// the id.
#[utoipa::path(
    patch,
    path = "/api/v1/accounts/salesforce/{salesforce_id}",
    params(("salesforce_id" = String, Path, description = "Salesforce account id")),
    request_body = AccountPatch,
    responses(
        (status = 200, description = "Modification count", body = UpdateCountResponse),
        (status = 400, description = "Empty salesforce_id"),
        (status = 404, description = "No account with this salesforce_id"),
        (status = 500, description = "Store unavailable"),
    ),
    tag = "Accounts"
)]
pub async fn update_account_by_salesforce_id(
    State(state): State<Arc<AppState>>,
    Path(salesforce_id): Path<String>,
    Json(patch): Json<AccountPatch>,
) -> Result<Json<UpdateCountResponse>, AppError> {
    tracing::info!("PATCH /api/v1/accounts/salesforce/{}", salesforce_id);

    let modified_count = state
        .reconciler()
        .update_by_external_id(&salesforce_id, patch)
        .await?;
    Ok(Json(UpdateCountResponse { modified_count }))
}

/// PUT /api/v1/accounts/salesforce/:salesforce_id
///
/// Idempotent upsert keyed on the Salesforce id.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `salesforce_id` - The Salesforce id to reconcile on.
/// * `payload` - The full attribute set (`name`, `email`, `phone`).
///
/// # Returns
///
/// * 200 with the tri-state outcome (`created`, `updated`, `unchanged`)
///   and the internal id of the record, or an error response.
#[utoipa::path(
    put,
    path = "/api/v1/accounts/salesforce/{salesforce_id}",
    params(("salesforce_id" = String, Path, description = "Salesforce account id")),
    request_body = UpsertAccountRequest,
    responses(
        (status = 200, description = "Upsert outcome", body = UpsertAccountResponse),
        (status = 400, description = "Missing required field"),
        (status = 409, description = "Concurrent insert for the same salesforce_id"),
        (status = 500, description = "Store unavailable"),
    ),
    tag = "Accounts"
)]
pub async fn upsert_account_by_salesforce_id(
    State(state): State<Arc<AppState>>,
    Path(salesforce_id): Path<String>,
    Json(payload): Json<UpsertAccountRequest>,
) -> Result<Json<UpsertAccountResponse>, AppError> {
    tracing::info!("PUT /api/v1/accounts/salesforce/{}", salesforce_id);

    let (outcome, id) = state
        .reconciler()
        .upsert_by_external_id(&salesforce_id, payload)
        .await?;

    tracing::info!(
        "Upsert for salesforce_id {} resolved as {:?} (account {})",
        salesforce_id,
        outcome,
        id
    );

    Ok(Json(UpsertAccountResponse { outcome, id }))
}
