use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_id;
use super::{ApiError, AppState, CreateBankAccountParams, UpdateBankAccountParams};
use crate::models::bank_account::BankAccount;

/// GET /bank_accounts
pub async fn index(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(viewer)): Extension<CurrentUser>,
) -> Result<Json<Vec<BankAccount>>, ApiError> {
    let accounts = state.bank_account_service().index(&viewer).await?;
    Ok(Json(accounts))
}

/// GET /bank_accounts/{id}
pub async fn select(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(viewer)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<BankAccount>, ApiError> {
    let id = validate_id("bank account", id)?;
    let account = state.bank_account_service().select(&viewer, id).await?;
    Ok(Json(account))
}

/// POST /bank_accounts
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(viewer)): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<BankAccount>), ApiError> {
    let payload: CreateBankAccountParams = super::params(body, "bank_account")?;

    let account = state
        .bank_account_service()
        .create(&viewer, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// PATCH/PUT /bank_accounts/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(viewer)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(body): Json<Value>,
) -> Result<Json<BankAccount>, ApiError> {
    let id = validate_id("bank account", id)?;
    let payload: UpdateBankAccountParams = super::params(body, "bank_account")?;

    let account = state
        .bank_account_service()
        .update(&viewer, id, payload.into())
        .await?;

    Ok(Json(account))
}

/// DELETE /bank_accounts/{id}
pub async fn destroy(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(viewer)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let id = validate_id("bank account", id)?;

    state.bank_account_service().destroy(&viewer, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
