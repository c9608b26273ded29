use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_id;
use super::{ApiError, AppState, CreateUserParams, UpdateUserParams};
use crate::services::ProvisionedUser;

/// POST /users
/// The new user always joins the family of whoever is signed in.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<ProvisionedUser>), ApiError> {
    let payload: CreateUserParams = super::params(body, "user")?;

    let created = state
        .account_service()
        .create_user(&actor, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH/PUT /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(body): Json<Value>,
) -> Result<Json<ProvisionedUser>, ApiError> {
    let id = validate_id("user", id)?;
    let payload: UpdateUserParams = super::params(body, "user")?;

    let updated = state
        .account_service()
        .update_user(&actor, id, payload.into())
        .await?;

    Ok(Json(updated))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let id = validate_id("user", id)?;

    state.account_service().delete_user(&actor, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
