use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_id;
use super::{ApiError, AppState, FamilyParams};
use crate::models::family::Family;

/// POST /families
/// Creates the family together with its admin user.
pub async fn create_family(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Family>), ApiError> {
    let payload: FamilyParams = super::params(body, "family")?;

    let (family, admin) = state
        .account_service()
        .create_family(&payload.family_name, &payload.email, &payload.password)
        .await?;

    tracing::info!(family_id = family.id, admin_id = admin.id, "Family registered");
    Ok((StatusCode::CREATED, Json(family)))
}

/// DELETE /families/{id}
/// Only an admin of the family may delete it.
pub async fn delete_family(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let id = validate_id("family", id)?;

    state.account_service().delete_family(&actor, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
