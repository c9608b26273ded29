use axum::{
    Extension, Json,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, AppState, MessageResponse, SignInParams, SignInResponse, VerifyCodeParams};
use crate::models::user::User;
use crate::services::{AuthError, SignInOutcome};

// ============================================================================
// Session keys
// ============================================================================

pub const USER_ID_KEY: &str = "user_id";
pub const PENDING_MFA_KEY: &str = "pending_mfa_user_id";
pub const MFA_ATTEMPTS_KEY: &str = "mfa_attempts";

/// The signed-in user, placed in request extensions by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the session's `user_id` to a user and rejects the request if
/// there is none. Sessions pointing at a deleted user are flushed.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(user_id) = session.get::<i32>(USER_ID_KEY).await? else {
        return Err(ApiError::unauthorized());
    };

    let Some(user) = state.auth_service().current_user(user_id).await? else {
        tracing::debug!(user_id, "Session refers to a user that no longer exists");
        session.flush().await?;
        return Err(ApiError::unauthorized());
    };

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

async fn establish(session: &Session, user: &User) -> Result<SignInResponse, ApiError> {
    session.remove::<i32>(PENDING_MFA_KEY).await?;
    session.remove::<u32>(MFA_ATTEMPTS_KEY).await?;
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user.id).await?;

    tracing::info!(user_id = user.id, "User signed in");
    Ok(SignInResponse {
        message: "User signed in successfully".to_string(),
        user_id: Some(user.id),
        mfa_required: None,
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /users/signin
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(body): Json<Value>,
) -> Result<Json<SignInResponse>, ApiError> {
    let payload: SignInParams = super::params(body, "user")?;

    let outcome = match state
        .auth_service()
        .sign_in(&payload.email, &payload.password)
        .await
    {
        Ok(outcome) => outcome,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Rejected sign-in attempt");
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(e) => return Err(e.into()),
    };

    match outcome {
        SignInOutcome::Authenticated(user) => Ok(Json(establish(&session, &user).await?)),
        SignInOutcome::MfaRequired(user_id) => {
            session.remove::<i32>(USER_ID_KEY).await?;
            session.insert(PENDING_MFA_KEY, user_id).await?;
            session.insert(MFA_ATTEMPTS_KEY, 0u32).await?;

            Ok(Json(SignInResponse {
                message: "Verification code required".to_string(),
                user_id: None,
                mfa_required: Some(true),
            }))
        }
    }
}

/// POST /users/signin/verify
/// Completes a sign-in that is waiting on a TOTP code.
pub async fn verify_code(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(body): Json<Value>,
) -> Result<Json<SignInResponse>, ApiError> {
    let payload: VerifyCodeParams = super::params(body, "user")?;

    let Some(pending) = session.get::<i32>(PENDING_MFA_KEY).await? else {
        return Err(AuthError::NoPendingSignIn.into());
    };

    match state.auth_service().verify_mfa(pending, &payload.code).await {
        Ok(user) => Ok(Json(establish(&session, &user).await?)),
        Err(AuthError::InvalidCode) => {
            let attempts = session
                .get::<u32>(MFA_ATTEMPTS_KEY)
                .await?
                .unwrap_or(0)
                .saturating_add(1);

            if attempts >= state.config().security.mfa_max_attempts {
                tracing::warn!(user_id = pending, "Too many invalid verification codes");
                session.remove::<i32>(PENDING_MFA_KEY).await?;
                session.remove::<u32>(MFA_ATTEMPTS_KEY).await?;
            } else {
                session.insert(MFA_ATTEMPTS_KEY, attempts).await?;
            }

            Err(AuthError::InvalidCode.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /users/signout
pub async fn sign_out(session: Session) -> Result<Json<MessageResponse>, ApiError> {
    session.flush().await?;

    Ok(Json(MessageResponse {
        message: "User signed out successfully".to_string(),
    }))
}

/// GET /users/me
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}
