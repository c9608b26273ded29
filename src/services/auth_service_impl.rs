//! `SeaORM` implementation of the `AuthService` trait.

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::db::repositories::user::hash_password_blocking;
use crate::models::user::{User, normalize_email};
use crate::services::auth_service::{AuthError, AuthService, SignInOutcome};
use crate::services::totp;
use async_trait::async_trait;
use tokio::sync::OnceCell;

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
    /// Hashed on first sign-in with the configured Argon2 params.
    dummy_digest: OnceCell<String>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, security: SecurityConfig) -> Self {
        Self {
            store,
            security,
            dummy_digest: OnceCell::new(),
        }
    }

    /// Digest an unknown email is verified against, so that miss costs the
    /// same as a wrong password.
    async fn dummy_digest(&self) -> Result<&str, AuthError> {
        let digest = self
            .dummy_digest
            .get_or_try_init(|| {
                hash_password_blocking("hearth-dummy-password".to_string(), self.security.clone())
            })
            .await?;
        Ok(digest.as_str())
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, AuthError> {
        let email = normalize_email(email);
        let dummy_digest = self.dummy_digest().await?;

        let user = self
            .store
            .verify_user_credentials(&email, password, dummy_digest)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if user.mfa_enabled {
            tracing::debug!(user_id = user.id, "Password accepted, verification code required");
            return Ok(SignInOutcome::MfaRequired(user.id));
        }

        Ok(SignInOutcome::Authenticated(user))
    }

    async fn verify_mfa(&self, user_id: i32, code: &str) -> Result<User, AuthError> {
        let secret = self
            .store
            .get_user_mfa_secret(user_id)
            .await?
            .ok_or(AuthError::InvalidCode)?;

        if !totp::verify(&secret, code, chrono::Utc::now().timestamp()) {
            return Err(AuthError::InvalidCode);
        }

        self.store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::InvalidCode)
    }

    async fn current_user(&self, user_id: i32) -> Result<Option<User>, AuthError> {
        Ok(self.store.get_user(user_id).await?)
    }
}
