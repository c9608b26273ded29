//! Domain service for authentication.
//!
//! Verifies email/password pairs and drives the optional TOTP second factor.
//! Session bookkeeping (who is signed in, pending verifications, attempt
//! counts) stays in the HTTP layer.

use thiserror::Error;

use crate::models::user::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid verification code")]
    InvalidCode,

    #[error("No sign-in is awaiting verification")]
    NoPendingSignIn,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result of a successful password check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    /// The user is fully authenticated.
    Authenticated(User),

    /// The password was right but a verification code is still needed.
    MfaRequired(i32),
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Checks an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email and for a
    /// wrong password alike.
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, AuthError>;

    /// Checks a TOTP code for a user whose password was already accepted.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCode`] if the code does not match.
    async fn verify_mfa(&self, user_id: i32, code: &str) -> Result<User, AuthError>;

    /// Resolves the user behind a session, if they still exist.
    async fn current_user(&self, user_id: i32) -> Result<Option<User>, AuthError>;
}
