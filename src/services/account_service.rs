//! Domain service for families and their members.
//!
//! Owns the family lifecycle (created together with its admin, deleted with
//! everything its members own) and user create/update/delete.

use serde::Serialize;
use thiserror::Error;

use crate::models::family::Family;
use crate::models::user::User;

/// Errors specific to family and user management.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Not allowed to manage this {0}")]
    Forbidden(&'static str),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Input for a new member. The family is always the acting user's.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub is_admin: bool,
    pub can_view_all_accounts: bool,
    pub mfa_enabled: bool,
}

/// Fields a user update may touch. `None` leaves the column as it is.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
    pub can_view_all_accounts: Option<bool>,
    pub mfa_enabled: Option<bool>,
}

/// A user together with an MFA secret that was provisioned by the same call.
/// The secret is only ever handed out here.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionedUser {
    #[serde(flatten)]
    pub user: User,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfa_secret: Option<String>,
}

/// Domain service trait for families and users.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Creates a family and its initiating admin in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Validation`] with the family's messages if the
    /// family is invalid, otherwise with the admin's messages.
    async fn create_family(
        &self,
        family_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(Family, User), AccountError>;

    /// Deletes a family, its members and their accounts. Only an admin of
    /// that family may do so.
    async fn delete_family(&self, actor: &User, id: i32) -> Result<(), AccountError>;

    /// Looks up a user by id.
    async fn get_user(&self, id: i32) -> Result<User, AccountError>;

    /// Adds a member to the actor's family.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Forbidden`] when a non-admin asks for the admin
    /// or view-all flags, and [`AccountError::Validation`] for bad credentials
    /// or a taken email.
    async fn create_user(
        &self,
        actor: &User,
        user: NewUser,
    ) -> Result<ProvisionedUser, AccountError>;

    /// Applies the given changes, re-validating any new email or password.
    ///
    /// # Errors
    ///
    /// Users outside the actor's family are [`AccountError::NotFound`]. Only
    /// the user themselves or a family admin may make changes, and only an
    /// admin may change the privilege flags. The last admin of a family keeps
    /// both flags.
    async fn update_user(
        &self,
        actor: &User,
        id: i32,
        changes: UserChanges,
    ) -> Result<ProvisionedUser, AccountError>;

    /// Deletes a user and the accounts they own. Same authorization as
    /// [`AccountService::update_user`]; the last admin of a family cannot be
    /// deleted.
    async fn delete_user(&self, actor: &User, id: i32) -> Result<(), AccountError>;
}
