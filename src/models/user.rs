use serde::Serialize;

use crate::entities::users;

/// User data as exposed outside the repository layer. The password digest and
/// the MFA secret never leave the database through this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub is_admin: bool,
    pub can_view_all_accounts: bool,
    pub mfa_enabled: bool,
    pub family_id: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            is_admin: model.is_admin,
            can_view_all_accounts: model.can_view_all_accounts,
            mfa_enabled: model.mfa_enabled,
            family_id: model.family_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Emails are compared and stored case-insensitively.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
