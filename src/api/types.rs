use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiError;
use crate::models::bank_account::AccountType;
use crate::services::{BankAccountChanges, NewBankAccount, NewUser, UserChanges};

// ============================================================================
// Response bodies
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationErrorBody {
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfa_required: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

// ============================================================================
// Request parameters
// ============================================================================

/// Reads request parameters either nested under `root` (`{"user": {...}}`)
/// or given flat at the top level.
pub fn params<T: DeserializeOwned>(body: Value, root: &str) -> Result<T, ApiError> {
    let body = match body {
        Value::Object(mut map) if map.get(root).is_some_and(Value::is_object) => {
            map.remove(root).unwrap_or(Value::Null)
        }
        other => other,
    };

    serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid {root} parameters: {e}")))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FamilyParams {
    pub family_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateUserParams {
    pub email: String,
    pub password: String,
    pub is_admin: bool,
    pub can_view_all_accounts: bool,
    pub mfa_enabled: bool,
}

impl From<CreateUserParams> for NewUser {
    fn from(params: CreateUserParams) -> Self {
        Self {
            email: params.email,
            password: params.password,
            is_admin: params.is_admin,
            can_view_all_accounts: params.can_view_all_accounts,
            mfa_enabled: params.mfa_enabled,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUserParams {
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
    pub can_view_all_accounts: Option<bool>,
    pub mfa_enabled: Option<bool>,
}

impl From<UpdateUserParams> for UserChanges {
    fn from(params: UpdateUserParams) -> Self {
        Self {
            email: params.email,
            password: params.password,
            is_admin: params.is_admin,
            can_view_all_accounts: params.can_view_all_accounts,
            mfa_enabled: params.mfa_enabled,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignInParams {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyCodeParams {
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CreateBankAccountParams {
    pub account_number: String,
    pub account_name: String,
    pub available_balance: Decimal,
    pub institutional_name: String,
    pub debt: Decimal,
    pub account_type: AccountType,
    pub shared_with_user_ids: Vec<i32>,
}

impl Default for CreateBankAccountParams {
    fn default() -> Self {
        Self {
            account_number: String::new(),
            account_name: String::new(),
            available_balance: Decimal::ZERO,
            institutional_name: String::new(),
            debt: Decimal::ZERO,
            account_type: AccountType::Personal,
            shared_with_user_ids: Vec::new(),
        }
    }
}

impl From<CreateBankAccountParams> for NewBankAccount {
    fn from(params: CreateBankAccountParams) -> Self {
        Self {
            account_number: params.account_number,
            account_name: params.account_name,
            available_balance: params.available_balance,
            institutional_name: params.institutional_name,
            debt: params.debt,
            account_type: params.account_type,
            shared_with_user_ids: params.shared_with_user_ids,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateBankAccountParams {
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub available_balance: Option<Decimal>,
    pub institutional_name: Option<String>,
    pub debt: Option<Decimal>,
    pub account_type: Option<AccountType>,
}

impl From<UpdateBankAccountParams> for BankAccountChanges {
    fn from(params: UpdateBankAccountParams) -> Self {
        Self {
            account_number: params.account_number,
            account_name: params.account_name,
            available_balance: params.available_balance,
            institutional_name: params.institutional_name,
            debt: params.debt,
            account_type: params.account_type,
        }
    }
}
