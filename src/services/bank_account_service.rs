//! Domain service for bank accounts.
//!
//! Every operation runs on behalf of a signed-in viewer. An account is visible
//! to the viewer when they own it, it was shared with them, it is linked to
//! their family, or they may view all accounts and the owner is in their
//! family. Only the owner or an admin of the owner's family may change it.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::bank_account::{AccountType, BankAccount};
use crate::models::user::User;

/// Errors specific to bank account operations.
#[derive(Debug, Error)]
pub enum BankAccountError {
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Bank account not found")]
    NotFound,

    #[error("Not allowed to modify this bank account")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for BankAccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for BankAccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct NewBankAccount {
    pub account_number: String,
    pub account_name: String,
    pub available_balance: Decimal,
    pub institutional_name: String,
    pub debt: Decimal,
    pub account_type: AccountType,
    /// Family members the account is shared with, besides the owner.
    pub shared_with_user_ids: Vec<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct BankAccountChanges {
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub available_balance: Option<Decimal>,
    pub institutional_name: Option<String>,
    pub debt: Option<Decimal>,
    pub account_type: Option<AccountType>,
}

/// Domain service trait for bank accounts.
#[async_trait::async_trait]
pub trait BankAccountService: Send + Sync {
    /// Lists the accounts visible to the viewer, ordered by id.
    async fn index(&self, viewer: &User) -> Result<Vec<BankAccount>, BankAccountError>;

    /// Gets one account.
    ///
    /// # Errors
    ///
    /// Returns [`BankAccountError::NotFound`] if it does not exist or is not visible.
    async fn select(&self, viewer: &User, id: i32) -> Result<BankAccount, BankAccountError>;

    /// Creates an account owned by the viewer.
    async fn create(
        &self,
        viewer: &User,
        account: NewBankAccount,
    ) -> Result<BankAccount, BankAccountError>;

    /// Updates an account.
    ///
    /// # Errors
    ///
    /// Returns [`BankAccountError::Forbidden`] if the viewer can see the
    /// account but is neither its owner nor an admin of the owner's family.
    async fn update(
        &self,
        viewer: &User,
        id: i32,
        changes: BankAccountChanges,
    ) -> Result<BankAccount, BankAccountError>;

    /// Deletes an account, with the same authorization as [`Self::update`].
    async fn destroy(&self, viewer: &User, id: i32) -> Result<(), BankAccountError>;
}
