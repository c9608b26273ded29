//! `SeaORM` implementation of the `BankAccountService` trait.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::db::{BankAccountRecordChanges, NewBankAccountRecord, Store};
use crate::entities::bank_accounts;
use crate::models::bank_account::{BankAccount, MONEY_LIMIT, fits_money_column, to_money};
use crate::models::user::User;
use crate::services::bank_account_service::{
    BankAccountChanges, BankAccountError, BankAccountService, NewBankAccount,
};

pub const ACCOUNT_NAME_BLANK: &str = "Account name can't be blank";
pub const ACCOUNT_NUMBER_BLANK: &str = "Account number can't be blank";

pub struct SeaOrmBankAccountService {
    store: Store,
}

impl SeaOrmBankAccountService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Loads an account the viewer can see, or `NotFound`.
    async fn visible(
        &self,
        viewer: &User,
        id: i32,
    ) -> Result<bank_accounts::Model, BankAccountError> {
        if !self.store.is_bank_account_visible(viewer, id).await? {
            return Err(BankAccountError::NotFound);
        }

        self.store
            .get_bank_account(id)
            .await?
            .ok_or(BankAccountError::NotFound)
    }

    /// Owner or family admin. Returns the owner's family id.
    async fn authorize_change(
        &self,
        viewer: &User,
        account: &bank_accounts::Model,
    ) -> Result<i32, BankAccountError> {
        if account.user_id == viewer.id {
            return Ok(viewer.family_id);
        }

        let owner = self
            .store
            .get_user(account.user_id)
            .await?
            .ok_or(BankAccountError::NotFound)?;

        if viewer.is_admin && owner.family_id == viewer.family_id {
            Ok(owner.family_id)
        } else {
            Err(BankAccountError::Forbidden)
        }
    }
}

fn money_error(field: &str, value: Decimal) -> Option<String> {
    (!fits_money_column(value))
        .then(|| format!("{field} must be less than {MONEY_LIMIT} in magnitude"))
}

fn blank_error(value: &str, message: &str) -> Option<String> {
    value.trim().is_empty().then(|| message.to_string())
}

#[async_trait]
impl BankAccountService for SeaOrmBankAccountService {
    async fn index(&self, viewer: &User) -> Result<Vec<BankAccount>, BankAccountError> {
        let accounts = self.store.list_visible_bank_accounts(viewer).await?;
        Ok(accounts.into_iter().map(BankAccount::from).collect())
    }

    async fn select(&self, viewer: &User, id: i32) -> Result<BankAccount, BankAccountError> {
        let account = self.visible(viewer, id).await?;
        Ok(BankAccount::from(account))
    }

    async fn create(
        &self,
        viewer: &User,
        account: NewBankAccount,
    ) -> Result<BankAccount, BankAccountError> {
        let mut errors: Vec<String> = [
            blank_error(&account.account_name, ACCOUNT_NAME_BLANK),
            blank_error(&account.account_number, ACCOUNT_NUMBER_BLANK),
            money_error("Available balance", account.available_balance),
            money_error("Debt", account.debt),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !account.shared_with_user_ids.is_empty() {
            let members = self.store.family_member_ids(viewer.family_id).await?;
            for id in &account.shared_with_user_ids {
                if !members.contains(id) {
                    errors.push(format!("Shared user {id} is not a member of this family"));
                }
            }
        }

        if !errors.is_empty() {
            return Err(BankAccountError::Validation(errors));
        }

        let record = NewBankAccountRecord {
            account_number: account.account_number.trim().to_string(),
            account_name: account.account_name.trim().to_string(),
            available_balance: to_money(account.available_balance),
            institutional_name: account.institutional_name.trim().to_string(),
            debt: to_money(account.debt),
            account_type: account.account_type,
            user_id: viewer.id,
        };

        let created = self
            .store
            .create_bank_account(record, &account.shared_with_user_ids, viewer.family_id)
            .await?;

        tracing::info!(
            bank_account_id = created.id,
            user_id = viewer.id,
            "Created bank account"
        );
        Ok(BankAccount::from(created))
    }

    async fn update(
        &self,
        viewer: &User,
        id: i32,
        changes: BankAccountChanges,
    ) -> Result<BankAccount, BankAccountError> {
        let account = self.visible(viewer, id).await?;
        let family_id = self.authorize_change(viewer, &account).await?;

        let errors: Vec<String> = [
            changes
                .account_name
                .as_deref()
                .and_then(|name| blank_error(name, ACCOUNT_NAME_BLANK)),
            changes
                .account_number
                .as_deref()
                .and_then(|number| blank_error(number, ACCOUNT_NUMBER_BLANK)),
            changes
                .available_balance
                .and_then(|value| money_error("Available balance", value)),
            changes.debt.and_then(|value| money_error("Debt", value)),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !errors.is_empty() {
            return Err(BankAccountError::Validation(errors));
        }

        let record_changes = BankAccountRecordChanges {
            account_number: changes.account_number.map(|s| s.trim().to_string()),
            account_name: changes.account_name.map(|s| s.trim().to_string()),
            available_balance: changes.available_balance.map(to_money),
            institutional_name: changes.institutional_name.map(|s| s.trim().to_string()),
            debt: changes.debt.map(to_money),
            account_type: changes.account_type,
        };

        let updated = self
            .store
            .update_bank_account(id, record_changes, family_id)
            .await?
            .ok_or(BankAccountError::NotFound)?;

        Ok(BankAccount::from(updated))
    }

    async fn destroy(&self, viewer: &User, id: i32) -> Result<(), BankAccountError> {
        let account = self.visible(viewer, id).await?;
        self.authorize_change(viewer, &account).await?;

        if self.store.delete_bank_account(id).await? {
            Ok(())
        } else {
            Err(BankAccountError::NotFound)
        }
    }
}
