use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::BTreeSet;

use crate::entities::{
    bank_accounts, family_bank_accounts, prelude::*, user_bank_accounts, users,
};
use crate::models::bank_account::{AccountType, to_money};
use crate::models::user::User;

#[derive(Debug, Clone)]
pub struct NewBankAccountRecord {
    pub account_number: String,
    pub account_name: String,
    pub available_balance: Decimal,
    pub institutional_name: String,
    pub debt: Decimal,
    pub account_type: AccountType,
    pub user_id: i32,
}

#[derive(Debug, Clone, Default)]
pub struct BankAccountRecordChanges {
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub available_balance: Option<Decimal>,
    pub institutional_name: Option<String>,
    pub debt: Option<Decimal>,
    pub account_type: Option<AccountType>,
}

pub struct BankAccountRepository {
    conn: DatabaseConnection,
}

impl BankAccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Every account the viewer may see, ordered by id.
    pub async fn list_visible(&self, viewer: &User) -> Result<Vec<bank_accounts::Model>> {
        let ids = self.visible_ids(viewer).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        BankAccounts::find()
            .filter(bank_accounts::Column::Id.is_in(ids))
            .order_by_asc(bank_accounts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list bank accounts")
    }

    pub async fn is_visible(&self, viewer: &User, id: i32) -> Result<bool> {
        Ok(self.visible_ids(viewer).await?.contains(&id))
    }

    async fn visible_ids(&self, viewer: &User) -> Result<BTreeSet<i32>> {
        let mut owners = vec![viewer.id];
        if viewer.can_view_all_accounts {
            owners = Users::find()
                .select_only()
                .column(users::Column::Id)
                .filter(users::Column::FamilyId.eq(viewer.family_id))
                .into_tuple()
                .all(&self.conn)
                .await
                .context("Failed to list family members")?;
        }

        let owned: Vec<i32> = BankAccounts::find()
            .select_only()
            .column(bank_accounts::Column::Id)
            .filter(bank_accounts::Column::UserId.is_in(owners))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query owned accounts")?;

        let shared: Vec<i32> = UserBankAccounts::find()
            .select_only()
            .column(user_bank_accounts::Column::BankAccountId)
            .filter(user_bank_accounts::Column::UserId.eq(viewer.id))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query shared accounts")?;

        let family: Vec<i32> = FamilyBankAccounts::find()
            .select_only()
            .column(family_bank_accounts::Column::BankAccountId)
            .filter(family_bank_accounts::Column::FamilyId.eq(viewer.family_id))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query family accounts")?;

        Ok(owned.into_iter().chain(shared).chain(family).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<bank_accounts::Model>> {
        BankAccounts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query bank account")
    }

    /// Inserts the account, its owner and share rows, and the family link for
    /// family accounts, in one transaction.
    pub async fn create(
        &self,
        record: NewBankAccountRecord,
        shared_with: &[i32],
        family_id: i32,
    ) -> Result<bank_accounts::Model> {
        let txn = self.conn.begin().await?;
        let now = chrono::Utc::now().to_rfc3339();
        let owner_id = record.user_id;
        let account_type = record.account_type;

        let account = bank_accounts::ActiveModel {
            account_number: Set(record.account_number),
            account_name: Set(record.account_name),
            available_balance: Set(to_money(record.available_balance).to_string()),
            institutional_name: Set(record.institutional_name),
            debt: Set(to_money(record.debt).to_string()),
            account_type: Set(record.account_type),
            user_id: Set(record.user_id),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let members: BTreeSet<i32> = std::iter::once(owner_id)
            .chain(shared_with.iter().copied())
            .collect();
        let rows: Vec<user_bank_accounts::ActiveModel> = members
            .into_iter()
            .map(|user_id| user_bank_accounts::ActiveModel {
                user_id: Set(user_id),
                bank_account_id: Set(account.id),
            })
            .collect();
        UserBankAccounts::insert_many(rows)
            .exec_without_returning(&txn)
            .await?;

        if account_type == AccountType::Family {
            link_family(&txn, family_id, account.id).await?;
        }

        txn.commit().await?;
        Ok(account)
    }

    /// Applies changes; moving between account types adds or drops the family link.
    pub async fn update(
        &self,
        id: i32,
        changes: BankAccountRecordChanges,
        family_id: i32,
    ) -> Result<Option<bank_accounts::Model>> {
        let txn = self.conn.begin().await?;

        let Some(existing) = BankAccounts::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };
        let previous_type = existing.account_type;

        let mut active: bank_accounts::ActiveModel = existing.into();
        if let Some(number) = changes.account_number {
            active.account_number = Set(number);
        }
        if let Some(name) = changes.account_name {
            active.account_name = Set(name);
        }
        if let Some(balance) = changes.available_balance {
            active.available_balance = Set(to_money(balance).to_string());
        }
        if let Some(institution) = changes.institutional_name {
            active.institutional_name = Set(institution);
        }
        if let Some(debt) = changes.debt {
            active.debt = Set(to_money(debt).to_string());
        }
        if let Some(account_type) = changes.account_type {
            active.account_type = Set(account_type);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&txn).await?;

        match (previous_type, updated.account_type) {
            (AccountType::Personal, AccountType::Family) => {
                link_family(&txn, family_id, updated.id).await?;
            }
            (AccountType::Family, AccountType::Personal) => {
                FamilyBankAccounts::delete_many()
                    .filter(family_bank_accounts::Column::BankAccountId.eq(updated.id))
                    .exec(&txn)
                    .await?;
            }
            _ => {}
        }

        txn.commit().await?;
        Ok(Some(updated))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;
        let removed = delete_accounts(&txn, &[id]).await? > 0;
        txn.commit().await?;

        if removed {
            tracing::info!("Removed bank account with ID: {}", id);
        }
        Ok(removed)
    }
}

async fn link_family<C: ConnectionTrait>(conn: &C, family_id: i32, account_id: i32) -> Result<()> {
    FamilyBankAccounts::insert(family_bank_accounts::ActiveModel {
        family_id: Set(family_id),
        bank_account_id: Set(account_id),
    })
    .exec_without_returning(conn)
    .await?;
    Ok(())
}

/// Deletes accounts and their join rows. Returns the number of accounts removed.
pub(crate) async fn delete_accounts<C: ConnectionTrait>(conn: &C, ids: &[i32]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    UserBankAccounts::delete_many()
        .filter(user_bank_accounts::Column::BankAccountId.is_in(ids.to_vec()))
        .exec(conn)
        .await?;

    FamilyBankAccounts::delete_many()
        .filter(family_bank_accounts::Column::BankAccountId.is_in(ids.to_vec()))
        .exec(conn)
        .await?;

    let result = BankAccounts::delete_many()
        .filter(bank_accounts::Column::Id.is_in(ids.to_vec()))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}
