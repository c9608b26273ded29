use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entities::bank_accounts;

/// Balances are kept below this magnitude, exclusive.
pub const MONEY_LIMIT: i64 = 100_000_000;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[sea_orm(num_value = 0)]
    Family,
    #[sea_orm(num_value = 1)]
    Personal,
}

impl AccountType {
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Family => "Family Bank Account",
            Self::Personal => "Personal Bank Account",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankAccount {
    pub id: i32,
    pub account_number: String,
    pub account_name: String,
    pub available_balance: Decimal,
    pub institutional_name: String,
    pub debt: Decimal,
    pub account_type: AccountType,
    pub account_type_name: &'static str,
    pub user_id: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<bank_accounts::Model> for BankAccount {
    fn from(model: bank_accounts::Model) -> Self {
        let account_type_name = account_type_name(&model);
        Self {
            id: model.id,
            account_number: model.account_number,
            account_name: model.account_name,
            available_balance: parse_money(&model.available_balance),
            institutional_name: model.institutional_name,
            debt: parse_money(&model.debt),
            account_type: model.account_type,
            account_type_name,
            user_id: model.user_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Human readable name for the kind of account.
#[must_use]
pub const fn account_type_name(account: &bank_accounts::Model) -> &'static str {
    account.account_type.display_name()
}

/// Rounds half away from zero to cents and fixes the scale at two places so
/// `12.5` renders as `12.50`.
#[must_use]
pub fn to_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Reads a stored money column. Columns are only ever written from
/// [`to_money`], so anything unparsable is treated as zero.
#[must_use]
pub fn parse_money(stored: &str) -> Decimal {
    to_money(Decimal::from_str_exact(stored.trim()).unwrap_or_default())
}

/// Checked after rounding, so `99999999.995` is rejected.
#[must_use]
pub fn fits_money_column(value: Decimal) -> bool {
    to_money(value).abs() < Decimal::from(MONEY_LIMIT)
}
