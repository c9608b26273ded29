use sea_orm::entity::prelude::*;

use crate::models::bank_account::AccountType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bank_accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub account_number: String,

    pub account_name: String,

    /// Exact decimal text with two places, e.g. `"1500.50"`.
    pub available_balance: String,

    pub institutional_name: String,

    /// Exact decimal text with two places.
    pub debt: String,

    pub account_type: AccountType,

    /// Owner of the account.
    pub user_id: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(has_many = "super::user_bank_accounts::Entity")]
    UserBankAccounts,
    #[sea_orm(has_many = "super::family_bank_accounts::Entity")]
    FamilyBankAccounts,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::user_bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserBankAccounts.def()
    }
}

impl Related<super::family_bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FamilyBankAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
