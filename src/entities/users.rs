use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stored trimmed and lowercased.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_digest: String,

    pub is_admin: bool,

    pub can_view_all_accounts: bool,

    pub mfa_enabled: bool,

    /// Hex-encoded TOTP secret, present only while MFA is enabled.
    pub mfa_secret: Option<String>,

    pub family_id: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::families::Entity",
        from = "Column::FamilyId",
        to = "super::families::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Family,
    #[sea_orm(has_many = "super::bank_accounts::Entity")]
    OwnedBankAccounts,
    #[sea_orm(has_many = "super::user_bank_accounts::Entity")]
    UserBankAccounts,
}

impl Related<super::families::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Family.def()
    }
}

impl Related<super::bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OwnedBankAccounts.def()
    }
}

impl Related<super::user_bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserBankAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
