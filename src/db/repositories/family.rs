use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
    Set, TransactionTrait,
};

use super::user::{NewUserRecord, delete_users, insert_user};
use crate::entities::{families, family_bank_accounts, prelude::*, users};
use crate::models::family::Family;
use crate::models::user::User;

pub struct FamilyRepository {
    conn: DatabaseConnection,
}

impl FamilyRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<Family>> {
        let family = Families::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query family by ID")?;

        Ok(family.map(Family::from))
    }

    /// Creates the family and its admin in one transaction. If the admin insert
    /// fails the family row is rolled back with it.
    pub async fn create_with_admin(
        &self,
        family_name: &str,
        admin: NewUserRecord,
    ) -> Result<(Family, User)> {
        let txn = self.conn.begin().await?;
        let now = chrono::Utc::now().to_rfc3339();

        let family = families::ActiveModel {
            family_name: Set(family_name.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let admin = insert_user(
            &txn,
            NewUserRecord {
                family_id: family.id,
                ..admin
            },
        )
        .await?;

        txn.commit().await?;

        tracing::info!(family_id = family.id, admin_id = admin.id, "Created family");
        Ok((Family::from(family), User::from(admin)))
    }

    /// Deletes the family, its members and everything they own.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let members: Vec<i32> = Users::find()
            .select_only()
            .column(users::Column::Id)
            .filter(users::Column::FamilyId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        delete_users(&txn, &members).await?;

        FamilyBankAccounts::delete_many()
            .filter(family_bank_accounts::Column::FamilyId.eq(id))
            .exec(&txn)
            .await?;

        let result = Families::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        let removed = result.rows_affected > 0;
        if removed {
            tracing::info!("Removed family with ID: {} ({} members)", id, members.len());
        }
        Ok(removed)
    }
}
