use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(BankAccounts)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bank_accounts_user_id")
                    .table(BankAccounts)
                    .col(crate::entities::bank_accounts::Column::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Join tables: explicit shares and family links.
        manager
            .create_table(
                schema
                    .create_table_from_entity(UserBankAccounts)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(FamilyBankAccounts)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FamilyBankAccounts).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserBankAccounts).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(BankAccounts).to_owned())
            .await?;

        Ok(())
    }
}
