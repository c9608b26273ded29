use sea_orm_migration::prelude::*;

mod m20240313_create_families_and_users;
mod m20240320_create_bank_accounts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240313_create_families_and_users::Migration),
            Box::new(m20240320_create_bank_accounts::Migration),
        ]
    }
}
