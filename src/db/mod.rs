use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::bank_accounts;
use crate::models::family::Family;
use crate::models::user::User;

pub mod migrator;
pub mod repositories;

pub use repositories::bank_account::{BankAccountRecordChanges, NewBankAccountRecord};
pub use repositories::user::{NewUserRecord, UserRecordChanges};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn family_repo(&self) -> repositories::family::FamilyRepository {
        repositories::family::FamilyRepository::new(self.conn.clone())
    }

    fn bank_account_repo(&self) -> repositories::bank_account::BankAccountRepository {
        repositories::bank_account::BankAccountRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    // ========== Families ==========

    pub async fn get_family(&self, id: i32) -> Result<Option<Family>> {
        self.family_repo().get(id).await
    }

    pub async fn create_family_with_admin(
        &self,
        family_name: &str,
        admin: NewUserRecord,
    ) -> Result<(Family, User)> {
        self.family_repo().create_with_admin(family_name, admin).await
    }

    pub async fn delete_family(&self, id: i32) -> Result<bool> {
        self.family_repo().delete(id).await
    }

    // ========== Users ==========

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn email_taken(&self, email: &str, except_id: Option<i32>) -> Result<bool> {
        self.user_repo().email_taken(email, except_id).await
    }

    pub async fn family_member_ids(&self, family_id: i32) -> Result<Vec<i32>> {
        self.user_repo().ids_in_family(family_id).await
    }

    pub async fn get_user_mfa_secret(&self, id: i32) -> Result<Option<String>> {
        self.user_repo().get_mfa_secret(id).await
    }

    pub async fn create_user(&self, record: NewUserRecord) -> Result<User> {
        self.user_repo().create(record).await
    }

    pub async fn count_family_admins(&self, family_id: i32) -> Result<u64> {
        self.user_repo().count_admins(family_id).await
    }

    pub async fn verify_user_credentials(
        &self,
        email: &str,
        password: &str,
        dummy_digest: &str,
    ) -> Result<Option<User>> {
        self.user_repo()
            .verify_credentials(email, password, dummy_digest)
            .await
    }

    pub async fn update_user(&self, id: i32, changes: UserRecordChanges) -> Result<Option<User>> {
        self.user_repo().update(id, changes).await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    // ========== Bank accounts ==========

    pub async fn list_visible_bank_accounts(
        &self,
        viewer: &User,
    ) -> Result<Vec<bank_accounts::Model>> {
        self.bank_account_repo().list_visible(viewer).await
    }

    pub async fn is_bank_account_visible(&self, viewer: &User, id: i32) -> Result<bool> {
        self.bank_account_repo().is_visible(viewer, id).await
    }

    pub async fn get_bank_account(&self, id: i32) -> Result<Option<bank_accounts::Model>> {
        self.bank_account_repo().get(id).await
    }

    pub async fn create_bank_account(
        &self,
        record: NewBankAccountRecord,
        shared_with: &[i32],
        family_id: i32,
    ) -> Result<bank_accounts::Model> {
        self.bank_account_repo()
            .create(record, shared_with, family_id)
            .await
    }

    pub async fn update_bank_account(
        &self,
        id: i32,
        changes: BankAccountRecordChanges,
        family_id: i32,
    ) -> Result<Option<bank_accounts::Model>> {
        self.bank_account_repo()
            .update(id, changes, family_id)
            .await
    }

    pub async fn delete_bank_account(&self, id: i32) -> Result<bool> {
        self.bank_account_repo().delete(id).await
    }
}

/// Fresh migrated database in a temp file, for unit tests that need a store.
#[cfg(test)]
pub(crate) async fn test_store() -> Store {
    let path = std::env::temp_dir().join(format!("hearth-unit-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", path.display()))
        .await
        .expect("failed to open test store")
}
