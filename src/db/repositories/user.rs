use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{bank_accounts, prelude::*, user_bank_accounts, users};
use crate::models::user::User;

/// Column values for a user about to be inserted. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub email: String,
    pub password_digest: String,
    pub is_admin: bool,
    pub can_view_all_accounts: bool,
    pub mfa_secret: Option<String>,
    pub family_id: i32,
}

/// Partial update. `mfa_secret: Some(None)` clears the secret and disables MFA.
#[derive(Debug, Clone, Default)]
pub struct UserRecordChanges {
    pub email: Option<String>,
    pub password_digest: Option<String>,
    pub is_admin: Option<bool>,
    pub can_view_all_accounts: Option<bool>,
    pub mfa_secret: Option<Option<String>>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    /// Whether another user already holds this email.
    pub async fn email_taken(&self, email: &str, except_id: Option<i32>) -> Result<bool> {
        let mut query = Users::find().filter(users::Column::Email.eq(email));
        if let Some(id) = except_id {
            query = query.filter(users::Column::Id.ne(id));
        }

        let existing = query
            .one(&self.conn)
            .await
            .context("Failed to check email uniqueness")?;

        Ok(existing.is_some())
    }

    pub async fn ids_in_family(&self, family_id: i32) -> Result<Vec<i32>> {
        Users::find()
            .select_only()
            .column(users::Column::Id)
            .filter(users::Column::FamilyId.eq(family_id))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to list family members")
    }

    pub async fn count_admins(&self, family_id: i32) -> Result<u64> {
        Users::find()
            .filter(users::Column::FamilyId.eq(family_id))
            .filter(users::Column::IsAdmin.eq(true))
            .count(&self.conn)
            .await
            .context("Failed to count family admins")
    }

    pub async fn get_mfa_secret(&self, id: i32) -> Result<Option<String>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for MFA secret")?;

        Ok(user.and_then(|u| u.mfa_secret))
    }

    pub async fn create(&self, record: NewUserRecord) -> Result<User> {
        let model = insert_user(&self.conn, record).await?;
        Ok(User::from(model))
    }

    /// Verify an email/password pair and return the user on success.
    /// Argon2 runs in a blocking task because it is CPU-intensive. An unknown
    /// email is checked against `dummy_digest` so both misses cost the same.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
        dummy_digest: &str,
    ) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let digest = user
            .as_ref()
            .map_or_else(|| dummy_digest.to_string(), |u| u.password_digest.clone());
        let password = password.to_string();
        let is_valid = task::spawn_blocking(move || verify_password(&password, &digest))
            .await
            .context("Password verification task panicked")??;

        Ok(user.filter(|_| is_valid).map(User::from))
    }

    pub async fn update(&self, id: i32, changes: UserRecordChanges) -> Result<Option<User>> {
        let Some(user) = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(digest) = changes.password_digest {
            active.password_digest = Set(digest);
        }
        if let Some(is_admin) = changes.is_admin {
            active.is_admin = Set(is_admin);
        }
        if let Some(can_view) = changes.can_view_all_accounts {
            active.can_view_all_accounts = Set(can_view);
        }
        if let Some(secret) = changes.mfa_secret {
            active.mfa_enabled = Set(secret.is_some());
            active.mfa_secret = Set(secret);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&self.conn).await?;
        Ok(Some(User::from(updated)))
    }

    /// Deletes the user together with the accounts they own and every share row.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;
        let removed = delete_users(&txn, &[id]).await? > 0;
        txn.commit().await?;

        if removed {
            tracing::info!("Removed user with ID: {}", id);
        }
        Ok(removed)
    }
}

pub(crate) async fn insert_user<C: ConnectionTrait>(
    conn: &C,
    record: NewUserRecord,
) -> Result<users::Model> {
    let now = chrono::Utc::now().to_rfc3339();

    let model = users::ActiveModel {
        email: Set(record.email),
        password_digest: Set(record.password_digest),
        is_admin: Set(record.is_admin),
        can_view_all_accounts: Set(record.can_view_all_accounts),
        mfa_enabled: Set(record.mfa_secret.is_some()),
        mfa_secret: Set(record.mfa_secret),
        family_id: Set(record.family_id),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok(model)
}

/// Removes users, their owned accounts and all join rows touching either.
/// Returns the number of user rows deleted.
pub(crate) async fn delete_users<C: ConnectionTrait>(conn: &C, ids: &[i32]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let owned: Vec<i32> = BankAccounts::find()
        .select_only()
        .column(bank_accounts::Column::Id)
        .filter(bank_accounts::Column::UserId.is_in(ids.to_vec()))
        .into_tuple()
        .all(conn)
        .await?;

    super::bank_account::delete_accounts(conn, &owned).await?;

    UserBankAccounts::delete_many()
        .filter(user_bank_accounts::Column::UserId.is_in(ids.to_vec()))
        .exec(conn)
        .await?;

    let result = Users::delete_many()
        .filter(users::Column::Id.is_in(ids.to_vec()))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

/// True when the error chain carries a unique constraint violation from the database.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<DbErr>()
            .and_then(DbErr::sql_err)
            .is_some_and(|e| matches!(e, SqlErr::UniqueConstraintViolation(_)))
    })
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the crate's default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Hashing off the async runtime.
pub async fn hash_password_blocking(password: String, config: SecurityConfig) -> Result<String> {
    task::spawn_blocking(move || hash_password(&password, Some(&config)))
        .await
        .context("Password hashing task panicked")?
}

/// Params are read from the PHC string, so digests made with any config verify.
pub fn verify_password(password: &str, digest: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(digest)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
