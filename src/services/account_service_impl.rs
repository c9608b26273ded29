//! `SeaORM` implementation of the `AccountService` trait.

use async_trait::async_trait;

use crate::config::SecurityConfig;
use crate::db::repositories::user::{hash_password_blocking, is_unique_violation};
use crate::db::{NewUserRecord, Store, UserRecordChanges};
use crate::models::family::Family;
use crate::models::user::{User, normalize_email};
use crate::services::account_service::{
    AccountError, AccountService, NewUser, ProvisionedUser, UserChanges,
};
use crate::services::credentials::{self, EMAIL_TAKEN};
use crate::services::totp;

pub const LAST_ADMIN: &str = "Family must keep at least one admin";

pub struct SeaOrmAccountService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAccountService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    /// Format and uniqueness checks for an already normalized email.
    async fn email_errors(
        &self,
        email: &str,
        except_id: Option<i32>,
    ) -> Result<Vec<String>, AccountError> {
        let mut errors = credentials::validate_email(email);
        if errors.is_empty() && self.store.email_taken(email, except_id).await? {
            errors.push(EMAIL_TAKEN.to_string());
        }
        Ok(errors)
    }

    async fn hash(&self, password: &str) -> Result<String, AccountError> {
        Ok(hash_password_blocking(password.to_string(), self.security.clone()).await?)
    }

    /// Loads a user the actor may manage: themselves, or anyone in their
    /// family when the actor is an admin. Other families stay invisible.
    async fn managed_user(&self, actor: &User, id: i32) -> Result<User, AccountError> {
        let target = self.get_user(id).await?;

        if target.family_id != actor.family_id {
            return Err(AccountError::NotFound("User"));
        }
        if target.id != actor.id && !actor.is_admin {
            return Err(AccountError::Forbidden("user"));
        }
        Ok(target)
    }

    async fn is_last_admin(&self, user: &User) -> Result<bool, AccountError> {
        Ok(user.is_admin && self.store.count_family_admins(user.family_id).await? <= 1)
    }
}

/// Maps a lost race on the unique email index to the regular validation message.
fn map_write_error(err: anyhow::Error) -> AccountError {
    if is_unique_violation(&err) {
        AccountError::Validation(vec![EMAIL_TAKEN.to_string()])
    } else {
        AccountError::from(err)
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn create_family(
        &self,
        family_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(Family, User), AccountError> {
        let family_name = family_name.trim();
        let family_errors = credentials::validate_family_name(family_name);
        if !family_errors.is_empty() {
            return Err(AccountError::Validation(family_errors));
        }

        let email = normalize_email(email);
        let mut errors = self.email_errors(&email, None).await?;
        errors.extend(credentials::validate_password(password));
        if !errors.is_empty() {
            return Err(AccountError::Validation(errors));
        }

        let admin = NewUserRecord {
            email,
            password_digest: self.hash(password).await?,
            is_admin: true,
            can_view_all_accounts: true,
            mfa_secret: None,
            family_id: 0,
        };

        self.store
            .create_family_with_admin(family_name, admin)
            .await
            .map_err(map_write_error)
    }

    async fn delete_family(&self, actor: &User, id: i32) -> Result<(), AccountError> {
        if actor.family_id != id {
            return Err(AccountError::NotFound("Family"));
        }
        if !actor.is_admin {
            return Err(AccountError::Forbidden("family"));
        }

        if self.store.delete_family(id).await? {
            Ok(())
        } else {
            Err(AccountError::NotFound("Family"))
        }
    }

    async fn get_user(&self, id: i32) -> Result<User, AccountError> {
        self.store
            .get_user(id)
            .await?
            .ok_or(AccountError::NotFound("User"))
    }

    async fn create_user(
        &self,
        actor: &User,
        user: NewUser,
    ) -> Result<ProvisionedUser, AccountError> {
        if !actor.is_admin && (user.is_admin || user.can_view_all_accounts) {
            return Err(AccountError::Forbidden("user"));
        }

        let email = normalize_email(&user.email);
        let mut errors = self.email_errors(&email, None).await?;
        errors.extend(credentials::validate_password(&user.password));
        if !errors.is_empty() {
            return Err(AccountError::Validation(errors));
        }

        let mfa_secret = user.mfa_enabled.then(totp::generate_secret);
        let record = NewUserRecord {
            email,
            password_digest: self.hash(&user.password).await?,
            is_admin: user.is_admin,
            can_view_all_accounts: user.can_view_all_accounts,
            mfa_secret: mfa_secret.clone(),
            family_id: actor.family_id,
        };

        let created = self
            .store
            .create_user(record)
            .await
            .map_err(map_write_error)?;

        tracing::info!(
            user_id = created.id,
            family_id = actor.family_id,
            created_by = actor.id,
            "Created user"
        );
        Ok(ProvisionedUser {
            user: created,
            mfa_secret,
        })
    }

    async fn update_user(
        &self,
        actor: &User,
        id: i32,
        changes: UserChanges,
    ) -> Result<ProvisionedUser, AccountError> {
        let existing = self.managed_user(actor, id).await?;

        let changes_privileges = changes.is_admin.is_some_and(|v| v != existing.is_admin)
            || changes
                .can_view_all_accounts
                .is_some_and(|v| v != existing.can_view_all_accounts);
        if changes_privileges && !actor.is_admin {
            return Err(AccountError::Forbidden("user"));
        }

        let mut errors = Vec::new();
        let drops_privilege =
            changes.is_admin == Some(false) || changes.can_view_all_accounts == Some(false);
        if drops_privilege && self.is_last_admin(&existing).await? {
            errors.push(LAST_ADMIN.to_string());
        }

        let email = changes.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            errors.extend(self.email_errors(email, Some(id)).await?);
        }
        if let Some(password) = &changes.password {
            errors.extend(credentials::validate_password(password));
        }
        if !errors.is_empty() {
            return Err(AccountError::Validation(errors));
        }

        let password_digest = match &changes.password {
            Some(password) => Some(self.hash(password).await?),
            None => None,
        };

        // Only a switch from off to on provisions a secret.
        let mut mfa_secret = None;
        let mfa_change = match changes.mfa_enabled {
            Some(true) if !existing.mfa_enabled => {
                let secret = totp::generate_secret();
                mfa_secret = Some(secret.clone());
                Some(Some(secret))
            }
            Some(false) if existing.mfa_enabled => Some(None),
            _ => None,
        };

        let record_changes = UserRecordChanges {
            email,
            password_digest,
            is_admin: changes.is_admin,
            can_view_all_accounts: changes.can_view_all_accounts,
            mfa_secret: mfa_change,
        };

        let updated = self
            .store
            .update_user(id, record_changes)
            .await
            .map_err(map_write_error)?
            .ok_or(AccountError::NotFound("User"))?;

        Ok(ProvisionedUser {
            user: updated,
            mfa_secret,
        })
    }

    async fn delete_user(&self, actor: &User, id: i32) -> Result<(), AccountError> {
        let target = self.managed_user(actor, id).await?;

        if self.is_last_admin(&target).await? {
            return Err(AccountError::Validation(vec![LAST_ADMIN.to_string()]));
        }

        if self.store.delete_user(id).await? {
            Ok(())
        } else {
            Err(AccountError::NotFound("User"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_store;

    fn fast_security() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: "Secret1!".to_string(),
            ..NewUser::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_insert_maps_to_email_taken() {
        let store = test_store().await;
        let service = SeaOrmAccountService::new(store.clone(), fast_security());
        let (family, _) = service
            .create_family("The Smiths", "mom@example.com", "Secret1!")
            .await
            .unwrap();

        // Skips the up-front uniqueness check, as a concurrent request would.
        let err = store
            .create_user(NewUserRecord {
                email: "mom@example.com".to_string(),
                password_digest: "digest".to_string(),
                is_admin: false,
                can_view_all_accounts: false,
                mfa_secret: None,
                family_id: family.id,
            })
            .await
            .unwrap_err();

        assert!(is_unique_violation(&err));
        match map_write_error(err) {
            AccountError::Validation(errors) => assert_eq!(errors, vec![EMAIL_TAKEN.to_string()]),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_family_with_taken_email() {
        let service = SeaOrmAccountService::new(test_store().await, fast_security());
        service
            .create_family("The Smiths", "mom@example.com", "Secret1!")
            .await
            .unwrap();

        let err = service
            .create_family("Copycats", " MOM@example.com", "Secret1!")
            .await
            .unwrap_err();

        assert!(
            matches!(err, AccountError::Validation(ref errors) if errors == &vec![EMAIL_TAKEN.to_string()])
        );
    }

    #[tokio::test]
    async fn test_members_cannot_grant_privileges() {
        let service = SeaOrmAccountService::new(test_store().await, fast_security());
        let (_, mom) = service
            .create_family("The Smiths", "mom@example.com", "Secret1!")
            .await
            .unwrap();
        let kid = service
            .create_user(&mom, new_user("kid@example.com"))
            .await
            .unwrap()
            .user;

        let err = service
            .create_user(
                &kid,
                NewUser {
                    is_admin: true,
                    ..new_user("friend@example.com")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Forbidden("user")));

        let err = service
            .update_user(
                &kid,
                kid.id,
                UserChanges {
                    can_view_all_accounts: Some(true),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Forbidden("user")));

        let err = service.delete_user(&kid, mom.id).await.unwrap_err();
        assert!(matches!(err, AccountError::Forbidden("user")));
    }

    #[tokio::test]
    async fn test_last_admin_is_kept() {
        let service = SeaOrmAccountService::new(test_store().await, fast_security());
        let (_, mom) = service
            .create_family("The Smiths", "mom@example.com", "Secret1!")
            .await
            .unwrap();

        let err = service
            .update_user(
                &mom,
                mom.id,
                UserChanges {
                    is_admin: Some(false),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap_err();
        assert!(
            matches!(err, AccountError::Validation(ref errors) if errors == &vec![LAST_ADMIN.to_string()])
        );

        let err = service.delete_user(&mom, mom.id).await.unwrap_err();
        assert!(matches!(err, AccountError::Validation(_)));

        let dad = service
            .create_user(
                &mom,
                NewUser {
                    is_admin: true,
                    can_view_all_accounts: true,
                    ..new_user("dad@example.com")
                },
            )
            .await
            .unwrap()
            .user;

        let demoted = service
            .update_user(
                &dad,
                mom.id,
                UserChanges {
                    is_admin: Some(false),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap();
        assert!(!demoted.user.is_admin);
    }

    #[tokio::test]
    async fn test_other_families_are_invisible() {
        let service = SeaOrmAccountService::new(test_store().await, fast_security());
        let (smiths, mom) = service
            .create_family("The Smiths", "mom@example.com", "Secret1!")
            .await
            .unwrap();
        let (_, dad) = service
            .create_family("The Joneses", "dad@example.com", "Secret1!")
            .await
            .unwrap();

        let err = service.delete_user(&dad, mom.id).await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound("User")));

        let err = service.delete_family(&dad, smiths.id).await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound("Family")));
    }
}
