//! Create-family command handler

use crate::config::Config;
use crate::db::Store;
use crate::services::{AccountError, AccountService, SeaOrmAccountService};

pub async fn cmd_create_family(
    config: &Config,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;
    let service = SeaOrmAccountService::new(store, config.security.clone());

    match service.create_family(name, email, password).await {
        Ok((family, admin)) => {
            println!("✓ Created family '{}' (ID: {})", family.family_name, family.id);
            println!("  Admin: {} (ID: {})", admin.email, admin.id);
            Ok(())
        }
        Err(AccountError::Validation(errors)) => {
            println!("Family was not created:");
            for error in &errors {
                println!("  - {error}");
            }
            anyhow::bail!("invalid family details")
        }
        Err(e) => Err(e.into()),
    }
}
