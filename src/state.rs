use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, AuthService, BankAccountService, SeaOrmAccountService, SeaOrmAuthService,
    SeaOrmBankAccountService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub account_service: Arc<dyn AccountService>,

    pub auth_service: Arc<dyn AuthService>,

    pub bank_account_service: Arc<dyn BankAccountService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    /// Wires the services around an already opened store.
    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let account_service = Arc::new(SeaOrmAccountService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AccountService>;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let bank_account_service =
            Arc::new(SeaOrmBankAccountService::new(store.clone())) as Arc<dyn BankAccountService>;

        Self {
            config: Arc::new(config),
            store,
            account_service,
            auth_service,
            bank_account_service,
        }
    }
}
