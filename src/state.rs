use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, Argon2Hasher, AuthService, AuthorityService, CredentialHasher,
    SeaOrmAccountService, SeaOrmAuthService, SeaOrmAuthorityService,
};

/// Services wired against one store and one hasher.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub hasher: Arc<dyn CredentialHasher>,

    pub accounts: Arc<dyn AccountService>,

    pub authorities: Arc<dyn AuthorityService>,

    pub auth: Arc<dyn AuthService>,
}

impl SharedState {
    /// Connects to the configured database (running migrations) and wires the services.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await
        .with_context(|| {
            format!(
                "Failed to open database at {}",
                config.general.database_path
            )
        })?;

        let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher::new(&config.security)?);

        Ok(Self::with_parts(config, store, hasher))
    }

    #[must_use]
    pub fn with_parts(config: Config, store: Store, hasher: Arc<dyn CredentialHasher>) -> Self {
        let accounts: Arc<dyn AccountService> =
            Arc::new(SeaOrmAccountService::new(store.clone(), hasher.clone()));
        let authorities: Arc<dyn AuthorityService> =
            Arc::new(SeaOrmAuthorityService::new(store.clone()));
        let auth: Arc<dyn AuthService> =
            Arc::new(SeaOrmAuthService::new(store.clone(), hasher.clone()));

        Self {
            config: Arc::new(config),
            store,
            hasher,
            accounts,
            authorities,
            auth,
        }
    }
}
