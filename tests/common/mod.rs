#![allow(dead_code)]

use std::sync::Arc;

use gatekeep::config::Config;
use gatekeep::db::Store;
use gatekeep::services::CredentialHasher;
use gatekeep::state::SharedState;

fn test_config(prefix: &str) -> Config {
    let db_path = std::env::temp_dir().join(format!(
        "gatekeep-{prefix}-test-{}.db",
        uuid::Uuid::new_v4()
    ));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

/// Fresh store on a temporary SQLite file, with cheap argon2 params.
pub async fn spawn_state(prefix: &str) -> SharedState {
    SharedState::from_config(test_config(prefix))
        .await
        .expect("failed to create state")
}

/// Same as [`spawn_state`] but with the given hasher wired into every service.
pub async fn spawn_state_with_hasher(
    prefix: &str,
    hasher: Arc<dyn CredentialHasher>,
) -> SharedState {
    let config = test_config(prefix);
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
    .expect("failed to open store");

    SharedState::with_parts(config, store, hasher)
}
