use anyhow::Result;
use sea_orm::sqlx::sqlite::SqliteJournalMode;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::domain::{Account, AccountFlags, Attributes, Authority, AuthorityName};
use crate::services::IdentityError;

pub mod migrator;
pub mod repositories;
pub mod retry;

pub use repositories::account::{AccountRecord, AccountRow};
use retry::BusyRetry;

/// How long a connection waits on the busy handler for the write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    retry: BusyRetry,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
        let in_memory = path_str.starts_with(":memory:");

        if !in_memory {
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to :memory: would see its own empty database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false)
            .map_sqlx_sqlite_opts(|opts| {
                opts.busy_timeout(BUSY_TIMEOUT)
                    .journal_mode(SqliteJournalMode::Wal)
            });

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self {
            conn,
            retry: BusyRetry::default(),
        })
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn authority_repo(&self) -> repositories::authority::AuthorityRepository {
        repositories::authority::AuthorityRepository::new(self.conn.clone())
    }

    pub async fn account_exists(&self, username: &str) -> Result<bool, IdentityError> {
        self.account_repo().exists(username).await
    }

    pub async fn get_account(&self, username: &str) -> Result<Option<Account>, IdentityError> {
        Ok(self.account_repo().find(username).await?.map(|r| r.account))
    }

    pub async fn get_account_with_password(
        &self,
        username: &str,
    ) -> Result<Option<AccountRecord>, IdentityError> {
        self.account_repo().find(username).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, IdentityError> {
        self.account_repo().list().await
    }

    pub async fn insert_account(
        &self,
        row: AccountRow,
        authorities: &[AuthorityName],
    ) -> Result<Account, IdentityError> {
        self.retry
            .run("insert account", || async {
                self.account_repo().insert(row.clone(), authorities).await
            })
            .await
    }

    pub async fn update_account(
        &self,
        username: &str,
        flags: AccountFlags,
        password_hash: Option<String>,
        attributes: &Attributes,
        authorities: &[AuthorityName],
    ) -> Result<Account, IdentityError> {
        self.retry
            .run("update account", || async {
                self.account_repo()
                    .update(
                        username,
                        flags,
                        password_hash.clone(),
                        attributes,
                        authorities,
                    )
                    .await
            })
            .await
    }

    pub async fn update_account_password(
        &self,
        username: &str,
        password_hash: String,
    ) -> Result<(), IdentityError> {
        self.retry
            .run("update password", || async {
                self.account_repo()
                    .update_password(username, password_hash.clone())
                    .await
            })
            .await
    }

    pub async fn delete_account(&self, username: &str) -> Result<(), IdentityError> {
        self.retry
            .run("delete account", || async {
                self.account_repo().delete(username).await
            })
            .await
    }

    pub async fn authority_exists(&self, name: &str) -> Result<bool, IdentityError> {
        self.authority_repo().exists(name).await
    }

    pub async fn get_authority(&self, name: &str) -> Result<Option<Authority>, IdentityError> {
        self.authority_repo().find(name).await
    }

    pub async fn list_authorities(&self) -> Result<Vec<Authority>, IdentityError> {
        self.authority_repo().list().await
    }

    pub async fn count_authorities(&self) -> Result<u64, IdentityError> {
        self.authority_repo().count().await
    }

    pub async fn insert_authority(&self, name: &AuthorityName) -> Result<Authority, IdentityError> {
        self.retry
            .run("insert authority", || async {
                self.authority_repo().insert(name).await
            })
            .await
    }

    pub async fn rename_authority(
        &self,
        name: &str,
        new_name: &AuthorityName,
    ) -> Result<Authority, IdentityError> {
        self.retry
            .run("rename authority", || async {
                self.authority_repo().rename(name, new_name).await
            })
            .await
    }

    pub async fn delete_authority(&self, name: &str) -> Result<u64, IdentityError> {
        self.retry
            .run("delete authority", || async {
                self.authority_repo().delete(name).await
            })
            .await
    }
}
