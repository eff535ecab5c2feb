//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::db::Store;
use crate::services::auth_service::AuthService;
use crate::services::password::{CredentialHasher, hash_blocking, verify_blocking};
use crate::services::{IdentityError, Session};

pub struct SeaOrmAuthService {
    store: Store,
    hasher: Arc<dyn CredentialHasher>,
    /// Verified against when the username is unknown, so both failures cost one hash.
    dummy_hash: OnceCell<String>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            store,
            hasher,
            dummy_hash: OnceCell::new(),
        }
    }

    async fn verify_against_dummy(&self, password: &str) -> Result<(), IdentityError> {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| hash_blocking(self.hasher.clone(), "gatekeep-unknown-account"))
            .await?;

        verify_blocking(self.hasher.clone(), password, dummy.clone()).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let Some(record) = self.store.get_account_with_password(username).await? else {
            self.verify_against_dummy(password).await?;
            debug!("Authentication failed: unknown account {}", username);
            return Err(IdentityError::BadCredentials);
        };

        let is_valid =
            verify_blocking(self.hasher.clone(), password, record.password_hash).await?;

        if !is_valid {
            debug!("Authentication failed: bad password for {}", username);
            return Err(IdentityError::BadCredentials);
        }

        let account = record.account;
        let flags = account.flags;

        if !flags.enabled {
            return Err(IdentityError::DisabledAccount);
        }

        if !flags.account_non_locked {
            return Err(IdentityError::LockedAccount);
        }

        if !flags.credentials_non_expired {
            return Err(IdentityError::ExpiredCredentials);
        }

        if !flags.account_non_expired {
            return Err(IdentityError::ExpiredAccount);
        }

        info!("Authenticated account {}", account.username);
        Ok(Session::new(account.username, account.authorities))
    }

    async fn change_password(
        &self,
        session: &mut Session,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        if !session.is_authenticated() {
            return Err(IdentityError::Unauthenticated);
        }

        let username = session.username.as_str().to_string();

        self.authenticate(&username, old_password).await?;

        if new_password.is_empty() {
            return Err(IdentityError::invalid("New password must not be empty"));
        }

        let new_hash = hash_blocking(self.hasher.clone(), new_password).await?;
        self.store
            .update_account_password(&username, new_hash)
            .await?;

        session.invalidate();
        info!("Password changed for {}; session invalidated", username);

        Ok(())
    }
}
