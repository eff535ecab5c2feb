//! `SeaORM` implementation of the `AccountService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::db::{AccountRow, Store};
use crate::domain::{Account, AccountUpdate, AuthorityName, NewAccount, Username};
use crate::services::account_service::AccountService;
use crate::services::password::{CredentialHasher, hash_blocking};
use crate::services::IdentityError;

pub struct SeaOrmAccountService {
    store: Store,
    hasher: Arc<dyn CredentialHasher>,
}

impl SeaOrmAccountService {
    #[must_use]
    pub fn new(store: Store, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { store, hasher }
    }
}

fn parse_authorities(names: &[String]) -> Result<Vec<AuthorityName>, IdentityError> {
    names
        .iter()
        .map(|n| AuthorityName::parse(n.as_str()).map_err(IdentityError::from))
        .collect()
}

fn require_password(password: Option<&str>) -> Result<&str, IdentityError> {
    match password {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Err(IdentityError::invalid("Password is required")),
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn create_account(&self, account: NewAccount) -> Result<Account, IdentityError> {
        let username = Username::parse(account.username)?;
        let password = require_password(account.password.as_deref())?;
        let authorities = parse_authorities(&account.authorities)?;

        // Skip the hashing cost for an obvious duplicate; the insert re-checks.
        if self.store.account_exists(username.as_str()).await? {
            return Err(IdentityError::DuplicateIdentity(username.into_inner()));
        }

        let password_hash = hash_blocking(self.hasher.clone(), password).await?;

        debug!(
            "Creating account {} with {} authorities",
            username,
            authorities.len()
        );

        self.store
            .insert_account(
                AccountRow {
                    username,
                    password_hash,
                    flags: account.flags,
                    attributes: account.attributes,
                },
                &authorities,
            )
            .await
    }

    async fn update_account(
        &self,
        username: &str,
        update: AccountUpdate,
    ) -> Result<Account, IdentityError> {
        let authorities = parse_authorities(&update.authorities)?;

        if !self.store.account_exists(username).await? {
            return Err(IdentityError::IdentityNotFound(username.to_string()));
        }

        let password_hash = match update.password.as_deref() {
            Some(password) => {
                let password = require_password(Some(password))?;
                Some(hash_blocking(self.hasher.clone(), password).await?)
            }
            None => None,
        };

        self.store
            .update_account(
                username,
                update.flags,
                password_hash,
                &update.attributes,
                &authorities,
            )
            .await
    }

    async fn delete_account(&self, username: &str) -> Result<(), IdentityError> {
        self.store.delete_account(username).await
    }

    async fn exists(&self, username: &str) -> Result<bool, IdentityError> {
        self.store.account_exists(username).await
    }

    async fn get_by_username(&self, username: &str) -> Result<Account, IdentityError> {
        self.store
            .get_account(username)
            .await?
            .ok_or_else(|| IdentityError::IdentityNotFound(username.to_string()))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, IdentityError> {
        self.store.list_accounts().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_empty_password_is_invalid() {
        assert!(matches!(
            require_password(None),
            Err(IdentityError::InvalidInput(_))
        ));
        assert!(matches!(
            require_password(Some("")),
            Err(IdentityError::InvalidInput(_))
        ));
        assert_eq!(require_password(Some("pwd")).unwrap(), "pwd");
    }

    #[test]
    fn authority_names_are_validated() {
        assert_eq!(
            parse_authorities(&["ADMIN".to_string()]).unwrap()[0].as_str(),
            "ADMIN"
        );
        assert!(parse_authorities(&[String::new()]).is_err());
    }
}
