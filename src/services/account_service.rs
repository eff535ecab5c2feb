//! Domain service for account management.
//!
//! Creation, update and deletion of accounts, with authority interning.

use crate::domain::{Account, AccountUpdate, NewAccount};
use crate::services::IdentityError;

/// Domain service trait for accounts.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Creates an account, hashing its password and interning its authorities.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::DuplicateIdentity`] if the username is taken and
    /// [`IdentityError::InvalidInput`] if the password is missing or a name is invalid.
    async fn create_account(&self, account: NewAccount) -> Result<Account, IdentityError>;

    /// Overwrites the state of an existing account.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::IdentityNotFound`] if the account does not exist.
    async fn update_account(
        &self,
        username: &str,
        update: AccountUpdate,
    ) -> Result<Account, IdentityError>;

    /// Deletes an account. Its authorities are left in place.
    async fn delete_account(&self, username: &str) -> Result<(), IdentityError>;

    async fn exists(&self, username: &str) -> Result<bool, IdentityError>;

    async fn get_by_username(&self, username: &str) -> Result<Account, IdentityError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, IdentityError>;
}
