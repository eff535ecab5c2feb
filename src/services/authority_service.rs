//! Domain service for authority management.

use crate::domain::Authority;
use crate::services::IdentityError;

#[async_trait::async_trait]
pub trait AuthorityService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidInput`] for an empty or over-long name and
    /// [`IdentityError::DuplicateAuthority`] if it already exists.
    async fn create_authority(&self, name: &str) -> Result<Authority, IdentityError>;

    /// Renames an authority; accounts holding it follow the new name.
    async fn update_authority(&self, name: &str, new_name: &str)
    -> Result<Authority, IdentityError>;

    /// Deletes an authority and unlinks it from every account.
    async fn delete_authority(&self, name: &str) -> Result<(), IdentityError>;

    /// # Errors
    ///
    /// Returns [`IdentityError::AuthorityNotFound`] if absent.
    async fn get_by_name(&self, name: &str) -> Result<Authority, IdentityError>;

    async fn list_authorities(&self) -> Result<Vec<Authority>, IdentityError>;
}
