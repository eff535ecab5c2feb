//! `SeaORM` implementation of the `AuthorityService` trait.

use async_trait::async_trait;

use crate::db::Store;
use crate::domain::{Authority, AuthorityName};
use crate::services::IdentityError;
use crate::services::authority_service::AuthorityService;

pub struct SeaOrmAuthorityService {
    store: Store,
}

impl SeaOrmAuthorityService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthorityService for SeaOrmAuthorityService {
    async fn create_authority(&self, name: &str) -> Result<Authority, IdentityError> {
        let name = AuthorityName::parse(name)?;
        self.store.insert_authority(&name).await
    }

    async fn update_authority(
        &self,
        name: &str,
        new_name: &str,
    ) -> Result<Authority, IdentityError> {
        let new_name = AuthorityName::parse(new_name)?;
        self.store.rename_authority(name, &new_name).await
    }

    async fn delete_authority(&self, name: &str) -> Result<(), IdentityError> {
        self.store.delete_authority(name).await.map(|_| ())
    }

    async fn get_by_name(&self, name: &str) -> Result<Authority, IdentityError> {
        self.store
            .get_authority(name)
            .await?
            .ok_or_else(|| IdentityError::AuthorityNotFound(name.to_string()))
    }

    async fn list_authorities(&self) -> Result<Vec<Authority>, IdentityError> {
        self.store.list_authorities().await
    }
}
