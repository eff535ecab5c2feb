use std::collections::{BTreeMap, BTreeSet};

use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;

use crate::domain::{Authority, AuthorityName, Username};
use crate::entities::{account_authorities, authorities, prelude::*};
use crate::services::IdentityError;

pub struct AuthorityRepository {
    conn: DatabaseConnection,
}

impl AuthorityRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn exists(&self, name: &str) -> Result<bool, IdentityError> {
        Ok(Authorities::find_by_id(name.to_string())
            .one(&self.conn)
            .await?
            .is_some())
    }

    /// Get an authority with the accounts holding it
    pub async fn find(&self, name: &str) -> Result<Option<Authority>, IdentityError> {
        let Some(model) = Authorities::find_by_id(name.to_string())
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let links = AccountAuthorities::find()
            .filter(account_authorities::Column::AuthorityName.eq(name))
            .all(&self.conn)
            .await?;

        let accounts = links
            .into_iter()
            .map(|l| Username::parse(l.username))
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Some(Authority {
            name: AuthorityName::parse(model.name)?,
            accounts,
        }))
    }

    pub async fn list(&self) -> Result<Vec<Authority>, IdentityError> {
        let models = Authorities::find()
            .order_by_asc(authorities::Column::Name)
            .all(&self.conn)
            .await?;

        let mut holders: BTreeMap<String, BTreeSet<Username>> = BTreeMap::new();
        for link in AccountAuthorities::find().all(&self.conn).await? {
            holders
                .entry(link.authority_name)
                .or_default()
                .insert(Username::parse(link.username)?);
        }

        models
            .into_iter()
            .map(|m| -> Result<Authority, IdentityError> {
                let accounts = holders.remove(&m.name).unwrap_or_default();
                Ok(Authority {
                    name: AuthorityName::parse(m.name)?,
                    accounts,
                })
            })
            .collect()
    }

    /// Insert a new authority. Fails if the name is taken.
    pub async fn insert(&self, name: &AuthorityName) -> Result<Authority, IdentityError> {
        let inserted = Authorities::insert(authorities::ActiveModel {
            name: Set(name.as_str().to_string()),
        })
        .on_conflict(
            OnConflict::column(authorities::Column::Name)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.conn)
        .await?;

        if inserted == 0 {
            return Err(IdentityError::DuplicateAuthority(name.to_string()));
        }

        info!("Created authority: {}", name);
        Ok(Authority {
            name: name.clone(),
            accounts: BTreeSet::new(),
        })
    }

    /// Re-key an authority: insert the new name, move every account link, then
    /// drop the old row.
    pub async fn rename(
        &self,
        name: &str,
        new_name: &AuthorityName,
    ) -> Result<Authority, IdentityError> {
        let txn = self.conn.begin().await?;

        if Authorities::find_by_id(name.to_string())
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(IdentityError::AuthorityNotFound(name.to_string()));
        }

        if name == new_name.as_str() {
            txn.commit().await?;
            return self.get(name).await;
        }

        let inserted = Authorities::insert(authorities::ActiveModel {
            name: Set(new_name.as_str().to_string()),
        })
        .on_conflict(
            OnConflict::column(authorities::Column::Name)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        if inserted == 0 {
            return Err(IdentityError::DuplicateAuthority(new_name.to_string()));
        }

        let moved = AccountAuthorities::update_many()
            .col_expr(
                account_authorities::Column::AuthorityName,
                Expr::value(new_name.as_str()),
            )
            .filter(account_authorities::Column::AuthorityName.eq(name))
            .exec(&txn)
            .await?;

        Authorities::delete_by_id(name.to_string()).exec(&txn).await?;

        txn.commit().await?;

        info!(
            "Renamed authority {} -> {} ({} account links moved)",
            name, new_name, moved.rows_affected
        );
        self.get(new_name.as_str()).await
    }

    /// Delete an authority, unlinking it from every account that holds it.
    /// Returns the number of accounts unlinked.
    pub async fn delete(&self, name: &str) -> Result<u64, IdentityError> {
        let txn = self.conn.begin().await?;

        if Authorities::find_by_id(name.to_string())
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(IdentityError::AuthorityNotFound(name.to_string()));
        }

        let unlinked = AccountAuthorities::delete_many()
            .filter(account_authorities::Column::AuthorityName.eq(name))
            .exec(&txn)
            .await?
            .rows_affected;

        Authorities::delete_by_id(name.to_string()).exec(&txn).await?;

        txn.commit().await?;

        info!("Deleted authority {} ({} accounts unlinked)", name, unlinked);
        Ok(unlinked)
    }

    pub async fn count(&self) -> Result<u64, IdentityError> {
        Ok(Authorities::find().count(&self.conn).await?)
    }

    async fn get(&self, name: &str) -> Result<Authority, IdentityError> {
        self.find(name)
            .await?
            .ok_or_else(|| IdentityError::AuthorityNotFound(name.to_string()))
    }
}
