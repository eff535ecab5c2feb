use std::collections::{BTreeMap, BTreeSet};

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::{debug, info};

use crate::domain::{Account, AccountFlags, Attributes, AuthorityName, Username};
use crate::entities::{account_authorities, accounts, authorities, prelude::*};
use crate::services::IdentityError;

/// Account data plus the stored hash, for credential checks only.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub account: Account,
    pub password_hash: String,
}

/// Columns written on insert/update, already validated and hashed.
#[derive(Debug, Clone)]
pub struct AccountRow {
    pub username: Username,
    pub password_hash: String,
    pub flags: AccountFlags,
    pub attributes: Attributes,
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn exists(&self, username: &str) -> Result<bool, IdentityError> {
        Ok(Accounts::find_by_id(username.to_string())
            .one(&self.conn)
            .await?
            .is_some())
    }

    /// Get account by username, including its password hash
    pub async fn find(&self, username: &str) -> Result<Option<AccountRecord>, IdentityError> {
        let Some(model) = Accounts::find_by_id(username.to_string())
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let mut names = load_authority_names(&self.conn, &[model.username.clone()]).await?;
        let held = names.remove(&model.username).unwrap_or_default();

        let password_hash = model.password_hash.clone();
        Ok(Some(AccountRecord {
            account: map_model(model, held)?,
            password_hash,
        }))
    }

    pub async fn list(&self) -> Result<Vec<Account>, IdentityError> {
        let models = Accounts::find()
            .order_by_asc(accounts::Column::Username)
            .all(&self.conn)
            .await?;

        let usernames: Vec<String> = models.iter().map(|m| m.username.clone()).collect();
        let mut names = load_authority_names(&self.conn, &usernames).await?;

        models
            .into_iter()
            .map(|m| {
                let held = names.remove(&m.username).unwrap_or_default();
                map_model(m, held)
            })
            .collect()
    }

    /// Insert a new account and link its (interned) authorities in one transaction.
    pub async fn insert(
        &self,
        row: AccountRow,
        authority_names: &[AuthorityName],
    ) -> Result<Account, IdentityError> {
        let username = row.username.as_str().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let active = accounts::ActiveModel {
            username: Set(username.clone()),
            password_hash: Set(row.password_hash),
            enabled: Set(row.flags.enabled),
            account_non_expired: Set(row.flags.account_non_expired),
            account_non_locked: Set(row.flags.account_non_locked),
            credentials_non_expired: Set(row.flags.credentials_non_expired),
            attributes: Set(encode_attributes(&row.attributes)?),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        // The insert is the first statement so the transaction takes the write
        // lock up front. A taken username surfaces as a unique violation.
        let txn = self.conn.begin().await?;
        Accounts::insert(active)
            .exec_without_returning(&txn)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    IdentityError::DuplicateIdentity(username.clone())
                }
                _ => IdentityError::from(e),
            })?;

        replace_links(&txn, &username, authority_names).await?;
        txn.commit().await?;

        info!("Created account: {}", username);
        self.get(&username).await
    }

    /// Overwrite flags, attributes and authorities; the hash only when given.
    pub async fn update(
        &self,
        username: &str,
        flags: AccountFlags,
        password_hash: Option<String>,
        attributes: &Attributes,
        authority_names: &[AuthorityName],
    ) -> Result<Account, IdentityError> {
        let txn = self.conn.begin().await?;

        let model = Accounts::find_by_id(username.to_string())
            .one(&txn)
            .await?
            .ok_or_else(|| IdentityError::IdentityNotFound(username.to_string()))?;

        let mut active: accounts::ActiveModel = model.into();
        active.enabled = Set(flags.enabled);
        active.account_non_expired = Set(flags.account_non_expired);
        active.account_non_locked = Set(flags.account_non_locked);
        active.credentials_non_expired = Set(flags.credentials_non_expired);
        active.attributes = Set(encode_attributes(attributes)?);
        if let Some(hash) = password_hash {
            active.password_hash = Set(hash);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&txn).await?;

        replace_links(&txn, username, authority_names).await?;
        txn.commit().await?;

        info!("Updated account: {}", username);
        self.get(username).await
    }

    pub async fn update_password(
        &self,
        username: &str,
        password_hash: String,
    ) -> Result<(), IdentityError> {
        let model = Accounts::find_by_id(username.to_string())
            .one(&self.conn)
            .await?
            .ok_or_else(|| IdentityError::IdentityNotFound(username.to_string()))?;

        let mut active: accounts::ActiveModel = model.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        info!("Password updated for account: {}", username);
        Ok(())
    }

    /// Remove the account and its links. Authorities are kept.
    pub async fn delete(&self, username: &str) -> Result<(), IdentityError> {
        let txn = self.conn.begin().await?;

        if Accounts::find_by_id(username.to_string())
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(IdentityError::IdentityNotFound(username.to_string()));
        }

        AccountAuthorities::delete_many()
            .filter(account_authorities::Column::Username.eq(username))
            .exec(&txn)
            .await?;

        Accounts::delete_by_id(username.to_string())
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!("Deleted account: {}", username);
        Ok(())
    }

    async fn get(&self, username: &str) -> Result<Account, IdentityError> {
        self.find(username)
            .await?
            .map(|r| r.account)
            .ok_or_else(|| IdentityError::IdentityNotFound(username.to_string()))
    }
}

/// Insert each authority unless it already exists. A single statement per name,
/// so concurrent callers cannot create duplicates.
pub(crate) async fn intern_authorities<C: ConnectionTrait>(
    conn: &C,
    names: &[AuthorityName],
) -> Result<(), IdentityError> {
    for name in names {
        let inserted = Authorities::insert(authorities::ActiveModel {
            name: Set(name.as_str().to_string()),
        })
        .on_conflict(
            OnConflict::column(authorities::Column::Name)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

        if inserted > 0 {
            debug!("Interned new authority: {}", name);
        }
    }

    Ok(())
}

async fn replace_links<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    names: &[AuthorityName],
) -> Result<(), IdentityError> {
    intern_authorities(conn, names).await?;

    AccountAuthorities::delete_many()
        .filter(account_authorities::Column::Username.eq(username))
        .exec(conn)
        .await?;

    let unique: BTreeSet<&str> = names.iter().map(AuthorityName::as_str).collect();
    if unique.is_empty() {
        return Ok(());
    }

    let links: Vec<account_authorities::ActiveModel> = unique
        .into_iter()
        .map(|name| account_authorities::ActiveModel {
            username: Set(username.to_string()),
            authority_name: Set(name.to_string()),
        })
        .collect();

    AccountAuthorities::insert_many(links)
        .exec_without_returning(conn)
        .await?;

    Ok(())
}

async fn load_authority_names<C: ConnectionTrait>(
    conn: &C,
    usernames: &[String],
) -> Result<BTreeMap<String, BTreeSet<AuthorityName>>, IdentityError> {
    if usernames.is_empty() {
        return Ok(BTreeMap::new());
    }

    let links = AccountAuthorities::find()
        .filter(account_authorities::Column::Username.is_in(usernames.iter().cloned()))
        .all(conn)
        .await?;

    let mut by_user: BTreeMap<String, BTreeSet<AuthorityName>> = BTreeMap::new();
    for link in links {
        let name = AuthorityName::parse(link.authority_name)?;
        by_user.entry(link.username).or_default().insert(name);
    }

    Ok(by_user)
}

fn map_model(
    model: accounts::Model,
    authorities: BTreeSet<AuthorityName>,
) -> Result<Account, IdentityError> {
    Ok(Account {
        username: Username::parse(model.username)?,
        flags: AccountFlags {
            enabled: model.enabled,
            account_non_expired: model.account_non_expired,
            account_non_locked: model.account_non_locked,
            credentials_non_expired: model.credentials_non_expired,
        },
        authorities,
        attributes: decode_attributes(model.attributes.as_deref())?,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn encode_attributes(attributes: &Attributes) -> Result<Option<String>, IdentityError> {
    if attributes.is_empty() {
        return Ok(None);
    }

    serde_json::to_string(attributes)
        .map(Some)
        .map_err(|e| IdentityError::Internal(format!("Failed to encode attributes: {e}")))
}

fn decode_attributes(raw: Option<&str>) -> Result<Attributes, IdentityError> {
    raw.map_or_else(
        || Ok(Attributes::new()),
        |s| {
            serde_json::from_str(s)
                .map_err(|e| IdentityError::Internal(format!("Corrupt attributes column: {e}")))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_round_trip_through_column() {
        let mut attributes = Attributes::new();
        attributes.insert("email".to_string(), "a@example.com".to_string());

        let encoded = encode_attributes(&attributes).unwrap();
        assert_eq!(decode_attributes(encoded.as_deref()).unwrap(), attributes);
    }

    #[test]
    fn empty_attributes_store_null() {
        assert_eq!(encode_attributes(&Attributes::new()).unwrap(), None);
        assert!(decode_attributes(None).unwrap().is_empty());
    }

    #[test]
    fn corrupt_attributes_are_internal_errors() {
        let err = decode_attributes(Some("{not json")).unwrap_err();
        assert!(matches!(err, IdentityError::Internal(_)));
    }
}
