//! Domain types for identity management with strong typing.
//!
//! Usernames and authority names are validated newtypes so that an unchecked
//! string can never reach the store.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Maximum length of a username, in characters.
pub const USERNAME_MAX_LEN: usize = 20;

/// Maximum length of an authority name, in characters.
pub const AUTHORITY_NAME_MAX_LEN: usize = 50;

/// Reason a name failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },

    #[error("{kind} must be at most {max} characters (got {len})")]
    TooLong {
        kind: &'static str,
        max: usize,
        len: usize,
    },
}

fn validate_name(kind: &'static str, value: &str, max: usize) -> Result<(), NameError> {
    if value.trim().is_empty() {
        return Err(NameError::Empty { kind });
    }

    let len = value.chars().count();
    if len > max {
        return Err(NameError::TooLong { kind, max, len });
    }

    Ok(())
}

/// Unique identifier of an account.
///
/// # Examples
///
/// ```rust
/// use gatekeep::domain::Username;
///
/// let name = Username::parse("alice").unwrap();
/// assert_eq!(name.as_str(), "alice");
/// assert!(Username::parse("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn parse(value: impl Into<String>) -> Result<Self, NameError> {
        let value = value.into();
        validate_name("Username", &value, USERNAME_MAX_LEN)?;
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}

/// Unique name of an authority (a role or permission string).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AuthorityName(String);

impl AuthorityName {
    pub fn parse(value: impl Into<String>) -> Result<Self, NameError> {
        let value = value.into();
        validate_name("Authority name", &value, AUTHORITY_NAME_MAX_LEN)?;
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for AuthorityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AuthorityName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}

/// Well-known authorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Role> for AuthorityName {
    fn from(role: Role) -> Self {
        Self(role.as_str().to_string())
    }
}

/// Account state flags. Every flag defaults to `true`, i.e. a usable account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountFlags {
    pub enabled: bool,
    pub account_non_expired: bool,
    pub account_non_locked: bool,
    pub credentials_non_expired: bool,
}

impl Default for AccountFlags {
    fn default() -> Self {
        Self {
            enabled: true,
            account_non_expired: true,
            account_non_locked: true,
            credentials_non_expired: true,
        }
    }
}

/// Extension fields attached to an account.
pub type Attributes = BTreeMap<String, String>;

/// An account as returned to callers. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub username: Username,
    pub flags: AccountFlags,
    pub authorities: BTreeSet<AuthorityName>,
    pub attributes: Attributes,
    pub created_at: String,
    pub updated_at: String,
}

impl Account {
    #[must_use]
    pub fn has_authority(&self, name: &str) -> bool {
        self.authorities.iter().any(|a| a.as_str() == name)
    }
}

/// An authority together with the accounts currently holding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Authority {
    pub name: AuthorityName,
    pub accounts: BTreeSet<Username>,
}

/// Input for account creation.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub username: String,
    pub password: Option<String>,
    pub flags: AccountFlags,
    pub authorities: Vec<String>,
    pub attributes: Attributes,
}

impl NewAccount {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_authority(mut self, name: impl Into<String>) -> Self {
        self.authorities.push(name.into());
        self
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: AccountFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Replacement state for an existing account.
///
/// Flags, authorities and attributes are overwritten as given; the password is
/// re-hashed only when present.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub flags: AccountFlags,
    pub password: Option<String>,
    pub authorities: Vec<String>,
    pub attributes: Attributes,
}

impl From<&Account> for AccountUpdate {
    fn from(account: &Account) -> Self {
        Self {
            flags: account.flags,
            password: None,
            authorities: account
                .authorities
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
            attributes: account.attributes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rejects_empty_and_blank() {
        assert_eq!(
            Username::parse(""),
            Err(NameError::Empty { kind: "Username" })
        );
        assert!(Username::parse("   ").is_err());
    }

    #[test]
    fn username_length_limit_counts_chars() {
        assert!(Username::parse("a".repeat(USERNAME_MAX_LEN)).is_ok());
        assert!(Username::parse("é".repeat(USERNAME_MAX_LEN)).is_ok());

        let err = Username::parse("a".repeat(USERNAME_MAX_LEN + 1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Username must be at most 20 characters (got 21)"
        );
    }

    #[test]
    fn authority_name_limit() {
        assert!(AuthorityName::parse("x".repeat(AUTHORITY_NAME_MAX_LEN)).is_ok());
        assert!(AuthorityName::parse("x".repeat(AUTHORITY_NAME_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn role_converts_to_authority_name() {
        let name: AuthorityName = Role::Admin.into();
        assert_eq!(name.as_str(), "ADMIN");
        assert_eq!(Role::User.to_string(), "USER");
    }

    #[test]
    fn flags_default_to_usable_account() {
        let flags = AccountFlags::default();
        assert!(flags.enabled);
        assert!(flags.account_non_expired);
        assert!(flags.account_non_locked);
        assert!(flags.credentials_non_expired);
    }

    #[test]
    fn username_deserialize_validates() {
        let ok: Username = serde_json::from_str("\"bob\"").unwrap();
        assert_eq!(ok.as_str(), "bob");
        assert!(serde_json::from_str::<Username>("\"\"").is_err());
    }

    #[test]
    fn update_from_account_keeps_state_without_password() {
        let account = Account {
            username: Username::parse("carol").unwrap(),
            flags: AccountFlags {
                enabled: false,
                ..AccountFlags::default()
            },
            authorities: [AuthorityName::from(Role::User)].into_iter().collect(),
            attributes: Attributes::new(),
            created_at: String::new(),
            updated_at: String::new(),
        };

        let update = AccountUpdate::from(&account);
        assert!(!update.flags.enabled);
        assert!(update.password.is_none());
        assert_eq!(update.authorities, vec!["USER".to_string()]);
    }
}
