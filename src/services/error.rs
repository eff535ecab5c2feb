use thiserror::Error;

use crate::domain::NameError;

/// Errors surfaced by the identity and authentication services.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Username {0} already present")]
    DuplicateIdentity(String),

    #[error("Authority {0} already present")]
    DuplicateAuthority(String),

    #[error("Could not find account {0}")]
    IdentityNotFound(String),

    #[error("Could not find authority {0}")]
    AuthorityNotFound(String),

    #[error("Bad credentials")]
    BadCredentials,

    #[error("Account is disabled")]
    DisabledAccount,

    #[error("Account is locked")]
    LockedAccount,

    #[error("Credentials have expired")]
    ExpiredCredentials,

    #[error("Account has expired")]
    ExpiredAccount,

    #[error("No authenticated session")]
    Unauthenticated,

    #[error("Database error: {0}")]
    Database(String),

    /// SQLite reported the database as locked by another writer.
    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IdentityError {
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the error is one of the authentication rejections.
    #[must_use]
    pub const fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::BadCredentials
                | Self::DisabledAccount
                | Self::LockedAccount
                | Self::ExpiredCredentials
                | Self::ExpiredAccount
        )
    }
}

impl From<sea_orm::DbErr> for IdentityError {
    fn from(err: sea_orm::DbErr) -> Self {
        if is_busy(&err) {
            Self::Busy(err.to_string())
        } else {
            Self::Database(err.to_string())
        }
    }
}

/// `SQLITE_BUSY` (5) or `SQLITE_LOCKED` (6), including their extended codes.
fn is_busy(err: &sea_orm::DbErr) -> bool {
    use sea_orm::{DbErr, RuntimeErr, sqlx};

    let (DbErr::Conn(RuntimeErr::SqlxError(inner))
    | DbErr::Exec(RuntimeErr::SqlxError(inner))
    | DbErr::Query(RuntimeErr::SqlxError(inner))) = err
    else {
        return false;
    };

    let sqlx::Error::Database(db) = inner else {
        return false;
    };

    db.code()
        .and_then(|code| code.parse::<i32>().ok())
        .map_or_else(
            || db.message().contains("database is locked"),
            |code| matches!(code & 0xff, 5 | 6),
        )
}

impl From<anyhow::Error> for IdentityError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<NameError> for IdentityError {
    fn from(err: NameError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            IdentityError::DuplicateIdentity("admin".into()).to_string(),
            "Username admin already present"
        );
        assert_eq!(
            IdentityError::AuthorityNotFound("ADMIN".into()).to_string(),
            "Could not find authority ADMIN"
        );
    }

    #[test]
    fn db_errors_convert() {
        let err: IdentityError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, IdentityError::Database(_)));
    }

    #[test]
    fn non_sqlx_errors_are_not_busy() {
        assert!(!is_busy(&sea_orm::DbErr::Custom("database is locked".to_string())));
        assert!(!is_busy(&sea_orm::DbErr::RecordNotFound("x".to_string())));
    }

    #[test]
    fn name_errors_become_invalid_input() {
        let err: IdentityError = crate::domain::Username::parse("").unwrap_err().into();
        assert!(matches!(err, IdentityError::InvalidInput(_)));
    }

    #[test]
    fn authentication_failures_are_classified() {
        assert!(IdentityError::LockedAccount.is_authentication_failure());
        assert!(!IdentityError::IdentityNotFound("x".into()).is_authentication_failure());
    }
}
