//! Domain service for authentication.
//!
//! Checks are evaluated in a fixed order: lookup, password, enabled, locked,
//! credentials expiry, account expiry. The password is always checked before
//! any account state, so state is only revealed to callers holding valid
//! credentials.

use crate::services::{IdentityError, Session};

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and account state, returning a new session.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::BadCredentials`] for an unknown user or wrong
    /// password, otherwise the first failing state check.
    async fn authenticate(&self, username: &str, password: &str)
    -> Result<Session, IdentityError>;

    /// Changes the caller's password after re-authenticating with the old one.
    /// On success the session is invalidated.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Unauthenticated`] if the session is no longer
    /// valid, or the authentication error for a wrong old password.
    async fn change_password(
        &self,
        session: &mut Session,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), IdentityError>;
}
