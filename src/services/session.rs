use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::{AuthorityName, Username};

/// An authenticated caller, produced by a successful authentication.
///
/// Passed explicitly to operations that act on behalf of the caller. Only the
/// auth service creates one, and it cannot be cloned, so invalidating it ends
/// the caller's only handle.
#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub username: Username,
    pub authorities: BTreeSet<AuthorityName>,
    pub authenticated_at: String,
    authenticated: bool,
}

impl Session {
    #[must_use]
    pub(crate) fn new(username: Username, authorities: BTreeSet<AuthorityName>) -> Self {
        Self {
            token: generate_session_token(),
            username,
            authorities,
            authenticated_at: chrono::Utc::now().to_rfc3339(),
            authenticated: true,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Forces re-authentication.
    pub const fn invalidate(&mut self) {
        self.authenticated = false;
    }

    #[must_use]
    pub fn has_authority(&self, name: &str) -> bool {
        self.authorities.iter().any(|a| a.as_str() == name)
    }
}

/// Generate a random session token (64 character hex string)
#[must_use]
pub fn generate_session_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    #[test]
    fn new_session_is_authenticated_until_invalidated() {
        let mut session = Session::new(
            Username::parse("alice").unwrap(),
            [AuthorityName::from(Role::Admin)].into_iter().collect(),
        );

        assert!(session.is_authenticated());
        assert!(session.has_authority("ADMIN"));
        assert!(!session.has_authority("USER"));

        session.invalidate();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn tokens_are_hex_and_unique() {
        let a = generate_session_token();
        let b = generate_session_token();

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
