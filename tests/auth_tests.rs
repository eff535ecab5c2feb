//! Integration tests for the authentication workflow and password changes.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use gatekeep::config::SecurityConfig;
use gatekeep::domain::{AccountFlags, AccountUpdate, NewAccount, Role};
use gatekeep::services::{Argon2Hasher, CredentialHasher, IdentityError};
use gatekeep::state::SharedState;

/// Argon2 hasher that counts how often each operation runs.
struct CountingHasher {
    inner: Argon2Hasher,
    hashes: AtomicUsize,
    verifies: AtomicUsize,
}

impl CountingHasher {
    fn new() -> Self {
        Self {
            inner: Argon2Hasher::new(&SecurityConfig {
                argon2_memory_cost_kib: 1024,
                argon2_time_cost: 1,
                argon2_parallelism: 1,
            })
            .unwrap(),
            hashes: AtomicUsize::new(0),
            verifies: AtomicUsize::new(0),
        }
    }
}

impl CredentialHasher for CountingHasher {
    fn hash(&self, plaintext: &str) -> anyhow::Result<String> {
        self.hashes.fetch_add(1, Ordering::SeqCst);
        self.inner.hash(plaintext)
    }

    fn verify(&self, plaintext: &str, hash: &str) -> anyhow::Result<bool> {
        self.verifies.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(plaintext, hash)
    }
}

async fn set_flags(state: &SharedState, username: &str, flags: AccountFlags) {
    let account = state.accounts.get_by_username(username).await.unwrap();
    let mut update = AccountUpdate::from(&account);
    update.flags = flags;
    state.accounts.update_account(username, update).await.unwrap();
}

#[tokio::test]
async fn authenticate_round_trip() {
    let state = common::spawn_state("auth").await;

    state
        .accounts
        .create_account(NewAccount::new("alice", "pwd").with_authority(Role::Admin.as_str()))
        .await
        .unwrap();

    let session = state.auth.authenticate("alice", "pwd").await.unwrap();
    assert_eq!(session.username.as_str(), "alice");
    assert!(session.is_authenticated());
    assert!(session.has_authority("ADMIN"));

    assert!(matches!(
        state.auth.authenticate("alice", "wrong").await,
        Err(IdentityError::BadCredentials)
    ));
}

#[tokio::test]
async fn unknown_user_is_bad_credentials() {
    let state = common::spawn_state("auth").await;

    assert!(matches!(
        state.auth.authenticate("nobody", "pwd").await,
        Err(IdentityError::BadCredentials)
    ));
}

#[tokio::test]
async fn unknown_user_still_pays_for_a_password_check() {
    let hasher = Arc::new(CountingHasher::new());
    let state = common::spawn_state_with_hasher("auth", hasher.clone()).await;

    state
        .accounts
        .create_account(NewAccount::new("alice", "pwd"))
        .await
        .unwrap();

    let verifies_before = hasher.verifies.load(Ordering::SeqCst);
    assert!(matches!(
        state.auth.authenticate("alice", "wrong").await,
        Err(IdentityError::BadCredentials)
    ));
    assert_eq!(hasher.verifies.load(Ordering::SeqCst), verifies_before + 1);

    for _ in 0..2 {
        assert!(matches!(
            state.auth.authenticate("nobody", "wrong").await,
            Err(IdentityError::BadCredentials)
        ));
    }
    assert_eq!(hasher.verifies.load(Ordering::SeqCst), verifies_before + 3);

    // One hash for alice, one for the reused dummy
    assert_eq!(hasher.hashes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn state_flags_gate_in_order() {
    let state = common::spawn_state("auth").await;
    let (username, pwd) = ("randomUser", "pwd");

    state
        .accounts
        .create_account(NewAccount::new(username, pwd))
        .await
        .unwrap();

    set_flags(
        &state,
        username,
        AccountFlags {
            enabled: false,
            account_non_locked: false,
            credentials_non_expired: false,
            account_non_expired: false,
        },
    )
    .await;
    assert!(matches!(
        state.auth.authenticate(username, pwd).await,
        Err(IdentityError::DisabledAccount)
    ));

    set_flags(
        &state,
        username,
        AccountFlags {
            enabled: true,
            account_non_locked: false,
            credentials_non_expired: false,
            account_non_expired: false,
        },
    )
    .await;
    assert!(matches!(
        state.auth.authenticate(username, pwd).await,
        Err(IdentityError::LockedAccount)
    ));

    set_flags(
        &state,
        username,
        AccountFlags {
            credentials_non_expired: false,
            account_non_expired: false,
            ..AccountFlags::default()
        },
    )
    .await;
    assert!(matches!(
        state.auth.authenticate(username, pwd).await,
        Err(IdentityError::ExpiredCredentials)
    ));

    set_flags(
        &state,
        username,
        AccountFlags {
            account_non_expired: false,
            ..AccountFlags::default()
        },
    )
    .await;
    assert!(matches!(
        state.auth.authenticate(username, pwd).await,
        Err(IdentityError::ExpiredAccount)
    ));

    set_flags(&state, username, AccountFlags::default()).await;
    assert!(state.auth.authenticate(username, pwd).await.is_ok());
}

#[tokio::test]
async fn password_is_checked_before_account_state() {
    let state = common::spawn_state("auth").await;

    state
        .accounts
        .create_account(NewAccount::new("locked", "pwd").with_flags(AccountFlags {
            enabled: false,
            account_non_locked: false,
            ..AccountFlags::default()
        }))
        .await
        .unwrap();

    assert!(matches!(
        state.auth.authenticate("locked", "wrong").await,
        Err(IdentityError::BadCredentials)
    ));
    assert!(matches!(
        state.auth.authenticate("locked", "pwd").await,
        Err(IdentityError::DisabledAccount)
    ));
}

#[tokio::test]
async fn change_password_flow() {
    let state = common::spawn_state("auth").await;
    let (username, old_password, new_password) = ("randomUser", "pwd", "pwd2");

    state
        .accounts
        .create_account(NewAccount::new(username, old_password))
        .await
        .unwrap();

    let mut session = state
        .auth
        .authenticate(username, old_password)
        .await
        .unwrap();

    let err = state
        .auth
        .change_password(&mut session, new_password, new_password)
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::BadCredentials));
    assert!(session.is_authenticated());
    assert!(state.auth.authenticate(username, old_password).await.is_ok());

    state
        .auth
        .change_password(&mut session, old_password, new_password)
        .await
        .unwrap();
    assert!(!session.is_authenticated());
    assert!(matches!(
        state
            .auth
            .change_password(&mut session, new_password, "pwd3")
            .await,
        Err(IdentityError::Unauthenticated)
    ));

    assert!(state.auth.authenticate(username, new_password).await.is_ok());
    assert!(matches!(
        state.auth.authenticate(username, old_password).await,
        Err(IdentityError::BadCredentials)
    ));
}

#[tokio::test]
async fn invalidated_session_cannot_change_password() {
    let state = common::spawn_state("auth").await;

    state
        .accounts
        .create_account(NewAccount::new("alice", "pwd"))
        .await
        .unwrap();

    let mut session = state.auth.authenticate("alice", "pwd").await.unwrap();
    session.invalidate();

    assert!(matches!(
        state
            .auth
            .change_password(&mut session, "pwd", "next")
            .await,
        Err(IdentityError::Unauthenticated)
    ));
    assert!(state.auth.authenticate("alice", "pwd").await.is_ok());
}

#[tokio::test]
async fn change_password_rejects_empty_new_password() {
    let state = common::spawn_state("auth").await;

    state
        .accounts
        .create_account(NewAccount::new("alice", "pwd"))
        .await
        .unwrap();

    let mut session = state.auth.authenticate("alice", "pwd").await.unwrap();
    assert!(matches!(
        state.auth.change_password(&mut session, "pwd", "").await,
        Err(IdentityError::InvalidInput(_))
    ));
    assert!(session.is_authenticated());
    assert!(state.auth.authenticate("alice", "pwd").await.is_ok());
}

#[tokio::test]
async fn change_password_respects_account_state() {
    let state = common::spawn_state("auth").await;

    state
        .accounts
        .create_account(NewAccount::new("alice", "pwd"))
        .await
        .unwrap();
    let mut session = state.auth.authenticate("alice", "pwd").await.unwrap();

    set_flags(
        &state,
        "alice",
        AccountFlags {
            account_non_locked: false,
            ..AccountFlags::default()
        },
    )
    .await;

    assert!(matches!(
        state.auth.change_password(&mut session, "pwd", "next").await,
        Err(IdentityError::LockedAccount)
    ));
}
