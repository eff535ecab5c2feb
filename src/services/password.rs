//! Password hashing provider.
//!
//! Hashing is CPU-intensive; async callers should go through
//! [`hash_blocking`] and [`verify_blocking`] so the runtime is not stalled.

use std::sync::Arc;

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::config::SecurityConfig;

/// One-way, salted password hashing.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String>;

    /// Returns `Ok(false)` on mismatch; errors only on a malformed stored hash.
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool>;
}

/// Argon2id hasher with configurable cost parameters.
#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        Ok(Self {
            params: config.argon2_params()?,
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        // Params are read from the PHC string, so hashes made with older
        // settings still verify.
        Ok(Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

/// Hash on the blocking pool.
pub async fn hash_blocking(hasher: Arc<dyn CredentialHasher>, plaintext: &str) -> Result<String> {
    let plaintext = plaintext.to_string();
    task::spawn_blocking(move || hasher.hash(&plaintext))
        .await
        .context("Password hashing task panicked")?
}

/// Verify on the blocking pool.
pub async fn verify_blocking(
    hasher: Arc<dyn CredentialHasher>,
    plaintext: &str,
    hash: String,
) -> Result<bool> {
    let plaintext = plaintext.to_string();
    task::spawn_blocking(move || hasher.verify(&plaintext, &hash))
        .await
        .context("Password verification task panicked")?
}
