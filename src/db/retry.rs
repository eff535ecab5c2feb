//! Retry for write transactions that lose the SQLite write lock.
//!
//! A deferred transaction that reads before it writes cannot wait on the busy
//! handler when another connection already holds the lock, so SQLite fails it
//! straight away. Those attempts are rolled back and rerun here.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::services::IdentityError;

#[derive(Debug, Clone, Copy)]
pub struct BusyRetry {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for BusyRetry {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(250),
        }
    }
}

impl BusyRetry {
    /// Backoff before retry number `attempt` (0-indexed), doubling up to the cap.
    #[must_use]
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_backoff)
    }

    /// Run `op` until it returns something other than [`IdentityError::Busy`],
    /// or the attempts run out.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, IdentityError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, IdentityError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(IdentityError::Busy(msg)) if attempt + 1 < self.max_attempts => {
                    let backoff = self.backoff_for_attempt(attempt);
                    // Jitter keeps writers that collided from retrying in lockstep
                    let jitter = Duration::from_micros(
                        rand::rng().random_range(0..=self.initial_backoff_micros()),
                    );
                    debug!(
                        attempt = attempt + 1,
                        "{} hit a locked database, retrying: {}", what, msg
                    );
                    tokio::time::sleep(backoff + jitter).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn initial_backoff_micros(&self) -> u64 {
        u64::try_from(self.initial_backoff.as_micros()).unwrap_or(u64::MAX)
    }
}
