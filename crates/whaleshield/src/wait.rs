//! Funds-arrival watcher

use std::time::Duration;

use tracing::instrument;
use whaleshield_common::{Address, Amount, LedgerConnector};

use crate::Error;

/// Polls an account's balance until it clears a threshold
#[derive(Debug, Clone, Copy)]
pub struct FundsWatcher {
    interval: Duration,
    max_attempts: u32,
}

impl FundsWatcher {
    /// Create new [`FundsWatcher`]
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Longest time [`FundsWatcher::wait_for_balance`] can take, excluding poll latency
    pub fn max_wait(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }

    /// Wait until the balance of `address` is strictly greater than `threshold`
    ///
    /// Returns the observed balance. A failed poll counts as an attempt. After
    /// every unsatisfied attempt the watcher sleeps the full interval, and
    /// fails with [`Error::Timeout`] once the attempts are exhausted.
    #[instrument(skip(self, ledger))]
    pub async fn wait_for_balance(
        &self,
        ledger: &dyn LedgerConnector,
        address: &Address,
        threshold: Amount,
    ) -> Result<Amount, Error> {
        for attempt in 1..=self.max_attempts {
            match ledger.get_balance(address).await {
                Ok(balance) if balance > threshold => {
                    tracing::debug!(
                        "Balance of {} is {} after {} polls",
                        address,
                        balance,
                        attempt
                    );
                    return Ok(balance);
                }
                Ok(balance) => {
                    tracing::trace!("Poll {}: balance of {} is {}", attempt, address, balance);
                }
                Err(err) => {
                    tracing::warn!("Poll {}: balance query failed: {}", attempt, err);
                }
            }

            tokio::time::sleep(self.interval).await;
        }

        tracing::warn!(
            "Balance of {} did not exceed {} within {:?}",
            address,
            threshold,
            self.max_wait()
        );

        Err(Error::Timeout)
    }
}
