//! Simulated remote balance source
//!
//! The transport layer never fails: an unreachable service is reported as
//! `None`. Turning that into an error is the account's job
//! (see [`BankAccount::synchronize_balance`](crate::BankAccount::synchronize_balance)).

use crate::config::FetchConfig;
use crate::random::{RandomSource, ThreadRngSource};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Remote source of an account balance
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Fetch the remote balance, `None` when the request failed
    async fn fetch_balance(&self) -> Option<Decimal>;
}

/// Balance source that samples a candidate balance and a success flag
pub struct SimulatedBalanceSource {
    random: Arc<dyn RandomSource>,
    min_balance: i64,
    max_balance: i64,
    latency: Duration,
}

impl SimulatedBalanceSource {
    /// Create source over `random` with default range and no latency
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self::with_config(random, &FetchConfig::default())
    }

    /// Create source from fetch configuration
    pub fn with_config(random: Arc<dyn RandomSource>, config: &FetchConfig) -> Self {
        Self {
            random,
            min_balance: config.min_balance,
            max_balance: config.max_balance,
            latency: config.latency(),
        }
    }
}

impl Default for SimulatedBalanceSource {
    fn default() -> Self {
        Self::new(Arc::new(ThreadRngSource))
    }
}

impl std::fmt::Debug for SimulatedBalanceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedBalanceSource")
            .field("min_balance", &self.min_balance)
            .field("max_balance", &self.max_balance)
            .field("latency", &self.latency)
            .finish()
    }
}

#[async_trait]
impl BalanceSource for SimulatedBalanceSource {
    async fn fetch_balance(&self) -> Option<Decimal> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        // Both draws happen on every call, balance first
        let balance = self.random.random(self.min_balance, self.max_balance);
        let request_succeeded = self.random.random(0, 1) != 0;

        if request_succeeded {
            tracing::debug!(balance, "Simulated fetch succeeded");
            Some(Decimal::from(balance))
        } else {
            tracing::debug!("Simulated fetch failed");
            None
        }
    }
}
