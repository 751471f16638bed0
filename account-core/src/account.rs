//! Bank account entity
//!
//! A [`BankAccount`] is a cheap handle: clones share the same balance and the
//! same [`AccountId`]. Ledger operations lock the account for their whole
//! check-and-mutate, so a rejected operation never leaves a partial write.
//!
//! # Example
//!
//! ```
//! use account_core::{get_bank_account, Error};
//! use rust_decimal::Decimal;
//!
//! let account = get_bank_account(Decimal::from(100));
//! let other = get_bank_account(Decimal::ZERO);
//!
//! account.withdraw(Decimal::from(30))?.transfer(Decimal::from(20), &other)?;
//! assert_eq!(account.balance(), Decimal::from(50));
//! assert_eq!(other.balance(), Decimal::from(20));
//!
//! let err = account.transfer(Decimal::from(20), &account).unwrap_err();
//! assert!(matches!(err, Error::TransferFailed));
//! # Ok::<(), Error>(())
//! ```

use crate::config::{Config, RetryConfig};
use crate::metrics::{Metrics, Operation};
use crate::random::RandomSource;
use crate::reconcile::{BalanceSource, SimulatedBalanceSource};
use crate::types::{AccountId, AccountSnapshot};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Mutable part of an account
#[derive(Debug)]
struct AccountState {
    balance: Decimal,
    last_synchronized_at: Option<DateTime<Utc>>,
}

struct Inner {
    id: AccountId,
    state: Mutex<AccountState>,
    source: Arc<dyn BalanceSource>,
    metrics: Option<Metrics>,
}

/// Single-owner bank account
#[derive(Clone)]
pub struct BankAccount {
    inner: Arc<Inner>,
}

/// Create an account holding `initial_balance`
pub fn get_bank_account(initial_balance: Decimal) -> BankAccount {
    BankAccount::new(initial_balance)
}

impl BankAccount {
    /// Create account backed by the thread RNG balance source
    pub fn new(initial_balance: Decimal) -> Self {
        AccountBuilder::new(initial_balance).build()
    }

    /// Start building an account
    pub fn builder(initial_balance: Decimal) -> AccountBuilder {
        AccountBuilder::new(initial_balance)
    }

    /// Account identity
    pub fn id(&self) -> AccountId {
        self.inner.id
    }

    /// Current balance
    pub fn balance(&self) -> Decimal {
        self.inner.state.lock().balance
    }

    /// Time of the last successful synchronization
    pub fn last_synchronized_at(&self) -> Option<DateTime<Utc>> {
        self.inner.state.lock().last_synchronized_at
    }

    /// Point-in-time view
    pub fn snapshot(&self) -> AccountSnapshot {
        let state = self.inner.state.lock();
        AccountSnapshot {
            id: self.inner.id,
            balance: state.balance,
            last_synchronized_at: state.last_synchronized_at,
        }
    }

    /// Add `amount` to the balance
    pub fn deposit(&self, amount: Decimal) -> Result<&Self> {
        let result = self.apply_deposit(amount);
        self.record(Operation::Deposit, result.is_ok());
        result.map(|_| self)
    }

    /// Remove `amount` from the balance
    ///
    /// Fails with [`Error::InsufficientFunds`] when `amount` exceeds the
    /// current balance; the balance is left as it was.
    pub fn withdraw(&self, amount: Decimal) -> Result<&Self> {
        let result = self.apply_withdraw(amount);
        self.record(Operation::Withdraw, result.is_ok());
        result.map(|_| self)
    }

    /// Move `amount` from this account to `destination`
    ///
    /// Self-transfer fails with [`Error::TransferFailed`] before anything else
    /// is checked. Either both balances change or neither does.
    pub fn transfer(&self, amount: Decimal, destination: &BankAccount) -> Result<&Self> {
        let result = self.apply_transfer(amount, destination);
        self.record(Operation::Transfer, result.is_ok());
        result.map(|_| self)
    }

    /// Fetch the remote balance without applying it
    pub async fn fetch_balance(&self) -> Option<Decimal> {
        self.inner.source.fetch_balance().await
    }

    /// Overwrite the balance with the remote one
    ///
    /// Performs exactly one fetch. No data from the remote side is reported as
    /// [`Error::SynchronizationFailed`] and the balance is left untouched.
    /// The account is not locked across the fetch: concurrent calls each
    /// fetch and the last one to resolve wins.
    pub async fn synchronize_balance(&self) -> Result<()> {
        let started = Instant::now();
        let fetched = self.fetch_balance().await;

        let result = match fetched {
            Some(balance) => {
                let previous = {
                    let mut state = self.inner.state.lock();
                    state.last_synchronized_at = Some(Utc::now());
                    std::mem::replace(&mut state.balance, balance)
                };
                info!(account = %self.inner.id, %previous, %balance, "Balance synchronized");
                Ok(())
            }
            None => {
                warn!(account = %self.inner.id, "Balance synchronization failed");
                Err(Error::SynchronizationFailed)
            }
        };

        if let Some(metrics) = &self.inner.metrics {
            metrics.record_synchronization(result.is_ok(), started.elapsed().as_secs_f64());
        }

        result
    }

    /// Synchronize, retrying failed fetches with exponential backoff
    pub async fn synchronize_with_retry(&self, retry: &RetryConfig) -> Result<()> {
        let mut last_error = None;

        for attempt in 0..=retry.max_retries {
            if attempt > 0 {
                let delay = retry.delay_for(attempt - 1);
                warn!(
                    account = %self.inner.id,
                    "Retry attempt {}/{} for synchronize after {:?}",
                    attempt, retry.max_retries, delay
                );
                tokio::time::sleep(delay).await;
            }

            match self.synchronize_balance().await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(Error::SynchronizationFailed))
    }

    fn apply_deposit(&self, amount: Decimal) -> Result<()> {
        let mut state = self.inner.state.lock();
        state.balance = checked_credit(state.balance, amount)?;
        debug!(account = %self.inner.id, %amount, balance = %state.balance, "Deposit applied");
        Ok(())
    }

    fn apply_withdraw(&self, amount: Decimal) -> Result<()> {
        let mut state = self.inner.state.lock();
        if amount > state.balance {
            warn!(account = %self.inner.id, %amount, balance = %state.balance, "Withdraw rejected");
            return Err(Error::InsufficientFunds {
                balance: state.balance,
            });
        }

        state.balance = checked_debit(state.balance, amount)?;
        debug!(account = %self.inner.id, %amount, balance = %state.balance, "Withdraw applied");
        Ok(())
    }

    fn apply_transfer(&self, amount: Decimal, destination: &BankAccount) -> Result<()> {
        if self.inner.id == destination.inner.id {
            warn!(account = %self.inner.id, %amount, "Transfer to same account rejected");
            return Err(Error::TransferFailed);
        }

        // A negative transfer would debit the destination without a funds check
        ensure_non_negative(amount)?;

        // Lock in id order so opposing transfers cannot deadlock
        let (mut source, mut target) = if self.inner.id < destination.inner.id {
            let source = self.inner.state.lock();
            let target = destination.inner.state.lock();
            (source, target)
        } else {
            let target = destination.inner.state.lock();
            let source = self.inner.state.lock();
            (source, target)
        };

        if amount > source.balance {
            warn!(
                account = %self.inner.id,
                destination = %destination.inner.id,
                %amount,
                balance = %source.balance,
                "Transfer rejected"
            );
            return Err(Error::InsufficientFunds {
                balance: source.balance,
            });
        }

        let debited = checked_debit(source.balance, amount)?;
        let credited = checked_credit(target.balance, amount)?;
        source.balance = debited;
        target.balance = credited;

        debug!(
            account = %self.inner.id,
            destination = %destination.inner.id,
            %amount,
            "Transfer applied"
        );
        Ok(())
    }

    fn record(&self, operation: Operation, applied: bool) {
        if let Some(metrics) = &self.inner.metrics {
            if applied {
                metrics.record_applied(operation);
            } else {
                metrics.record_rejected(operation);
            }
        }
    }
}

/// Same entity, not same balance
impl PartialEq for BankAccount {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for BankAccount {}

impl fmt::Debug for BankAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("BankAccount")
            .field("id", &self.inner.id)
            .field("balance", &state.balance)
            .field("last_synchronized_at", &state.last_synchronized_at)
            .finish()
    }
}

/// Builder for [`BankAccount`]
pub struct AccountBuilder {
    initial_balance: Decimal,
    source: Option<Arc<dyn BalanceSource>>,
    metrics: Option<Metrics>,
}

impl AccountBuilder {
    /// Start with `initial_balance`
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            initial_balance,
            source: None,
            metrics: None,
        }
    }

    /// Use a custom balance source
    pub fn with_source(mut self, source: Arc<dyn BalanceSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Simulated source over `random` with default fetch settings
    pub fn with_random(self, random: Arc<dyn RandomSource>) -> Self {
        self.with_source(Arc::new(SimulatedBalanceSource::new(random)))
    }

    /// Simulated source over `random` with configured fetch settings
    pub fn with_config(self, config: &Config, random: Arc<dyn RandomSource>) -> Self {
        self.with_source(Arc::new(SimulatedBalanceSource::with_config(
            random,
            &config.fetch,
        )))
    }

    /// Record operations into `metrics`
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the account
    pub fn build(self) -> BankAccount {
        let source = self
            .source
            .unwrap_or_else(|| Arc::new(SimulatedBalanceSource::default()));

        BankAccount {
            inner: Arc::new(Inner {
                id: AccountId::new(),
                state: Mutex::new(AccountState {
                    balance: self.initial_balance,
                    last_synchronized_at: None,
                }),
                source,
                metrics: self.metrics,
            }),
        }
    }
}

impl fmt::Debug for AccountBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountBuilder")
            .field("initial_balance", &self.initial_balance)
            .field("custom_source", &self.source.is_some())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

fn ensure_non_negative(amount: Decimal) -> Result<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::InvalidAmount(amount));
    }
    Ok(())
}

fn checked_credit(balance: Decimal, amount: Decimal) -> Result<Decimal> {
    balance
        .checked_add(amount)
        .ok_or(Error::AmountOverflow { balance, amount })
}

fn checked_debit(balance: Decimal, amount: Decimal) -> Result<Decimal> {
    balance
        .checked_sub(amount)
        .ok_or(Error::AmountOverflow {
            balance,
            amount: -amount,
        })
}
