//! Account Core
//!
//! Single-account ledger with a simulated unreliable balance reconciliation.
//!
//! # Architecture
//!
//! - **Ledger Operations**: deposit, withdraw and transfer mutate the balance in place
//! - **Reconciliation**: fetch a remote balance, overwrite the local one on success
//! - **Injected Randomness**: the simulated fetch draws from a [`RandomSource`]
//! - **Shared Handles**: [`BankAccount`] clones refer to the same account
//!
//! # Invariants
//!
//! - Withdraw and transfer never drive a balance negative
//! - A transfer never has the same account on both sides
//! - A failed operation leaves every balance exactly as it was
//! - Fetch reports failure as `None`; only synchronize turns it into an error

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod error;
pub mod random;
pub mod reconcile;
pub mod account;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Result};
pub use types::{AccountId, AccountSnapshot};
pub use random::{RandomSource, ScriptedSource, ThreadRngSource};
pub use reconcile::{BalanceSource, SimulatedBalanceSource};
pub use account::{get_bank_account, AccountBuilder, BankAccount};
pub use config::{Config, FetchConfig, RetryConfig};
pub use metrics::Metrics;
