//! Error types for account operations

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for account operations
pub type Result<T> = std::result::Result<T, Error>;

/// Account errors
#[derive(Error, Debug)]
pub enum Error {
    /// Withdrawal or transfer exceeds the balance held at failure time
    #[error("Insufficient funds: cannot withdraw more than {balance}")]
    InsufficientFunds {
        /// Balance at the moment the operation was rejected
        balance: Decimal,
    },

    /// Source and destination of a transfer are the same account
    #[error("Transfer failed")]
    TransferFailed,

    /// Remote balance fetch reported no data
    #[error("Synchronization failed")]
    SynchronizationFailed,

    /// Negative transfer amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Result does not fit in a decimal
    #[error("Amount overflow: {balance} + {amount}")]
    AmountOverflow {
        /// Balance before the operation
        balance: Decimal,
        /// Amount that could not be added
        amount: Decimal,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether retrying the same call may succeed without caller changes
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::SynchronizationFailed)
    }
}
