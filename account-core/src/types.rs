//! Core types for accounts
//!
//! Money is held as `Decimal` so every amount is finite and exact.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account identifier
///
/// Minted once per account and shared by every handle to it, so comparing ids
/// is comparing entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Create new account ID (UUIDv7 for time-ordering)
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Point-in-time view of an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Account ID
    pub id: AccountId,

    /// Balance when the snapshot was taken
    pub balance: Decimal,

    /// Last successful synchronization
    pub last_synchronized_at: Option<DateTime<Utc>>,
}
