//! Configuration for accounts and the reconciliation protocol

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Account configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Simulated fetch configuration
    pub fetch: FetchConfig,

    /// Synchronization retry configuration
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "account-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            fetch: FetchConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Simulated remote balance fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Lowest candidate balance (inclusive)
    pub min_balance: i64,

    /// Highest candidate balance (inclusive)
    pub max_balance: i64,

    /// Simulated latency before the draw (milliseconds)
    pub latency_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            min_balance: 0,
            max_balance: 100,
            latency_ms: 0,
        }
    }
}

impl FetchConfig {
    /// Simulated latency
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// Retry with exponential backoff for failed synchronizations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Extra attempts after the first one
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds)
    pub initial_delay_ms: u64,

    /// Delay cap (milliseconds)
    pub max_delay_ms: u64,

    /// Growth factor between retries
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 2_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let base = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = base.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Some(min) = env_parse("ACCOUNT_FETCH_MIN")? {
            config.fetch.min_balance = min;
        }

        if let Some(max) = env_parse("ACCOUNT_FETCH_MAX")? {
            config.fetch.max_balance = max;
        }

        if let Some(latency) = env_parse("ACCOUNT_FETCH_LATENCY_MS")? {
            config.fetch.latency_ms = latency;
        }

        if let Some(retries) = env_parse("ACCOUNT_SYNC_MAX_RETRIES")? {
            config.retry.max_retries = retries;
        }

        if let Some(delay) = env_parse("ACCOUNT_SYNC_RETRY_DELAY_MS")? {
            config.retry.initial_delay_ms = delay;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> crate::Result<()> {
        if self.fetch.min_balance > self.fetch.max_balance {
            return Err(crate::Error::Config(format!(
                "fetch.min_balance {} exceeds fetch.max_balance {}",
                self.fetch.min_balance, self.fetch.max_balance
            )));
        }

        if self.retry.backoff_multiplier.is_nan() || self.retry.backoff_multiplier < 1.0 {
            return Err(crate::Error::Config(format!(
                "retry.backoff_multiplier must be at least 1.0, got {}",
                self.retry.backoff_multiplier
            )));
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> crate::Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| crate::Error::Config(format!("Invalid {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "account-core");
        assert_eq!(config.fetch.min_balance, 0);
        assert_eq!(config.fetch.max_balance, 100);
        assert_eq!(config.fetch.latency(), Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retry_delay_grows_and_caps() {
        let retry = RetryConfig {
            max_retries: 5,
            initial_delay_ms: 100,
            max_delay_ms: 300,
            backoff_multiplier: 2.0,
        };
        assert_eq!(retry.delay_for(0), Duration::from_millis(100));
        assert_eq!(retry.delay_for(1), Duration::from_millis(200));
        assert_eq!(retry.delay_for(2), Duration::from_millis(300));
        assert_eq!(retry.delay_for(10), Duration::from_millis(300));
    }

    #[test]
    fn test_from_file_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[fetch]\nmin_balance = 1\nmax_balance = 50\n\n[retry]\nmax_retries = 0").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.fetch.min_balance, 1);
        assert_eq!(config.fetch.max_balance, 50);
        assert_eq!(config.fetch.latency_ms, 0);
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.service_name, "account-core");
    }

    #[test]
    fn test_from_file_rejects_inverted_range() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[fetch]\nmin_balance = 10\nmax_balance = 5").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_retry_delay_saturates_large_attempts() {
        let retry = RetryConfig::default();
        assert_eq!(retry.delay_for(u32::MAX), Duration::from_millis(retry.max_delay_ms));
    }

    #[test]
    fn test_from_file_rejects_shrinking_backoff() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retry]\nbackoff_multiplier = 0.5").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, crate::Error::Config(msg) if msg.contains("backoff_multiplier")));
    }

    #[test]
    fn test_from_env() {
        // Single test owns the ACCOUNT_* variables so parallel tests cannot race
        const KEYS: [&str; 5] = [
            "ACCOUNT_FETCH_MIN",
            "ACCOUNT_FETCH_MAX",
            "ACCOUNT_FETCH_LATENCY_MS",
            "ACCOUNT_SYNC_MAX_RETRIES",
            "ACCOUNT_SYNC_RETRY_DELAY_MS",
        ];

        std::env::set_var("ACCOUNT_FETCH_MIN", "5");
        std::env::set_var("ACCOUNT_FETCH_MAX", "15");
        std::env::set_var("ACCOUNT_FETCH_LATENCY_MS", "20");
        std::env::set_var("ACCOUNT_SYNC_MAX_RETRIES", "7");
        std::env::set_var("ACCOUNT_SYNC_RETRY_DELAY_MS", "250");

        let config = Config::from_env().unwrap();
        assert_eq!(config.fetch.min_balance, 5);
        assert_eq!(config.fetch.max_balance, 15);
        assert_eq!(config.fetch.latency(), Duration::from_millis(20));
        assert_eq!(config.retry.max_retries, 7);
        assert_eq!(config.retry.initial_delay_ms, 250);

        std::env::set_var("ACCOUNT_SYNC_MAX_RETRIES", "many");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, crate::Error::Config(msg) if msg.contains("ACCOUNT_SYNC_MAX_RETRIES")));

        std::env::set_var("ACCOUNT_SYNC_MAX_RETRIES", "1");
        std::env::set_var("ACCOUNT_FETCH_MIN", "20");
        assert!(matches!(Config::from_env().unwrap_err(), crate::Error::Config(_)));

        for key in KEYS {
            std::env::remove_var(key);
        }
        assert_eq!(Config::from_env().unwrap().fetch.max_balance, 100);
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file("/nonexistent/account.toml").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
