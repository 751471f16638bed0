//! Account demo binary
//!
//! Walks one account through deposits, a rejected transfer and a
//! reconciliation against the simulated remote balance.

use account_core::{BankAccount, Config, Error, Metrics, ThreadRngSource};
use anyhow::Context;
use rust_decimal::Decimal;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path).with_context(|| format!("loading {}", path))?,
        None => Config::from_env().context("loading config from environment")?,
    };

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        "Starting account demo"
    );

    let metrics = Metrics::new()?;
    let account = BankAccount::builder(Decimal::from(100))
        .with_config(&config, Arc::new(ThreadRngSource))
        .with_metrics(metrics.clone())
        .build();
    let savings = BankAccount::new(Decimal::ZERO);

    account
        .withdraw(Decimal::from(30))?
        .transfer(Decimal::from(20), &savings)?;
    tracing::info!(balance = %account.balance(), savings = %savings.balance(), "Ledger operations applied");

    match account.transfer(Decimal::from(1_000), &savings) {
        Err(e @ Error::InsufficientFunds { .. }) => tracing::warn!("{}", e),
        other => anyhow::bail!("expected insufficient funds, got {:?}", other),
    }

    match account.synchronize_with_retry(&config.retry).await {
        Ok(()) => tracing::info!(balance = %account.balance(), "Reconciled with remote balance"),
        Err(e) => tracing::warn!(balance = %account.balance(), "Reconciliation gave up: {}", e),
    }

    println!("{}", serde_json::to_string_pretty(&account.snapshot())?);
    print!("{}", metrics.render()?);
    tracing::info!(
        synchronizations = metrics.synchronizations_total.get(),
        failures = metrics.synchronization_failures_total.get(),
        "Shutting down account demo"
    );
    Ok(())
}
