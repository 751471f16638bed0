//! Metrics collection for observability
//!
//! Prometheus metrics for account activity.
//!
//! # Metrics
//!
//! - `account_operations_total{operation, outcome}` - Ledger operations by result
//! - `account_synchronizations_total` - Successful balance synchronizations
//! - `account_synchronization_failures_total` - Fetches that returned no data
//! - `account_sync_duration_seconds` - Histogram of synchronize latencies

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Ledger operation label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Deposit
    Deposit,
    /// Withdraw
    Withdraw,
    /// Transfer
    Transfer,
}

impl Operation {
    fn label(&self) -> &'static str {
        match self {
            Operation::Deposit => "deposit",
            Operation::Withdraw => "withdraw",
            Operation::Transfer => "transfer",
        }
    }
}

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Ledger operations by operation and outcome
    pub operations_total: IntCounterVec,

    /// Successful synchronizations
    pub synchronizations_total: IntCounter,

    /// Failed synchronizations
    pub synchronization_failures_total: IntCounter,

    /// Synchronize duration histogram
    pub sync_duration: Histogram,

    registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let operations_total = IntCounterVec::new(
            Opts::new("account_operations_total", "Ledger operations by result"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let synchronizations_total = IntCounter::new(
            "account_synchronizations_total",
            "Successful balance synchronizations",
        )?;
        registry.register(Box::new(synchronizations_total.clone()))?;

        let synchronization_failures_total = IntCounter::new(
            "account_synchronization_failures_total",
            "Fetches that returned no data",
        )?;
        registry.register(Box::new(synchronization_failures_total.clone()))?;

        let sync_duration = Histogram::with_opts(
            HistogramOpts::new(
                "account_sync_duration_seconds",
                "Histogram of synchronize latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(sync_duration.clone()))?;

        Ok(Self {
            operations_total,
            synchronizations_total,
            synchronization_failures_total,
            sync_duration,
            registry,
        })
    }

    /// Record an applied ledger operation
    pub fn record_applied(&self, operation: Operation) {
        self.operations_total
            .with_label_values(&[operation.label(), "applied"])
            .inc();
    }

    /// Record a rejected ledger operation
    pub fn record_rejected(&self, operation: Operation) {
        self.operations_total
            .with_label_values(&[operation.label(), "rejected"])
            .inc();
    }

    /// Record synchronize outcome and duration
    pub fn record_synchronization(&self, succeeded: bool, duration_seconds: f64) {
        if succeeded {
            self.synchronizations_total.inc();
        } else {
            self.synchronization_failures_total.inc();
        }
        self.sync_duration.observe(duration_seconds);
    }

    /// Applied count for an operation
    pub fn applied(&self, operation: Operation) -> u64 {
        self.operations_total
            .with_label_values(&[operation.label(), "applied"])
            .get()
    }

    /// Rejected count for an operation
    pub fn rejected(&self, operation: Operation) -> u64 {
        self.operations_total
            .with_label_values(&[operation.label(), "rejected"])
            .get()
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("synchronizations_total", &self.synchronizations_total.get())
            .field(
                "synchronization_failures_total",
                &self.synchronization_failures_total.get(),
            )
            .finish_non_exhaustive()
    }
}
