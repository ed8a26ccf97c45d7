//! Metrics collection for node monitoring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use strongbox_common::{CallOutcome, VaultError, WithdrawError};

/// Node metrics.
pub struct Metrics {
    /// Total calls handled (duplicates excluded).
    pub calls_total: AtomicU64,
    /// Successful deposits.
    pub deposits: AtomicU64,
    /// Successful withdrawals.
    pub withdrawals: AtomicU64,
    /// Successful queries.
    pub queries: AtomicU64,
    /// Calls rejected by a limit, cap or balance check.
    pub calls_rejected: AtomicU64,
    /// Withdrawals whose transfer failed and was rolled back.
    pub transfers_failed: AtomicU64,
    /// Calls matching no recognized operation.
    pub calls_unrecognized: AtomicU64,
    /// Requests answered from the idempotency cache.
    pub requests_duplicate: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            calls_total: AtomicU64::new(0),
            deposits: AtomicU64::new(0),
            withdrawals: AtomicU64::new(0),
            queries: AtomicU64::new(0),
            calls_rejected: AtomicU64::new(0),
            transfers_failed: AtomicU64::new(0),
            calls_unrecognized: AtomicU64::new(0),
            requests_duplicate: AtomicU64::new(0),
        }
    }

    /// Record the result of a dispatched call.
    pub fn record(&self, result: &Result<CallOutcome, VaultError>) {
        self.calls_total.fetch_add(1, Ordering::Relaxed);

        let counter = match result {
            Ok(CallOutcome::Deposited { .. }) => &self.deposits,
            Ok(CallOutcome::Withdrawn { .. }) => &self.withdrawals,
            Ok(CallOutcome::Balance { .. }) | Ok(CallOutcome::Stats(_)) => &self.queries,
            Err(VaultError::Withdraw(WithdrawError::TransferFailed { .. })) => {
                &self.transfers_failed
            }
            Err(VaultError::UnrecognizedCall { .. }) => &self.calls_unrecognized,
            Err(_) => &self.calls_rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request answered from the idempotency cache.
    pub fn duplicate_request(&self) {
        self.requests_duplicate.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            calls_total: self.calls_total.load(Ordering::Relaxed),
            deposits: self.deposits.load(Ordering::Relaxed),
            withdrawals: self.withdrawals.load(Ordering::Relaxed),
            queries: self.queries.load(Ordering::Relaxed),
            calls_rejected: self.calls_rejected.load(Ordering::Relaxed),
            transfers_failed: self.transfers_failed.load(Ordering::Relaxed),
            calls_unrecognized: self.calls_unrecognized.load(Ordering::Relaxed),
            requests_duplicate: self.requests_duplicate.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP strongbox_calls_total Total number of calls handled
# TYPE strongbox_calls_total counter
strongbox_calls_total {}

# HELP strongbox_deposits Total successful deposits
# TYPE strongbox_deposits counter
strongbox_deposits {}

# HELP strongbox_withdrawals Total successful withdrawals
# TYPE strongbox_withdrawals counter
strongbox_withdrawals {}

# HELP strongbox_queries Total balance and stats queries
# TYPE strongbox_queries counter
strongbox_queries {}

# HELP strongbox_calls_rejected Total calls rejected by limit, cap or balance checks
# TYPE strongbox_calls_rejected counter
strongbox_calls_rejected {}

# HELP strongbox_transfers_failed Total withdrawals rolled back after a failed transfer
# TYPE strongbox_transfers_failed counter
strongbox_transfers_failed {}

# HELP strongbox_calls_unrecognized Total unrecognized calls
# TYPE strongbox_calls_unrecognized counter
strongbox_calls_unrecognized {}

# HELP strongbox_requests_duplicate Total duplicate requests answered from cache
# TYPE strongbox_requests_duplicate counter
strongbox_requests_duplicate {}
"#,
            snapshot.calls_total,
            snapshot.deposits,
            snapshot.withdrawals,
            snapshot.queries,
            snapshot.calls_rejected,
            snapshot.transfers_failed,
            snapshot.calls_unrecognized,
            snapshot.requests_duplicate,
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub calls_total: u64,
    pub deposits: u64,
    pub withdrawals: u64,
    pub queries: u64,
    pub calls_rejected: u64,
    pub transfers_failed: u64,
    pub calls_unrecognized: u64,
    pub requests_duplicate: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;

#[cfg(test)]
mod tests {
    use super::*;
    use strongbox_common::{AccountId, Amount, DepositError};

    #[test]
    fn test_metrics_record() {
        let metrics = Metrics::new();

        metrics.record(&Ok(CallOutcome::Deposited {
            account: AccountId::new("alice"),
            amount: Amount::new(10),
        }));
        metrics.record(&Err(VaultError::Deposit(DepositError::CounterOverflow)));
        metrics.record(&Err(VaultError::UnrecognizedCall {
            caller: AccountId::new("mallory"),
            value: Amount::ZERO,
        }));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.calls_total, 3);
        assert_eq!(snapshot.deposits, 1);
        assert_eq!(snapshot.calls_rejected, 1);
        assert_eq!(snapshot.calls_unrecognized, 1);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = Metrics::new();
        metrics.duplicate_request();

        let output = metrics.to_prometheus();
        assert!(output.contains("strongbox_requests_duplicate 1"));
        assert!(output.contains("strongbox_calls_total 0"));
    }
}
