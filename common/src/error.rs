//! Error types for vault ledger operations.
//!
//! Each operation has its own closed error enum so callers match on exactly
//! the outcomes that operation can produce. [`VaultError`] is the union used
//! by the call dispatcher.

use crate::{AccountId, Amount};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Construction-time parameter errors. No ledger is created.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Withdrawal limit must be positive.
    #[error("Invalid withdrawal limit: {0}")]
    InvalidWithdrawalLimit(Amount),

    /// Bank cap must be positive.
    #[error("Invalid bank cap: {0}")]
    InvalidBankCap(Amount),

    /// Withdrawal limit exceeds the bank cap.
    #[error("Invalid parameters: withdrawal limit {withdrawal_limit} exceeds bank cap {bank_cap}")]
    InvalidParameters {
        withdrawal_limit: Amount,
        bank_cap: Amount,
    },
}

impl ConfigError {
    /// Get error code for protocol messages.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::InvalidWithdrawalLimit(_) => "INVALID_WITHDRAWAL_LIMIT",
            ConfigError::InvalidBankCap(_) => "INVALID_BANK_CAP",
            ConfigError::InvalidParameters { .. } => "INVALID_PARAMETERS",
        }
    }
}

/// Errors returned by `deposit`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DepositError {
    /// Deposit would push the ledger above its bank cap.
    #[error("Deposit limit exceeded: depositing {attempted} with {held} held against cap {bank_cap}")]
    LimitExceeded {
        attempted: Amount,
        held: Amount,
        bank_cap: Amount,
    },

    /// The deposit counter cannot be incremented.
    #[error("Deposit counter overflow")]
    CounterOverflow,
}

/// Errors returned by `withdraw`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WithdrawError {
    /// Requested amount exceeds the per-operation limit.
    #[error("Withdrawal limit exceeded: requested {requested}, limit {limit}")]
    LimitExceeded { requested: Amount, limit: Amount },

    /// Account balance is below the requested amount.
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Amount, available: Amount },

    /// The outbound transfer failed; the debit was rolled back.
    #[error("Transfer of {amount} to {recipient} failed: {source}")]
    TransferFailed {
        recipient: AccountId,
        amount: Amount,
        #[source]
        source: TransferError,
    },

    /// The withdrawal counter cannot be incremented.
    #[error("Withdrawal counter overflow")]
    CounterOverflow,
}

/// Outcome reported by a transfer executor that could not deliver value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Recipient refused the value.
    #[error("recipient rejected transfer: {0}")]
    Rejected(String),

    /// Executor could not reach the recipient.
    #[error("recipient unavailable: {0}")]
    Unavailable(String),

    /// Executor panicked before reporting an outcome.
    #[error("transfer panicked: {0}")]
    Panicked(String),
}

/// Union of every outcome the call dispatcher can reject with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error(transparent)]
    Deposit(#[from] DepositError),

    #[error(transparent)]
    Withdraw(#[from] WithdrawError),

    /// Interaction matched no recognized operation.
    #[error("Unrecognized call from {caller} carrying {value}")]
    UnrecognizedCall { caller: AccountId, value: Amount },
}

impl VaultError {
    /// Check if retrying the same call could succeed without other state changing.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VaultError::Withdraw(WithdrawError::TransferFailed {
                source: TransferError::Unavailable(_),
                ..
            })
        )
    }

    /// Get error code for protocol messages.
    pub fn error_code(&self) -> &'static str {
        match self {
            VaultError::Deposit(DepositError::LimitExceeded { .. }) => "DEPOSIT_LIMIT_EXCEEDED",
            VaultError::Deposit(DepositError::CounterOverflow) => "COUNTER_OVERFLOW",
            VaultError::Withdraw(WithdrawError::LimitExceeded { .. }) => {
                "WITHDRAWAL_LIMIT_EXCEEDED"
            }
            VaultError::Withdraw(WithdrawError::InsufficientBalance { .. }) => {
                "INSUFFICIENT_BALANCE"
            }
            VaultError::Withdraw(WithdrawError::TransferFailed { .. }) => "TRANSFER_FAILED",
            VaultError::Withdraw(WithdrawError::CounterOverflow) => "COUNTER_OVERFLOW",
            VaultError::UnrecognizedCall { .. } => "UNRECOGNIZED_CALL",
        }
    }

    /// Render as a wire-friendly report.
    pub fn report(&self) -> ErrorReport {
        ErrorReport::new(self.error_code(), self.to_string())
    }
}

/// Serializable error summary returned to remote callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl ErrorReport {
    /// Create a new error report.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err: VaultError = WithdrawError::InsufficientBalance {
            requested: Amount::new(50),
            available: Amount::new(40),
        }
        .into();
        assert_eq!(err.error_code(), "INSUFFICIENT_BALANCE");
        assert!(!err.is_retryable());

        let report = err.report();
        assert_eq!(report.code, "INSUFFICIENT_BALANCE");
        assert!(report.message.contains("requested 50"));
    }

    #[test]
    fn test_unavailable_transfer_is_retryable() {
        let err: VaultError = WithdrawError::TransferFailed {
            recipient: AccountId::new("alice"),
            amount: Amount::new(10),
            source: TransferError::Unavailable("timeout".into()),
        }
        .into();
        assert_eq!(err.error_code(), "TRANSFER_FAILED");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_config_error_names_offending_value() {
        let err = ConfigError::InvalidBankCap(Amount::ZERO);
        assert_eq!(err.error_code(), "INVALID_BANK_CAP");
        assert_eq!(err.to_string(), "Invalid bank cap: 0");
    }
}
