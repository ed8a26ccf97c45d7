//! Ledger parameter validation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use strongbox_common::{Amount, ConfigError};

/// Immutable ledger parameters. Only obtainable through [`ParameterValidator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerParams {
    withdrawal_limit: Amount,
    bank_cap: Amount,
}

impl LedgerParams {
    /// Maximum amount movable in a single withdrawal.
    pub fn withdrawal_limit(&self) -> Amount {
        self.withdrawal_limit
    }

    /// Maximum total the ledger may hold at once.
    pub fn bank_cap(&self) -> Amount {
        self.bank_cap
    }
}

/// How strictly the parameter pair is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValidationMode {
    /// Both values positive and `withdrawal_limit <= bank_cap`.
    #[default]
    Strict,
    /// Both values positive.
    Lenient,
}

/// Validates the fixed configuration values at construction time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterValidator {
    mode: ValidationMode,
}

impl ParameterValidator {
    /// Validator enforcing the cross-check.
    pub fn strict() -> Self {
        Self {
            mode: ValidationMode::Strict,
        }
    }

    /// Validator checking positivity only.
    pub fn lenient() -> Self {
        Self {
            mode: ValidationMode::Lenient,
        }
    }

    /// Validator with an explicit mode.
    pub fn with_mode(mode: ValidationMode) -> Self {
        Self { mode }
    }

    /// Validate a parameter pair into [`LedgerParams`].
    pub fn validate(
        &self,
        withdrawal_limit: Amount,
        bank_cap: Amount,
    ) -> Result<LedgerParams, ConfigError> {
        if withdrawal_limit.is_zero() {
            return Err(ConfigError::InvalidWithdrawalLimit(withdrawal_limit));
        }

        if bank_cap.is_zero() {
            return Err(ConfigError::InvalidBankCap(bank_cap));
        }

        if self.mode == ValidationMode::Strict && withdrawal_limit > bank_cap {
            return Err(ConfigError::InvalidParameters {
                withdrawal_limit,
                bank_cap,
            });
        }

        debug!(
            withdrawal_limit = %withdrawal_limit,
            bank_cap = %bank_cap,
            mode = ?self.mode,
            "Ledger parameters validated"
        );

        Ok(LedgerParams {
            withdrawal_limit,
            bank_cap,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_parameters() {
        let params = ParameterValidator::strict()
            .validate(Amount::new(100), Amount::new(1000))
            .unwrap();
        assert_eq!(params.withdrawal_limit(), Amount::new(100));
        assert_eq!(params.bank_cap(), Amount::new(1000));
    }

    #[test]
    fn test_zero_withdrawal_limit() {
        let err = ParameterValidator::strict()
            .validate(Amount::ZERO, Amount::new(1000))
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidWithdrawalLimit(Amount::ZERO));
    }

    #[test]
    fn test_zero_bank_cap() {
        let err = ParameterValidator::lenient()
            .validate(Amount::new(10), Amount::ZERO)
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidBankCap(Amount::ZERO));
    }

    #[test]
    fn test_limit_above_cap() {
        let err = ParameterValidator::strict()
            .validate(Amount::new(2000), Amount::new(1000))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidParameters {
                withdrawal_limit: Amount::new(2000),
                bank_cap: Amount::new(1000),
            }
        );

        // Lenient mode accepts the same pair.
        assert!(ParameterValidator::lenient()
            .validate(Amount::new(2000), Amount::new(1000))
            .is_ok());
    }

    #[test]
    fn test_default_is_strict() {
        let pair = (Amount::new(2000), Amount::new(1000));
        assert_eq!(
            ParameterValidator::default().validate(pair.0, pair.1),
            ParameterValidator::with_mode(ValidationMode::Strict).validate(pair.0, pair.1)
        );
        assert!(ParameterValidator::default().validate(pair.0, pair.1).is_err());
    }
}
