//! Routing of inbound interactions and rejection of unrecognized ones.

use serde::{Deserialize, Serialize};

use strongbox_common::{AccountId, Amount, Interaction, Operation};

/// Whether a rejected interaction leaves a diagnostic notification behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiagnosticPolicy {
    /// Journal an `UnexpectedCall` before rejecting.
    #[default]
    Emit,
    /// Reject without a notification.
    Silent,
}

/// Where an interaction is routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Credit the attached value to the caller.
    Deposit { account: AccountId, amount: Amount },
    /// Debit and deliver `amount` to the caller.
    Withdraw { account: AccountId, amount: Amount },
    /// Read an account balance.
    Balance { account: AccountId },
    /// Read the counters.
    Stats,
    /// Matches nothing; reject without touching ledger state.
    Unrecognized,
}

/// Classifies interactions against the recognized operation set.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnrecognizedCallGuard {
    policy: DiagnosticPolicy,
}

impl UnrecognizedCallGuard {
    pub fn new(policy: DiagnosticPolicy) -> Self {
        Self { policy }
    }

    /// Whether rejections are journaled.
    pub fn emits_diagnostics(&self) -> bool {
        self.policy == DiagnosticPolicy::Emit
    }

    /// Route an interaction.
    ///
    /// A bare value transfer is a deposit. Value attached to a non-payable
    /// operation makes the interaction unrecognized.
    pub fn route(&self, interaction: &Interaction) -> Route {
        if interaction.is_bare_transfer() {
            return Route::Deposit {
                account: interaction.caller.clone(),
                amount: interaction.value,
            };
        }

        let Some(operation) = Operation::decode(&interaction.payload) else {
            return Route::Unrecognized;
        };

        if !operation.is_payable() && !interaction.value.is_zero() {
            return Route::Unrecognized;
        }

        match operation {
            Operation::Deposit => Route::Deposit {
                account: interaction.caller.clone(),
                amount: interaction.value,
            },
            Operation::Withdraw { amount } => Route::Withdraw {
                account: interaction.caller.clone(),
                amount,
            },
            Operation::GetVaultBalance { account } => Route::Balance { account },
            Operation::GetStats => Route::Stats,
        }
    }
}
