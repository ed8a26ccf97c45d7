//! Core vault ledger implementation.

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use strongbox_common::{
    AccountId, Amount, CallOutcome, ConfigError, DepositError, Interaction, TransferError,
    VaultError, VaultStats, WithdrawError,
};

use crate::balance::BalanceBook;
use crate::guard::{DiagnosticPolicy, Route, UnrecognizedCallGuard};
use crate::journal::{EventKind, Journal, LedgerEvent};
use crate::params::{LedgerParams, ParameterValidator};
use crate::transfer::TransferExecutor;

/// Mutable accounting state.
#[derive(Debug, Clone, Default)]
struct LedgerState {
    balances: BalanceBook,
    total_deposited: Amount,
    deposit_count: u64,
    withdrawal_count: u64,
    journal: Journal,
}

/// Point-in-time view of the exposed ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VaultSnapshot {
    pub withdrawal_limit: Amount,
    pub bank_cap: Amount,
    pub total_deposited: Amount,
    pub deposit_count: u64,
    pub withdrawal_count: u64,
}

/// Broken ledger invariant found by [`VaultLedger::verify_integrity`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("total deposited {recorded} does not match sum of balances {computed}")]
    TotalMismatch { recorded: Amount, computed: Amount },

    #[error("total deposited {total} exceeds bank cap {bank_cap}")]
    CapExceeded { total: Amount, bank_cap: Amount },
}

/// The vault ledger.
///
/// All state sits behind one reentrant lock. Each operation holds it from its
/// first check through the external transfer and any rollback, so operations
/// from different threads are serialized, while a transfer executor calling
/// back into the ledger on the same thread re-enters and sees the committed
/// debit. A failed or panicking transfer restores the state captured before
/// the debit, discarding anything nested calls committed in between.
pub struct VaultLedger {
    params: LedgerParams,
    guard: UnrecognizedCallGuard,
    executor: Arc<dyn TransferExecutor>,
    state: ReentrantMutex<RefCell<LedgerState>>,
}

impl VaultLedger {
    /// Create a ledger from validated parameters.
    pub fn new(params: LedgerParams, executor: Arc<dyn TransferExecutor>) -> Self {
        Self::with_policy(params, executor, DiagnosticPolicy::default())
    }

    /// Create a ledger with an explicit diagnostic policy for rejected calls.
    pub fn with_policy(
        params: LedgerParams,
        executor: Arc<dyn TransferExecutor>,
        policy: DiagnosticPolicy,
    ) -> Self {
        info!(
            withdrawal_limit = %params.withdrawal_limit(),
            bank_cap = %params.bank_cap(),
            policy = ?policy,
            "Vault ledger created"
        );

        Self {
            params,
            guard: UnrecognizedCallGuard::new(policy),
            executor,
            state: ReentrantMutex::new(RefCell::new(LedgerState::default())),
        }
    }

    /// Validate raw parameters with the strict validator and create a ledger.
    pub fn construct(
        withdrawal_limit: Amount,
        bank_cap: Amount,
        executor: Arc<dyn TransferExecutor>,
    ) -> Result<Self, ConfigError> {
        let params = ParameterValidator::strict().validate(withdrawal_limit, bank_cap)?;
        Ok(Self::new(params, executor))
    }

    /// Retain at most `capacity` journal events.
    pub fn with_journal_capacity(mut self, capacity: usize) -> Self {
        self.state.get_mut().get_mut().journal = Journal::with_capacity(capacity);
        self
    }

    /// Ledger parameters.
    pub fn params(&self) -> LedgerParams {
        self.params
    }

    /// Credit `amount` to `account`.
    #[instrument(skip_all, fields(account = %account, amount = %amount))]
    pub fn deposit(&self, account: &AccountId, amount: Amount) -> Result<(), DepositError> {
        let lock = self.state.lock();
        let mut state = lock.borrow_mut();

        let held = state.total_deposited;
        let limit_exceeded = || DepositError::LimitExceeded {
            attempted: amount,
            held,
            bank_cap: self.params.bank_cap(),
        };

        // Overflow in the sum is a cap violation as well.
        let new_total = held.checked_add(amount).ok_or_else(limit_exceeded)?;
        if new_total > self.params.bank_cap() {
            warn!(held = %held, bank_cap = %self.params.bank_cap(), "Deposit rejected: cap");
            return Err(limit_exceeded());
        }

        // Every balance is bounded by the total, so this follows from the cap check.
        let new_balance = state
            .balances
            .credited(account, amount)
            .ok_or_else(limit_exceeded)?;
        let new_count = state
            .deposit_count
            .checked_add(1)
            .ok_or(DepositError::CounterOverflow)?;

        state.balances.set(account, new_balance);
        state.total_deposited = new_total;
        state.deposit_count = new_count;
        state.journal.record(EventKind::Deposit {
            account: account.clone(),
            amount,
        });

        info!(balance = %new_balance, total = %new_total, "Deposit recorded");
        Ok(())
    }

    /// Debit `amount` from `account` and deliver it to the account holder.
    ///
    /// The debit is committed before the executor runs. If delivery fails or
    /// the executor panics, the ledger is restored to its state before the
    /// debit and `TransferFailed` is returned.
    #[instrument(skip_all, fields(account = %account, amount = %amount))]
    pub fn withdraw(&self, account: &AccountId, amount: Amount) -> Result<(), WithdrawError> {
        let lock = self.state.lock();

        let checkpoint = {
            let mut state = lock.borrow_mut();

            if amount > self.params.withdrawal_limit() {
                warn!(limit = %self.params.withdrawal_limit(), "Withdrawal rejected: limit");
                return Err(WithdrawError::LimitExceeded {
                    requested: amount,
                    limit: self.params.withdrawal_limit(),
                });
            }

            let available = state.balances.balance_of(account);
            let insufficient = || WithdrawError::InsufficientBalance {
                requested: amount,
                available,
            };

            let new_balance = state
                .balances
                .debited(account, amount)
                .ok_or_else(insufficient)?;
            // total >= balance, so this only fails if the books are already broken.
            let new_total = state
                .total_deposited
                .checked_sub(amount)
                .ok_or_else(insufficient)?;
            let new_count = state
                .withdrawal_count
                .checked_add(1)
                .ok_or(WithdrawError::CounterOverflow)?;

            let checkpoint = state.clone();

            state.balances.set(account, new_balance);
            state.total_deposited = new_total;
            state.withdrawal_count = new_count;

            debug!(balance = %new_balance, total = %new_total, "Debit committed");
            checkpoint
        };

        // The RefCell borrow is released here; the executor may re-enter.
        let delivery = panic::catch_unwind(AssertUnwindSafe(|| {
            self.executor.transfer(account, amount)
        }))
        .unwrap_or_else(|payload| {
            Err(TransferError::Panicked(panic_message(&*payload)))
        });

        let mut state = lock.borrow_mut();

        match delivery {
            Ok(()) => {
                state.journal.record(EventKind::Withdrawal {
                    account: account.clone(),
                    amount,
                });
                info!(
                    balance = %state.balances.balance_of(account),
                    total = %state.total_deposited,
                    "Withdrawal delivered"
                );
                Ok(())
            }
            Err(source) => {
                *state = checkpoint;

                warn!(
                    error = %source,
                    balance = %state.balances.balance_of(account),
                    "Transfer failed, ledger restored"
                );
                Err(WithdrawError::TransferFailed {
                    recipient: account.clone(),
                    amount,
                    source,
                })
            }
        }
    }

    /// Current balance of `account`.
    pub fn vault_balance(&self, account: &AccountId) -> Amount {
        let lock = self.state.lock();
        let state = lock.borrow();
        state.balances.balance_of(account)
    }

    /// Operation counters.
    pub fn stats(&self) -> VaultStats {
        let lock = self.state.lock();
        let state = lock.borrow();
        VaultStats {
            deposit_count: state.deposit_count,
            withdrawal_count: state.withdrawal_count,
        }
    }

    /// Sum of all balances.
    pub fn total_deposited(&self) -> Amount {
        let lock = self.state.lock();
        let state = lock.borrow();
        state.total_deposited
    }

    /// All exposed state in one read.
    pub fn snapshot(&self) -> VaultSnapshot {
        let lock = self.state.lock();
        let state = lock.borrow();
        VaultSnapshot {
            withdrawal_limit: self.params.withdrawal_limit(),
            bank_cap: self.params.bank_cap(),
            total_deposited: state.total_deposited,
            deposit_count: state.deposit_count,
            withdrawal_count: state.withdrawal_count,
        }
    }

    /// Copy of every journaled event.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events_since(0)
    }

    /// Copy of journaled events with `sequence >= from`.
    pub fn events_since(&self, from: u64) -> Vec<LedgerEvent> {
        let lock = self.state.lock();
        let state = lock.borrow();
        state.journal.since(from).cloned().collect()
    }

    /// Check the aggregate invariants against the balance book.
    pub fn verify_integrity(&self) -> Result<(), IntegrityError> {
        let lock = self.state.lock();
        let state = lock.borrow();

        let computed = state.balances.total();
        if computed != state.total_deposited {
            return Err(IntegrityError::TotalMismatch {
                recorded: state.total_deposited,
                computed,
            });
        }

        if state.total_deposited > self.params.bank_cap() {
            return Err(IntegrityError::CapExceeded {
                total: state.total_deposited,
                bank_cap: self.params.bank_cap(),
            });
        }

        Ok(())
    }

    /// Route an inbound interaction to the matching operation.
    #[instrument(skip(self, interaction), fields(caller = %interaction.caller, value = %interaction.value))]
    pub fn dispatch(&self, interaction: &Interaction) -> Result<CallOutcome, VaultError> {
        match self.guard.route(interaction) {
            Route::Deposit { account, amount } => {
                self.deposit(&account, amount)?;
                Ok(CallOutcome::Deposited { account, amount })
            }
            Route::Withdraw { account, amount } => {
                self.withdraw(&account, amount)?;
                Ok(CallOutcome::Withdrawn { account, amount })
            }
            Route::Balance { account } => {
                let balance = self.vault_balance(&account);
                Ok(CallOutcome::Balance { account, balance })
            }
            Route::Stats => Ok(CallOutcome::Stats(self.stats())),
            Route::Unrecognized => {
                if self.guard.emits_diagnostics() {
                    let lock = self.state.lock();
                    lock.borrow_mut().journal.record(EventKind::unexpected_call(
                        interaction.caller.clone(),
                        interaction.value,
                        &interaction.payload,
                    ));
                }
                warn!(payload_len = interaction.payload.len(), "Unrecognized call rejected");
                Err(VaultError::UnrecognizedCall {
                    caller: interaction.caller.clone(),
                    value: interaction.value,
                })
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|msg| msg.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

impl std::fmt::Debug for VaultLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultLedger")
            .field("params", &self.params)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}
