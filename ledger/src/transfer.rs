//! Outbound value delivery.

use strongbox_common::{AccountId, Amount, TransferError};

/// Delivers withdrawn value to a recipient whose receipt logic is outside
/// the ledger's control.
///
/// Called by [`VaultLedger::withdraw`](crate::VaultLedger::withdraw) after
/// the debit is committed and with the ledger lock still held by the calling
/// thread. Implementations may call back into the same ledger from that
/// thread; calls from other threads block until the withdrawal finishes.
///
/// A delivery either moves the full amount and returns `Ok`, or moves
/// nothing and returns an error.
pub trait TransferExecutor: Send + Sync {
    /// Deliver `amount` to `recipient`.
    fn transfer(&self, recipient: &AccountId, amount: Amount) -> Result<(), TransferError>;
}

impl<F> TransferExecutor for F
where
    F: Fn(&AccountId, Amount) -> Result<(), TransferError> + Send + Sync,
{
    fn transfer(&self, recipient: &AccountId, amount: Amount) -> Result<(), TransferError> {
        self(recipient, amount)
    }
}

/// Executor that accepts every delivery without side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExecutor;

impl TransferExecutor for NoopExecutor {
    fn transfer(&self, _recipient: &AccountId, _amount: Amount) -> Result<(), TransferError> {
        Ok(())
    }
}
