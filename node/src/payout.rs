//! Outbound payout book.
//!
//! Stands in for the host's value-transfer facility: records how much each
//! recipient has been paid and refuses recipients that have been blocked.

use dashmap::{DashMap, DashSet};
use tracing::{info, warn};

use strongbox_common::{AccountId, Amount, TransferError};
use strongbox_ledger::TransferExecutor;

/// Transfer executor that books payouts per recipient.
#[derive(Debug, Default)]
pub struct PayoutBook {
    delivered: DashMap<AccountId, Amount>,
    blocked: DashSet<AccountId>,
}

impl PayoutBook {
    /// Create an empty payout book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse future payouts to `recipient`.
    pub fn block(&self, recipient: AccountId) {
        warn!(recipient = %recipient, "Recipient blocked");
        self.blocked.insert(recipient);
    }

    /// Accept payouts to `recipient` again.
    pub fn unblock(&self, recipient: &AccountId) {
        self.blocked.remove(recipient);
    }

    /// Total paid out to `recipient`.
    pub fn delivered_to(&self, recipient: &AccountId) -> Amount {
        self.delivered
            .get(recipient)
            .map(|a| *a)
            .unwrap_or(Amount::ZERO)
    }

    /// Total paid out to everyone.
    pub fn total_delivered(&self) -> Amount {
        self.delivered.iter().map(|entry| *entry.value()).sum()
    }
}

impl TransferExecutor for PayoutBook {
    fn transfer(&self, recipient: &AccountId, amount: Amount) -> Result<(), TransferError> {
        if self.blocked.contains(recipient) {
            return Err(TransferError::Rejected(format!(
                "recipient {recipient} does not accept payouts"
            )));
        }

        let mut entry = self.delivered.entry(recipient.clone()).or_default();
        let total = entry
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("payout total overflow".to_string()))?;
        *entry = total;

        info!(recipient = %recipient, amount = %amount, "Payout delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payouts_accumulate() {
        let book = PayoutBook::new();
        let alice = AccountId::new("alice");

        book.transfer(&alice, Amount::new(30)).unwrap();
        book.transfer(&alice, Amount::new(20)).unwrap();
        book.transfer(&AccountId::new("bob"), Amount::new(5)).unwrap();

        assert_eq!(book.delivered_to(&alice), Amount::new(50));
        assert_eq!(book.total_delivered(), Amount::new(55));
    }

    #[test]
    fn test_blocked_recipient_receives_nothing() {
        let book = PayoutBook::new();
        let alice = AccountId::new("alice");

        book.block(alice.clone());
        assert!(matches!(
            book.transfer(&alice, Amount::new(10)),
            Err(TransferError::Rejected(_))
        ));
        assert_eq!(book.delivered_to(&alice), Amount::ZERO);

        book.unblock(&alice);
        assert!(book.transfer(&alice, Amount::new(10)).is_ok());
    }
}
