//! Account balance tracking.

use std::collections::HashMap;

use strongbox_common::{AccountId, Amount};

/// Per-account balances. An account with no entry holds zero.
#[derive(Debug, Clone, Default)]
pub struct BalanceBook {
    balances: HashMap<AccountId, Amount>,
}

impl BalanceBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance of an account.
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(Amount::ZERO)
    }

    /// Balance after crediting `amount`, without applying it.
    pub fn credited(&self, account: &AccountId, amount: Amount) -> Option<Amount> {
        self.balance_of(account).checked_add(amount)
    }

    /// Balance after debiting `amount`, without applying it.
    pub fn debited(&self, account: &AccountId, amount: Amount) -> Option<Amount> {
        self.balance_of(account).checked_sub(amount)
    }

    /// Overwrite an account's balance with a value computed by
    /// [`credited`](Self::credited) or [`debited`](Self::debited).
    pub fn set(&mut self, account: &AccountId, balance: Amount) {
        match self.balances.get_mut(account) {
            Some(entry) => *entry = balance,
            None => {
                self.balances.insert(account.clone(), balance);
            }
        }
    }

    /// Sum of all balances.
    pub fn total(&self) -> Amount {
        self.balances.values().copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_operations() {
        let alice = AccountId::new("alice");
        let bob = AccountId::new("bob");
        let mut book = BalanceBook::new();

        assert_eq!(book.balance_of(&alice), Amount::ZERO);

        let credited = book.credited(&alice, Amount::new(500)).unwrap();
        book.set(&alice, credited);
        book.set(&bob, Amount::new(250));

        assert_eq!(book.balance_of(&alice), Amount::new(500));
        assert_eq!(book.total(), Amount::new(750));
        assert_eq!(book.debited(&alice, Amount::new(500)), Some(Amount::ZERO));
        assert_eq!(book.debited(&bob, Amount::new(251)), None);
    }

    #[test]
    fn test_credit_overflow_is_detected() {
        let alice = AccountId::new("alice");
        let mut book = BalanceBook::new();

        book.set(&alice, Amount::MAX);

        assert_eq!(book.credited(&alice, Amount::new(1)), None);
        assert_eq!(book.credited(&alice, Amount::ZERO), Some(Amount::MAX));
    }
}
