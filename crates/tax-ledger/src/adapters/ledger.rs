//! # Ledger Adapters
//!
//! In-memory token and reference-currency bookkeeping for testing and
//! single-process hosting.
//!
//! Both ledgers journal the prior value of every entry they change while a
//! checkpoint is open, so reverting an operation costs time proportional to
//! what it touched rather than to the number of holders.

use crate::domain::value_objects::{Address, U256};
use crate::errors::{LedgerError, ValueTransferError};
use crate::ports::outbound::{ReferenceLedger, TokenLedger};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

// =============================================================================
// JOURNAL
// =============================================================================

/// Prior value of one token-ledger entry.
#[derive(Clone, Debug)]
enum LedgerChange {
    Balance {
        account: Address,
        previous: Option<U256>,
    },
    Allowance {
        key: (Address, Address),
        previous: Option<U256>,
    },
    Supply {
        previous: U256,
    },
}

fn restore<K: Hash + Eq, V>(map: &mut HashMap<K, V>, key: K, previous: Option<V>) {
    match previous {
        Some(value) => {
            map.insert(key, value);
        }
        None => {
            map.remove(&key);
        }
    }
}

// =============================================================================
// TOKEN LEDGER
// =============================================================================

/// In-memory token balances, supply and allowances.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedger {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    total_supply: U256,
    journal: Vec<LedgerChange>,
    checkpoints: Vec<usize>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts with a non-zero balance.
    #[must_use]
    pub fn holders(&self) -> usize {
        self.balances.values().filter(|b| !b.is_zero()).count()
    }

    /// Journaled changes not yet committed or reverted.
    #[must_use]
    pub fn pending_changes(&self) -> usize {
        self.journal.len()
    }

    fn record(&mut self, change: LedgerChange) {
        if !self.checkpoints.is_empty() {
            self.journal.push(change);
        }
    }

    fn write_balance(&mut self, account: Address, amount: U256) {
        let previous = self.balances.insert(account, amount);
        self.record(LedgerChange::Balance { account, previous });
    }
}

impl TokenLedger for InMemoryLedger {
    fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    fn total_supply(&self) -> U256 {
        self.total_supply
    }

    fn credit(&mut self, account: Address, amount: U256) -> Result<(), LedgerError> {
        let balance = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account })?;
        self.write_balance(account, balance);
        Ok(())
    }

    fn debit(&mut self, account: Address, amount: U256) -> Result<(), LedgerError> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account,
                required: amount,
                available,
            });
        }
        self.write_balance(account, available - amount);
        Ok(())
    }

    fn mint(&mut self, account: Address, amount: U256) -> Result<(), LedgerError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account })?;
        self.credit(account, amount)?;
        let previous = self.total_supply;
        self.record(LedgerChange::Supply { previous });
        self.total_supply = supply;
        Ok(())
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, amount: U256) {
        let key = (owner, spender);
        let previous = self.allowances.insert(key, amount);
        self.record(LedgerChange::Allowance { key, previous });
    }

    fn checkpoint(&mut self) {
        self.checkpoints.push(self.journal.len());
    }

    fn commit(&mut self) {
        self.checkpoints.pop();
        if self.checkpoints.is_empty() {
            self.journal.clear();
        }
    }

    fn revert(&mut self) {
        let Some(mark) = self.checkpoints.pop() else {
            return;
        };
        for change in self.journal.drain(mark..).rev() {
            match change {
                LedgerChange::Balance { account, previous } => {
                    restore(&mut self.balances, account, previous);
                }
                LedgerChange::Allowance { key, previous } => {
                    restore(&mut self.allowances, key, previous);
                }
                LedgerChange::Supply { previous } => self.total_supply = previous,
            }
        }
    }
}

// =============================================================================
// REFERENCE LEDGER
// =============================================================================

/// In-memory reference-currency balances.
///
/// Recipients marked with [`refuse`](Self::refuse) reject every payment,
/// standing in for a contract wallet without a receive hook.
#[derive(Clone, Debug, Default)]
pub struct InMemoryReferenceLedger {
    balances: HashMap<Address, U256>,
    refusing: HashSet<Address>,
    journal: Vec<(Address, Option<U256>)>,
    checkpoints: Vec<usize>,
}

impl InMemoryReferenceLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds funds out of thin air (genesis allocation, pool seeding).
    pub fn deposit(&mut self, account: Address, amount: U256) {
        let balance = self.balance_of(account).saturating_add(amount);
        self.write_balance(account, balance);
    }

    /// Makes `account` refuse incoming payments.
    pub fn refuse(&mut self, account: Address) {
        self.refusing.insert(account);
    }

    /// Makes `account` accept incoming payments again.
    pub fn accept(&mut self, account: Address) {
        self.refusing.remove(&account);
    }

    /// Journaled changes not yet committed or reverted.
    #[must_use]
    pub fn pending_changes(&self) -> usize {
        self.journal.len()
    }

    fn write_balance(&mut self, account: Address, amount: U256) {
        let previous = self.balances.insert(account, amount);
        if !self.checkpoints.is_empty() {
            self.journal.push((account, previous));
        }
    }
}

impl ReferenceLedger for InMemoryReferenceLedger {
    fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ValueTransferError> {
        if self.refusing.contains(&to) {
            return Err(ValueTransferError::Refused { to });
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(ValueTransferError::InsufficientBalance {
                account: from,
                required: amount,
                available,
            });
        }
        self.write_balance(from, available - amount);
        self.deposit(to, amount);
        Ok(())
    }

    fn checkpoint(&mut self) {
        self.checkpoints.push(self.journal.len());
    }

    fn commit(&mut self) {
        self.checkpoints.pop();
        if self.checkpoints.is_empty() {
            self.journal.clear();
        }
    }

    fn revert(&mut self) {
        let Some(mark) = self.checkpoints.pop() else {
            return;
        };
        for (account, previous) in self.journal.drain(mark..).rev() {
            restore(&mut self.balances, account, previous);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_updates_supply() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint(Address::repeat(1), U256::from(100)).unwrap();
        ledger.mint(Address::repeat(2), U256::from(50)).unwrap();

        assert_eq!(ledger.total_supply(), U256::from(150));
        assert_eq!(ledger.balance_of(Address::repeat(1)), U256::from(100));
        assert_eq!(ledger.holders(), 2);
    }

    #[test]
    fn test_debit_insufficient() {
        let mut ledger = InMemoryLedger::new();
        ledger.credit(Address::repeat(1), U256::from(10)).unwrap();

        let err = ledger.debit(Address::repeat(1), U256::from(11)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                account: Address::repeat(1),
                required: U256::from(11),
                available: U256::from(10),
            }
        );
        assert_eq!(ledger.balance_of(Address::repeat(1)), U256::from(10));
    }

    #[test]
    fn test_credit_overflow() {
        let mut ledger = InMemoryLedger::new();
        ledger.credit(Address::repeat(1), U256::MAX).unwrap();
        assert!(ledger.credit(Address::repeat(1), U256::one()).is_err());
    }

    #[test]
    fn test_revert_restores_touched_entries() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint(Address::repeat(1), U256::from(100)).unwrap();
        ledger.set_allowance(Address::repeat(1), Address::repeat(9), U256::from(5));
        assert_eq!(ledger.pending_changes(), 0);

        ledger.checkpoint();
        ledger.debit(Address::repeat(1), U256::from(30)).unwrap();
        ledger.credit(Address::repeat(2), U256::from(30)).unwrap();
        ledger.set_allowance(Address::repeat(1), Address::repeat(9), U256::zero());
        ledger.mint(Address::repeat(3), U256::from(7)).unwrap();
        assert_eq!(ledger.pending_changes(), 5);

        ledger.revert();
        assert_eq!(ledger.balance_of(Address::repeat(1)), U256::from(100));
        assert!(ledger.balance_of(Address::repeat(2)).is_zero());
        assert!(ledger.balance_of(Address::repeat(3)).is_zero());
        assert_eq!(
            ledger.allowance(Address::repeat(1), Address::repeat(9)),
            U256::from(5)
        );
        assert_eq!(ledger.total_supply(), U256::from(100));
        assert_eq!(ledger.holders(), 1);
        assert_eq!(ledger.pending_changes(), 0);
    }

    #[test]
    fn test_commit_keeps_changes_and_clears_journal() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint(Address::repeat(1), U256::from(100)).unwrap();

        ledger.checkpoint();
        ledger.debit(Address::repeat(1), U256::from(40)).unwrap();
        ledger.commit();

        assert_eq!(ledger.balance_of(Address::repeat(1)), U256::from(60));
        assert_eq!(ledger.pending_changes(), 0);

        // No open checkpoint: nothing to undo
        ledger.revert();
        assert_eq!(ledger.balance_of(Address::repeat(1)), U256::from(60));
    }

    #[test]
    fn test_nested_checkpoints() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint(Address::repeat(1), U256::from(100)).unwrap();

        ledger.checkpoint();
        ledger.debit(Address::repeat(1), U256::from(10)).unwrap();
        ledger.checkpoint();
        ledger.debit(Address::repeat(1), U256::from(20)).unwrap();
        ledger.revert();
        assert_eq!(ledger.balance_of(Address::repeat(1)), U256::from(90));

        ledger.checkpoint();
        ledger.debit(Address::repeat(1), U256::from(5)).unwrap();
        ledger.commit();
        assert_eq!(ledger.pending_changes(), 2);

        ledger.revert();
        assert_eq!(ledger.balance_of(Address::repeat(1)), U256::from(100));
    }

    #[test]
    fn test_reference_revert() {
        let mut reference = InMemoryReferenceLedger::new();
        reference.deposit(Address::repeat(1), U256::from(100));

        reference.checkpoint();
        reference
            .transfer(Address::repeat(1), Address::repeat(2), U256::from(60))
            .unwrap();
        assert_eq!(reference.pending_changes(), 2);
        reference.revert();

        assert_eq!(reference.balance_of(Address::repeat(1)), U256::from(100));
        assert!(reference.balance_of(Address::repeat(2)).is_zero());
        assert_eq!(reference.pending_changes(), 0);
    }

    #[test]
    fn test_reference_transfer_and_refusal() {
        let mut reference = InMemoryReferenceLedger::new();
        reference.deposit(Address::repeat(1), U256::from(100));

        reference
            .transfer(Address::repeat(1), Address::repeat(2), U256::from(40))
            .unwrap();
        assert_eq!(reference.balance_of(Address::repeat(2)), U256::from(40));

        reference.refuse(Address::repeat(3));
        let err = reference
            .transfer(Address::repeat(1), Address::repeat(3), U256::from(1))
            .unwrap_err();
        assert_eq!(err, ValueTransferError::Refused { to: Address::repeat(3) });
        assert_eq!(reference.balance_of(Address::repeat(1)), U256::from(60));

        reference.accept(Address::repeat(3));
        assert!(reference
            .transfer(Address::repeat(1), Address::repeat(3), U256::from(1))
            .is_ok());
    }
}
