//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the taxed ledger depends on. Adapters implement these to
//! provide:
//! - Token bookkeeping (balances, supply, allowances)
//! - Reference-currency bookkeeping
//! - The exchange service that converts tokens into reference currency
//! - The pool registry service used once at construction
//!
//! The token never hardcodes where these live; they are injected.

use crate::domain::value_objects::{Address, U256};
use crate::errors::{ExchangeError, LedgerError, ValueTransferError};
use crate::ports::inbound::TokenHost;

// =============================================================================
// TOKEN LEDGER
// =============================================================================

/// Conventional fungible-token bookkeeping.
///
/// The token calls `debit`/`credit` directly after consulting the tax engine;
/// the ledger itself knows nothing about taxes.
pub trait TokenLedger: Send + Sync {
    /// Balance of `account`.
    fn balance_of(&self, account: Address) -> U256;

    /// Total supply.
    fn total_supply(&self) -> U256;

    /// Adds `amount` to `account`.
    fn credit(&mut self, account: Address, amount: U256) -> Result<(), LedgerError>;

    /// Removes `amount` from `account`.
    fn debit(&mut self, account: Address, amount: U256) -> Result<(), LedgerError>;

    /// Creates new supply owned by `account`.
    fn mint(&mut self, account: Address, amount: U256) -> Result<(), LedgerError>;

    /// Amount `spender` may move on behalf of `owner`.
    fn allowance(&self, owner: Address, spender: Address) -> U256;

    /// Overwrites the allowance of `spender` over `owner`'s tokens.
    fn set_allowance(&mut self, owner: Address, spender: Address, amount: U256);

    /// Opens a checkpoint. Every entry changed after this is journaled.
    fn checkpoint(&mut self);

    /// Closes the latest checkpoint, keeping its changes.
    fn commit(&mut self);

    /// Closes the latest checkpoint, undoing its changes.
    fn revert(&mut self);
}

// =============================================================================
// REFERENCE LEDGER
// =============================================================================

/// Native reference-currency bookkeeping provided by the host platform.
pub trait ReferenceLedger: Send + Sync {
    /// Reference-currency balance of `account`.
    fn balance_of(&self, account: Address) -> U256;

    /// Moves value. The recipient may refuse it.
    fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ValueTransferError>;

    /// Opens a checkpoint. Every balance changed after this is journaled.
    fn checkpoint(&mut self);

    /// Closes the latest checkpoint, keeping its changes.
    fn commit(&mut self);

    /// Closes the latest checkpoint, undoing its changes.
    fn revert(&mut self);
}

// =============================================================================
// EXCHANGE ROUTER
// =============================================================================

/// External exchange service.
///
/// The router is handed the token itself as a [`TokenHost`] so it can pull
/// the approved tokens and pay out reference currency. Those calls re-enter
/// the token's transfer pipeline while the conversion guard is busy.
pub trait ExchangeRouter: Send + Sync {
    /// Address the token approves as spender.
    fn address(&self) -> Address;

    /// Address of the reference currency (last element of every path).
    fn reference_token(&self) -> Address;

    /// Sells exactly `amount_in` tokens along `path` and delivers the output
    /// to `to`. Returns the reference-currency amount delivered.
    ///
    /// # Arguments
    ///
    /// * `host` - The token, for `transfer_from` and value payouts
    /// * `amount_in` - Tokens to sell
    /// * `amount_out_min` - Minimum acceptable output (the token passes zero)
    /// * `path` - `[token, reference]`
    /// * `to` - Recipient of the output
    /// * `deadline` - Latest acceptable block timestamp
    fn swap_exact_tokens_for_reference(
        &self,
        host: &mut dyn TokenHost,
        amount_in: U256,
        amount_out_min: U256,
        path: &[Address],
        to: Address,
        deadline: u64,
    ) -> Result<U256, ExchangeError>;
}

// =============================================================================
// PAIR FACTORY
// =============================================================================

/// Pool registry service, consulted at construction only.
pub trait PairFactory: Send + Sync {
    /// Existing pool for the two assets, if any.
    fn get_pair(&self, token_a: Address, token_b: Address) -> Option<Address>;

    /// Creates the canonical pool for the two assets.
    fn create_pair(&mut self, token_a: Address, token_b: Address)
        -> Result<Address, ExchangeError>;

    /// Returns the existing pool or creates it.
    fn get_or_create_pair(
        &mut self,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address, ExchangeError> {
        match self.get_pair(token_a, token_b) {
            Some(pair) => Ok(pair),
            None => self.create_pair(token_a, token_b),
        }
    }
}
