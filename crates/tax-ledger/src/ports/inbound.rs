//! # Driving Ports (API - Inbound)
//!
//! Interfaces exposed by the taxed ledger:
//! - [`TokenHost`]: the surface the exchange calls back into mid-conversion
//! - [`TaxedTokenApi`]: the async API used by callers of the service

use crate::domain::entities::{TaxConfiguration, TransferReceipt};
use crate::domain::value_objects::{Address, U256};
use crate::errors::TokenError;
use crate::events::{AdminCommand, TokenEvent};
use async_trait::async_trait;

// =============================================================================
// TOKEN HOST (exchange callback surface)
// =============================================================================

/// What an exchange may do to the token while converting proceeds.
///
/// The exchange always acts as itself: transfers move the router's own tokens
/// and `transfer_from` spends the router's allowance. They run through the tax
/// pipeline like any other transfer, but never start a conversion of their own.
pub trait TokenHost {
    /// The token's own address.
    fn token_address(&self) -> Address;

    /// Current block timestamp.
    fn now(&self) -> u64;

    /// Token balance of `account`.
    fn balance_of(&self, account: Address) -> U256;

    /// Moves the router's own tokens to `to`.
    fn transfer(&mut self, to: Address, amount: U256) -> Result<TransferReceipt, TokenError>;

    /// Moves `from`'s tokens to `to` against the router's allowance.
    fn transfer_from(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferReceipt, TokenError>;

    /// Reference-currency balance of `account`.
    fn reference_balance_of(&self, account: Address) -> U256;

    /// Pays reference currency from `from` to `to`.
    ///
    /// `from` must be the router or a registered pool.
    fn send_reference(&mut self, from: Address, to: Address, amount: U256)
        -> Result<(), TokenError>;
}

// =============================================================================
// TAXED TOKEN API (Primary Driving Port)
// =============================================================================

/// Primary async API of the taxed ledger.
///
/// Every state-changing call is all-or-nothing.
#[async_trait]
pub trait TaxedTokenApi: Send + Sync {
    /// Moves `from`'s tokens to `to`, taxing and converting as configured.
    async fn transfer(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferReceipt, TokenError>;

    /// Moves `from`'s tokens on behalf of `spender`.
    async fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferReceipt, TokenError>;

    /// Sets `spender`'s allowance over `owner`'s tokens.
    async fn approve(
        &self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), TokenError>;

    /// Runs an administrative command as `caller`. Returns the emitted events.
    async fn execute_admin(
        &self,
        caller: Address,
        command: AdminCommand,
    ) -> Result<Vec<TokenEvent>, TokenError>;

    /// Token balance of `account`.
    async fn balance_of(&self, account: Address) -> U256;

    /// Current rates and threshold.
    async fn tax_configuration(&self) -> TaxConfiguration;
}
