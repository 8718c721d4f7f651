//! # Administrative Surface
//!
//! Owner-gated mutations of the tax configuration and registries.
//!
//! | Operation | Authority | Event |
//! |-----------|-----------|-------|
//! | `set_buy_tax` / `set_sell_tax` | owner | `BuyTaxUpdated` / `SellTaxUpdated` |
//! | `set_excluded` / `set_excluded_batch` | owner | `ExclusionUpdated` per address |
//! | `add_pair` | owner | `PairAdded` |
//! | `set_treasury` | owner or current treasury | `TreasuryUpdated` |
//! | `set_swap_threshold` | owner | `SwapThresholdUpdated` |
//! | `manual_swap` | owner | `ProceedsConverted` |
//! | `transfer_ownership` | owner | `OwnershipTransferred` |
//!
//! Each operation is atomic; a rejected call changes nothing.

use crate::domain::entities::ConversionReceipt;
use crate::domain::value_objects::{Address, TaxRate, U256};
use crate::errors::TokenError;
use crate::events::{AdminCommand, TokenEvent};
use crate::ports::outbound::{ExchangeRouter, ReferenceLedger, TokenLedger};
use crate::token::TaxedToken;
use tracing::{debug, info};

impl<L, R, X> TaxedToken<L, R, X>
where
    L: TokenLedger,
    R: ReferenceLedger,
    X: ExchangeRouter,
{
    /// Sets the buy tax.
    ///
    /// # Errors
    ///
    /// `NotOwner`, or `TaxRateTooHigh` above 10%.
    pub fn set_buy_tax(&mut self, caller: Address, percent: u8) -> Result<(), TokenError> {
        self.atomically("set_buy_tax", |state, _| {
            state.require_owner(caller)?;
            let new = TaxRate::new(percent)?;
            let old = std::mem::replace(&mut state.taxes.buy_tax, new);
            state.emit(TokenEvent::BuyTaxUpdated { old, new });
            info!(%old, %new, "buy tax updated");
            Ok(())
        })
    }

    /// Sets the sell tax.
    ///
    /// # Errors
    ///
    /// `NotOwner`, or `TaxRateTooHigh` above 10%.
    pub fn set_sell_tax(&mut self, caller: Address, percent: u8) -> Result<(), TokenError> {
        self.atomically("set_sell_tax", |state, _| {
            state.require_owner(caller)?;
            let new = TaxRate::new(percent)?;
            let old = std::mem::replace(&mut state.taxes.sell_tax, new);
            state.emit(TokenEvent::SellTaxUpdated { old, new });
            info!(%old, %new, "sell tax updated");
            Ok(())
        })
    }

    /// Sets the exclusion status of one address.
    ///
    /// # Errors
    ///
    /// `NotOwner`.
    pub fn set_excluded(
        &mut self,
        caller: Address,
        account: Address,
        excluded: bool,
    ) -> Result<(), TokenError> {
        self.set_excluded_batch(caller, &[account], excluded)
    }

    /// Sets the exclusion status of every address in `accounts`.
    ///
    /// # Errors
    ///
    /// `NotOwner`, or `EmptyAddressList` when `accounts` is empty.
    pub fn set_excluded_batch(
        &mut self,
        caller: Address,
        accounts: &[Address],
        excluded: bool,
    ) -> Result<(), TokenError> {
        self.atomically("set_excluded", |state, _| {
            state.require_owner(caller)?;
            if accounts.is_empty() {
                return Err(TokenError::EmptyAddressList);
            }
            for &account in accounts {
                let previous = state.exclusions.set(account, excluded);
                state.emit(TokenEvent::ExclusionUpdated { account, excluded });
                debug!(account = ?account, previous, excluded, "exclusion set");
            }
            info!(count = accounts.len(), excluded, "exclusions updated");
            Ok(())
        })
    }

    /// Registers an additional pool. Pools cannot be removed.
    ///
    /// # Errors
    ///
    /// `NotOwner`, or `ZeroAddress`.
    pub fn add_pair(&mut self, caller: Address, pair: Address) -> Result<(), TokenError> {
        self.atomically("add_pair", |state, _| {
            state.require_owner(caller)?;
            if pair.is_zero() {
                return Err(TokenError::ZeroAddress);
            }
            if state.pairs.register(pair) {
                state.emit(TokenEvent::PairAdded { pair });
                info!(pair = ?pair, "pair added");
            } else {
                debug!(pair = ?pair, "pair already registered");
            }
            Ok(())
        })
    }

    /// Changes the treasury wallet. Allowed for the owner and for the
    /// current treasury.
    ///
    /// # Errors
    ///
    /// `TreasuryChangeUnauthorized`, or `ZeroAddress`.
    pub fn set_treasury(&mut self, caller: Address, treasury: Address) -> Result<(), TokenError> {
        self.atomically("set_treasury", |state, _| {
            if caller != state.owner && caller != state.treasury {
                return Err(TokenError::TreasuryChangeUnauthorized { caller });
            }
            if treasury.is_zero() {
                return Err(TokenError::ZeroAddress);
            }
            let old = std::mem::replace(&mut state.treasury, treasury);
            state.emit(TokenEvent::TreasuryUpdated { old, new: treasury });
            info!(old = ?old, new = ?treasury, "treasury updated");
            Ok(())
        })
    }

    /// Sets the conversion threshold in smallest units. Any value is accepted.
    ///
    /// # Errors
    ///
    /// `NotOwner`.
    pub fn set_swap_threshold(
        &mut self,
        caller: Address,
        threshold: U256,
    ) -> Result<(), TokenError> {
        self.atomically("set_swap_threshold", |state, _| {
            state.require_owner(caller)?;
            let old = std::mem::replace(&mut state.taxes.swap_threshold, threshold);
            state.emit(TokenEvent::SwapThresholdUpdated {
                old,
                new: threshold,
            });
            info!(%old, new = %threshold, "swap threshold updated");
            Ok(())
        })
    }

    /// Converts the whole contract balance now, ignoring the threshold.
    ///
    /// # Errors
    ///
    /// `NotOwner`, `ConversionInProgress`, or any exchange / payout failure.
    pub fn manual_swap(&mut self, caller: Address) -> Result<ConversionReceipt, TokenError> {
        self.atomically("manual_swap", |state, exchange| {
            state.require_owner(caller)?;
            state.run_conversion(exchange)
        })
    }

    /// Hands ownership to `new_owner`.
    ///
    /// # Errors
    ///
    /// `NotOwner`, or `ZeroAddress`.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), TokenError> {
        self.atomically("transfer_ownership", |state, _| {
            state.require_owner(caller)?;
            if new_owner.is_zero() {
                return Err(TokenError::ZeroAddress);
            }
            let old = std::mem::replace(&mut state.owner, new_owner);
            state.emit(TokenEvent::OwnershipTransferred {
                old,
                new: new_owner,
            });
            info!(old = ?old, new = ?new_owner, "ownership transferred");
            Ok(())
        })
    }

    /// Dispatches an [`AdminCommand`] and returns the events it emitted.
    ///
    /// # Errors
    ///
    /// Whatever the dispatched operation returns.
    pub fn execute(
        &mut self,
        caller: Address,
        command: AdminCommand,
    ) -> Result<Vec<TokenEvent>, TokenError> {
        let mark = self.state.events.len();
        match command {
            AdminCommand::SetBuyTax { percent } => self.set_buy_tax(caller, percent)?,
            AdminCommand::SetSellTax { percent } => self.set_sell_tax(caller, percent)?,
            AdminCommand::SetExcluded { account, excluded } => {
                self.set_excluded(caller, account, excluded)?;
            }
            AdminCommand::SetExcludedBatch { accounts, excluded } => {
                self.set_excluded_batch(caller, &accounts, excluded)?;
            }
            AdminCommand::AddPair { pair } => self.add_pair(caller, pair)?,
            AdminCommand::SetTreasury { treasury } => self.set_treasury(caller, treasury)?,
            AdminCommand::SetSwapThreshold { threshold } => {
                self.set_swap_threshold(caller, threshold)?;
            }
            AdminCommand::ManualSwap => {
                self.manual_swap(caller)?;
            }
            AdminCommand::TransferOwnership { new_owner } => {
                self.transfer_ownership(caller, new_owner)?;
            }
        }
        Ok(self.state.events[mark..].to_vec())
    }
}

// =============================================================================
// TESTS
// =============================================================================
