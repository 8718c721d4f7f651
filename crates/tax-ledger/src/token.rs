//! # Taxed Token
//!
//! The single object owning all token state and the injected exchange.
//!
//! Every state-changing operation runs inside [`TaxedToken::atomically`]:
//! a checkpoint is taken first and restored if the operation fails, so a
//! reverted call leaves balances, registries, the guard and the event log as
//! they were. The ledgers journal only the entries an operation touches.

use crate::config::TokenConfig;
use crate::domain::entities::{
    BlockContext, TaxConfiguration, TokenMetadata, TransferReceipt,
};
use crate::domain::guard::{ConversionGuard, GuardState};
use crate::domain::invariants::check_guard_released;
use crate::domain::registry::{ExclusionRegistry, PairRegistry};
use crate::domain::value_objects::{Address, TaxRate, U256};
use crate::errors::TokenError;
use crate::events::TokenEvent;
use crate::pipeline::TokenState;
use crate::ports::outbound::{ExchangeRouter, PairFactory, ReferenceLedger, TokenLedger};
use tracing::{info, warn};

/// Addresses fixed at deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deployment {
    /// The token's own address.
    pub token: Address,
    /// Initial owner; receives the whole supply.
    pub owner: Address,
    /// Initial treasury wallet.
    pub treasury: Address,
}

/// A fungible token with buy/sell taxes and guarded proceeds conversion.
pub struct TaxedToken<L, R, X> {
    pub(crate) state: TokenState<L, R>,
    pub(crate) exchange: X,
}

impl<L, R, X> TaxedToken<L, R, X>
where
    L: TokenLedger,
    R: ReferenceLedger,
    X: ExchangeRouter,
{
    /// Deploys the token.
    ///
    /// Mints the supply to the owner, creates the primary pool through
    /// `factory`, and excludes the owner, the token and the treasury.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, zero addresses, or if the factory
    /// cannot create the pool.
    pub fn deploy<F>(
        deployment: Deployment,
        config: &TokenConfig,
        mut ledger: L,
        reference: R,
        exchange: X,
        factory: &mut F,
        block: BlockContext,
    ) -> Result<Self, TokenError>
    where
        F: PairFactory + ?Sized,
    {
        let Deployment {
            token,
            owner,
            treasury,
        } = deployment;
        if token.is_zero() || owner.is_zero() || treasury.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        let taxes = config.tax_configuration()?;
        let supply = config.total_supply_units();
        ledger.mint(owner, supply)?;

        let reference_token = exchange.reference_token();
        let primary_pair = factory.get_or_create_pair(token, reference_token)?;

        let mut state = TokenState {
            address: token,
            metadata: config.metadata(),
            owner,
            treasury,
            router: exchange.address(),
            reference_token,
            primary_pair,
            ledger,
            reference,
            exclusions: ExclusionRegistry::with_excluded([owner, token, treasury]),
            pairs: PairRegistry::with_primary(primary_pair),
            taxes,
            guard: ConversionGuard::new(),
            block,
            events: Vec::new(),
        };
        state.emit(TokenEvent::OwnershipTransferred {
            old: Address::ZERO,
            new: owner,
        });
        state.emit(TokenEvent::Transfer {
            from: Address::ZERO,
            to: owner,
            amount: supply,
        });

        info!(
            token = ?token,
            symbol = %config.symbol,
            pair = ?primary_pair,
            buy_tax = %taxes.buy_tax,
            sell_tax = %taxes.sell_tax,
            "token deployed"
        );

        Ok(Self { state, exchange })
    }

    /// Runs `op` against the state, restoring the prior state on failure.
    pub(crate) fn atomically<T>(
        &mut self,
        operation: &'static str,
        op: impl FnOnce(&mut TokenState<L, R>, &dyn ExchangeRouter) -> Result<T, TokenError>,
    ) -> Result<T, TokenError> {
        let checkpoint = self.state.checkpoint();
        match op(&mut self.state, &self.exchange) {
            Ok(value) => {
                self.state.commit();
                debug_assert!(check_guard_released(&self.state.guard));
                Ok(value)
            }
            Err(err) => {
                warn!(operation, error = %err, "operation reverted");
                self.state.revert(checkpoint);
                Err(err)
            }
        }
    }

    // =========================================================================
    // LEDGER SURFACE
    // =========================================================================

    /// Moves `caller`'s tokens to `to`.
    ///
    /// # Errors
    ///
    /// Fails on zero addresses, insufficient balance, or a failed conversion.
    pub fn transfer(
        &mut self,
        caller: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferReceipt, TokenError> {
        self.atomically("transfer", |state, exchange| {
            state.process_transfer(Some(exchange), caller, to, amount)
        })
    }

    /// Moves `from`'s tokens to `to` against `spender`'s allowance.
    ///
    /// # Errors
    ///
    /// As [`transfer`](Self::transfer), plus insufficient allowance.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferReceipt, TokenError> {
        self.atomically("transfer_from", |state, exchange| {
            state.spend_allowance(from, spender, amount)?;
            state.process_transfer(Some(exchange), from, to, amount)
        })
    }

    /// Sets `spender`'s allowance over `owner`'s tokens.
    ///
    /// # Errors
    ///
    /// Fails if either address is zero.
    pub fn approve(
        &mut self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        self.atomically("approve", |state, _| state.approve(owner, spender, amount))
    }

    /// Accepts reference currency sent to the token contract.
    ///
    /// # Errors
    ///
    /// Fails only if `from` cannot cover `amount`.
    pub fn receive_value(&mut self, from: Address, amount: U256) -> Result<(), TokenError> {
        self.atomically("receive_value", |state, _| {
            let this = state.address;
            state.reference.transfer(from, this, amount)?;
            state.emit(TokenEvent::ValueReceived { from, amount });
            Ok(())
        })
    }

    /// Advances the block context used for exchange deadlines.
    pub fn set_block_context(&mut self, block: BlockContext) {
        self.state.block = block;
    }

    /// Removes and returns the committed events.
    pub fn drain_events(&mut self) -> Vec<TokenEvent> {
        std::mem::take(&mut self.state.events)
    }

    // =========================================================================
    // VIEWS
    // =========================================================================

    /// The token's own address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.state.address
    }

    /// Name, symbol and decimals.
    #[must_use]
    pub fn metadata(&self) -> &TokenMetadata {
        &self.state.metadata
    }

    /// Token name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.state.metadata.name
    }

    /// Ticker symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.state.metadata.symbol
    }

    /// Display decimals.
    #[must_use]
    pub fn decimals(&self) -> u8 {
        self.state.metadata.decimals
    }

    /// Total supply, in smallest units.
    #[must_use]
    pub fn total_supply(&self) -> U256 {
        self.state.ledger.total_supply()
    }

    /// Token balance of `account`.
    #[must_use]
    pub fn balance_of(&self, account: Address) -> U256 {
        self.state.ledger.balance_of(account)
    }

    /// Amount `spender` may move on behalf of `owner`.
    #[must_use]
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.state.ledger.allowance(owner, spender)
    }

    /// Reference-currency balance of `account`.
    #[must_use]
    pub fn reference_balance_of(&self, account: Address) -> U256 {
        self.state.reference.balance_of(account)
    }

    /// Current owner.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.state.owner
    }

    /// Wallet receiving converted proceeds.
    #[must_use]
    pub fn treasury(&self) -> Address {
        self.state.treasury
    }

    /// Exchange router approved during conversions.
    #[must_use]
    pub fn router(&self) -> Address {
        self.state.router
    }

    /// Reference currency proceeds are converted into.
    #[must_use]
    pub fn reference_token(&self) -> Address {
        self.state.reference_token
    }

    /// Pool created at deployment.
    #[must_use]
    pub fn primary_pair(&self) -> Address {
        self.state.primary_pair
    }

    /// Returns true if transfers touching `account` are never taxed.
    #[must_use]
    pub fn is_excluded(&self, account: Address) -> bool {
        self.state.exclusions.contains(&account)
    }

    /// Returns true if `account` is a registered pool.
    #[must_use]
    pub fn is_pair(&self, account: Address) -> bool {
        self.state.pairs.contains(&account)
    }

    /// Current rates and threshold.
    #[must_use]
    pub fn tax_configuration(&self) -> TaxConfiguration {
        self.state.taxes
    }

    /// Rate applied to transfers out of a pool.
    #[must_use]
    pub fn buy_tax(&self) -> TaxRate {
        self.state.taxes.buy_tax
    }

    /// Rate applied to transfers into a pool.
    #[must_use]
    pub fn sell_tax(&self) -> TaxRate {
        self.state.taxes.sell_tax
    }

    /// Contract balance at which transfers trigger a conversion.
    #[must_use]
    pub fn swap_threshold(&self) -> U256 {
        self.state.taxes.swap_threshold
    }

    /// Whether a conversion is running.
    #[must_use]
    pub fn guard_state(&self) -> GuardState {
        self.state.guard.state()
    }

    /// Block context used for exchange deadlines.
    #[must_use]
    pub fn block_context(&self) -> BlockContext {
        self.state.block
    }

    /// Committed events not yet drained.
    #[must_use]
    pub fn events(&self) -> &[TokenEvent] {
        &self.state.events
    }

    /// The injected exchange.
    #[must_use]
    pub fn exchange(&self) -> &X {
        &self.exchange
    }
}

// =============================================================================
// TESTS
// =============================================================================
