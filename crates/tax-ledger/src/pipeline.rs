//! # Transfer Pipeline
//!
//! Token state plus the per-transfer orchestration:
//!
//! ```text
//! transfer(from, to, amount)
//!   ├─ classify + exemption          (TaxEngine)
//!   ├─ conversion trigger            (ConversionTrigger, guard)
//!   │    └─ run_conversion           guard Busy → exchange → treasury → guard Idle
//!   ├─ fee split                     (TaxEngine)
//!   └─ ledger debit / credit         (TokenLedger port)
//! ```
//!
//! The exchange re-enters through [`TokenHost`], always as the router itself.
//! Those nested transfers run while the guard is busy, so they never convert.

use crate::domain::conversion::{ConversionDecision, ConversionTrigger};
use crate::domain::entities::{
    BlockContext, ConversionReceipt, TaxConfiguration, TokenMetadata, TransferReceipt,
};
use crate::domain::guard::ConversionGuard;
use crate::domain::invariants::check_transfer_invariants;
use crate::domain::registry::{ExclusionRegistry, PairRegistry};
use crate::domain::tax::TaxEngine;
use crate::domain::value_objects::{Address, U256};
use crate::errors::TokenError;
use crate::events::TokenEvent;
use crate::ports::inbound::TokenHost;
use crate::ports::outbound::{ExchangeRouter, ReferenceLedger, TokenLedger};
use tracing::{debug, info, trace};

/// All mutable state of one taxed token.
///
/// A [`Checkpoint`] is taken before every top-level operation so a failure can
/// restore it whole.
pub struct TokenState<L, R> {
    pub(crate) address: Address,
    pub(crate) metadata: TokenMetadata,
    pub(crate) owner: Address,
    pub(crate) treasury: Address,
    pub(crate) router: Address,
    pub(crate) reference_token: Address,
    pub(crate) primary_pair: Address,
    pub(crate) ledger: L,
    pub(crate) reference: R,
    pub(crate) exclusions: ExclusionRegistry,
    pub(crate) pairs: PairRegistry,
    pub(crate) taxes: TaxConfiguration,
    pub(crate) guard: ConversionGuard,
    pub(crate) block: BlockContext,
    pub(crate) events: Vec<TokenEvent>,
}

/// Saved copy of the state outside the two ledgers.
///
/// The ledgers journal their own entries between `checkpoint` and
/// `commit`/`revert`; events are only ever appended, so their length suffices.
pub(crate) struct Checkpoint {
    owner: Address,
    treasury: Address,
    exclusions: ExclusionRegistry,
    pairs: PairRegistry,
    taxes: TaxConfiguration,
    guard: ConversionGuard,
    events: usize,
}

impl<L: TokenLedger, R: ReferenceLedger> TokenState<L, R> {
    pub(crate) fn checkpoint(&mut self) -> Checkpoint {
        self.ledger.checkpoint();
        self.reference.checkpoint();
        Checkpoint {
            owner: self.owner,
            treasury: self.treasury,
            exclusions: self.exclusions.clone(),
            pairs: self.pairs.clone(),
            taxes: self.taxes,
            guard: self.guard,
            events: self.events.len(),
        }
    }

    pub(crate) fn commit(&mut self) {
        self.ledger.commit();
        self.reference.commit();
    }

    pub(crate) fn revert(&mut self, checkpoint: Checkpoint) {
        self.ledger.revert();
        self.reference.revert();
        self.owner = checkpoint.owner;
        self.treasury = checkpoint.treasury;
        self.exclusions = checkpoint.exclusions;
        self.pairs = checkpoint.pairs;
        self.taxes = checkpoint.taxes;
        self.guard = checkpoint.guard;
        self.events.truncate(checkpoint.events);
    }

    pub(crate) fn emit(&mut self, event: TokenEvent) {
        trace!(event = event.name(), "event emitted");
        self.events.push(event);
    }

    pub(crate) fn tax_engine(&self) -> TaxEngine<'_> {
        TaxEngine::new(&self.exclusions, &self.pairs, &self.taxes)
    }

    pub(crate) fn require_owner(&self, caller: Address) -> Result<(), TokenError> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(TokenError::NotOwner { caller })
        }
    }

    /// Moves `amount` from `from` to `to` through the tax pipeline.
    ///
    /// `exchange` is `None` for transfers made by the exchange itself.
    pub(crate) fn process_transfer(
        &mut self,
        exchange: Option<&dyn ExchangeRouter>,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferReceipt, TokenError> {
        if from.is_zero() || to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        let engine = self.tax_engine();
        let trigger = ConversionTrigger {
            kind: engine.classify(&from, &to),
            exempt: engine.is_exempt(&from, &to),
            contract_balance: self.ledger.balance_of(self.address),
            threshold: self.taxes.swap_threshold,
        };

        let conversion = match (trigger.evaluate(&self.guard), exchange) {
            (ConversionDecision::Run, Some(exchange)) => Some(self.run_conversion(exchange)?),
            (ConversionDecision::Run, None) => {
                trace!("conversion due but no exchange handle, deferred");
                None
            }
            (ConversionDecision::Skip(reason), _) => {
                trace!(%reason, "conversion skipped");
                None
            }
        };

        let split = self.tax_engine().split(&from, &to, amount);
        debug_assert!(check_transfer_invariants(&split, amount, &self.taxes).is_valid());

        self.ledger.debit(from, amount)?;
        if !split.fee.is_zero() {
            self.ledger.credit(self.address, split.fee)?;
            self.emit(TokenEvent::Transfer {
                from,
                to: self.address,
                amount: split.fee,
            });
        }
        self.ledger.credit(to, split.net)?;
        self.emit(TokenEvent::Transfer {
            from,
            to,
            amount: split.net,
        });

        debug!(
            from = ?from,
            to = ?to,
            kind = %split.kind,
            amount = %amount,
            fee = %split.fee,
            "transfer committed"
        );

        Ok(TransferReceipt {
            from,
            to,
            split,
            conversion,
        })
    }

    /// Consumes `amount` of `spender`'s allowance over `owner`'s tokens.
    ///
    /// A `U256::MAX` allowance is never decremented.
    pub(crate) fn spend_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let available = self.ledger.allowance(owner, spender);
        if available == U256::MAX {
            return Ok(());
        }
        if available < amount {
            return Err(TokenError::InsufficientAllowance {
                owner,
                spender,
                required: amount,
                available,
            });
        }
        self.ledger.set_allowance(owner, spender, available - amount);
        Ok(())
    }

    pub(crate) fn approve(
        &mut self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        if owner.is_zero() || spender.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.ledger.set_allowance(owner, spender, amount);
        self.emit(TokenEvent::Approval {
            owner,
            spender,
            amount,
        });
        Ok(())
    }

    /// Runs one guarded conversion. Fails if one is already running.
    ///
    /// The guard returns to idle on every exit path.
    pub(crate) fn run_conversion(
        &mut self,
        exchange: &dyn ExchangeRouter,
    ) -> Result<ConversionReceipt, TokenError> {
        self.guard.enter()?;
        let result = self.convert_and_forward(exchange);
        self.guard.exit();
        result
    }

    fn convert_and_forward(
        &mut self,
        exchange: &dyn ExchangeRouter,
    ) -> Result<ConversionReceipt, TokenError> {
        let this = self.address;
        let treasury = self.treasury;
        let tokens_in = self.ledger.balance_of(this);

        if tokens_in.is_zero() {
            debug!("nothing to convert");
            return Ok(ConversionReceipt {
                treasury,
                ..ConversionReceipt::default()
            });
        }

        let router = self.router;
        self.approve(this, router, tokens_in)?;

        // No output floor; deadline is the current block.
        let path = [this, exchange.reference_token()];
        let deadline = self.block.timestamp;
        let reference_out = exchange.swap_exact_tokens_for_reference(
            self,
            tokens_in,
            U256::zero(),
            &path,
            this,
            deadline,
        )?;

        let forwarded = self.reference.balance_of(this);
        if !forwarded.is_zero() {
            self.reference.transfer(this, treasury, forwarded)?;
        }

        self.emit(TokenEvent::ProceedsConverted {
            tokens_in,
            reference_out,
            forwarded,
            treasury,
        });
        info!(
            tokens_in = %tokens_in,
            reference_out = %reference_out,
            forwarded = %forwarded,
            treasury = ?treasury,
            "proceeds converted"
        );

        Ok(ConversionReceipt {
            tokens_in,
            reference_out,
            forwarded,
            treasury,
        })
    }
}

impl<L: TokenLedger, R: ReferenceLedger> TokenHost for TokenState<L, R> {
    fn token_address(&self) -> Address {
        self.address
    }

    fn now(&self) -> u64 {
        self.block.timestamp
    }

    fn balance_of(&self, account: Address) -> U256 {
        self.ledger.balance_of(account)
    }

    fn transfer(&mut self, to: Address, amount: U256) -> Result<TransferReceipt, TokenError> {
        let router = self.router;
        self.process_transfer(None, router, to, amount)
    }

    fn transfer_from(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferReceipt, TokenError> {
        let router = self.router;
        self.spend_allowance(from, router, amount)?;
        self.process_transfer(None, from, to, amount)
    }

    fn reference_balance_of(&self, account: Address) -> U256 {
        self.reference.balance_of(account)
    }

    fn send_reference(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        if from != self.router && !self.pairs.contains(&from) {
            return Err(TokenError::PayerNotExchange { payer: from });
        }
        self.reference.transfer(from, to, amount)?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
