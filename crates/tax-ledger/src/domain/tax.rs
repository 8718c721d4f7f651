//! # Tax Engine
//!
//! Pure fee computation. Reads the registries and the configuration, never
//! writes them, and never decides anything about conversions.

use crate::domain::entities::{FeeSplit, TaxConfiguration};
use crate::domain::registry::{ExclusionRegistry, PairRegistry};
use crate::domain::value_objects::{Address, TransferKind, U256};

/// Borrowed view of everything the fee computation depends on.
#[derive(Clone, Copy, Debug)]
pub struct TaxEngine<'a> {
    exclusions: &'a ExclusionRegistry,
    pairs: &'a PairRegistry,
    config: &'a TaxConfiguration,
}

impl<'a> TaxEngine<'a> {
    /// Creates an engine over the current registries and configuration.
    #[must_use]
    pub const fn new(
        exclusions: &'a ExclusionRegistry,
        pairs: &'a PairRegistry,
        config: &'a TaxConfiguration,
    ) -> Self {
        Self {
            exclusions,
            pairs,
            config,
        }
    }

    /// Classifies a transfer by its counterparties.
    ///
    /// A pool on the source side wins: pool-to-pool movements count as buys.
    #[must_use]
    pub fn classify(&self, from: &Address, to: &Address) -> TransferKind {
        if self.pairs.contains(from) {
            TransferKind::Buy
        } else if self.pairs.contains(to) {
            TransferKind::Sell
        } else {
            TransferKind::Plain
        }
    }

    /// Returns true if either counterparty is exempt.
    #[must_use]
    pub fn is_exempt(&self, from: &Address, to: &Address) -> bool {
        self.exclusions.either(from, to)
    }

    /// Splits `amount` into the fee kept by the contract and the net amount
    /// delivered to `to`.
    #[must_use]
    pub fn split(&self, from: &Address, to: &Address, amount: U256) -> FeeSplit {
        let kind = self.classify(from, to);
        if self.is_exempt(from, to) {
            return FeeSplit::untaxed(kind, true, amount);
        }

        let fee = self.config.rate_for(kind).apply(amount);
        FeeSplit {
            kind,
            exempt: false,
            fee,
            net: amount - fee,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
