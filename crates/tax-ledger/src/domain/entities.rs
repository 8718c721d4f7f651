//! # Core Domain Entities
//!
//! Main business entities for the taxed ledger: the tax configuration, the
//! per-transfer fee split and the receipts handed back to callers.

use crate::domain::value_objects::{Address, TaxRate, TransferKind, U256};
use serde::{Deserialize, Serialize};

// =============================================================================
// BLOCK CONTEXT
// =============================================================================

/// Block context supplied by the host platform.
///
/// The conversion step uses `timestamp` as the exchange deadline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    /// Block number.
    pub number: u64,
    /// Block timestamp (unix seconds).
    pub timestamp: u64,
}

impl BlockContext {
    /// Creates a block context.
    #[must_use]
    pub const fn new(number: u64, timestamp: u64) -> Self {
        Self { number, timestamp }
    }
}

// =============================================================================
// TOKEN METADATA
// =============================================================================

/// Descriptive token metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Human readable name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Number of decimals of the smallest unit.
    pub decimals: u8,
}

impl TokenMetadata {
    /// Returns `10^decimals`, the number of smallest units in one whole token.
    #[must_use]
    pub fn unit(&self) -> U256 {
        U256::exp10(usize::from(self.decimals))
    }
}

// =============================================================================
// TAX CONFIGURATION
// =============================================================================

/// Current tax rates and the conversion threshold.
///
/// ## Invariants
/// - Both rates are `TaxRate`s and therefore never exceed 10%
/// - Mutated only through the administrative surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxConfiguration {
    /// Rate applied when tokens leave a pool.
    pub buy_tax: TaxRate,
    /// Rate applied when tokens enter a pool.
    pub sell_tax: TaxRate,
    /// Contract token balance at which an automatic conversion is attempted.
    pub swap_threshold: U256,
}

impl TaxConfiguration {
    /// Creates a configuration.
    #[must_use]
    pub const fn new(buy_tax: TaxRate, sell_tax: TaxRate, swap_threshold: U256) -> Self {
        Self {
            buy_tax,
            sell_tax,
            swap_threshold,
        }
    }

    /// Returns the rate that applies to a transfer of the given kind.
    #[must_use]
    pub fn rate_for(&self, kind: TransferKind) -> TaxRate {
        match kind {
            TransferKind::Buy => self.buy_tax,
            TransferKind::Sell => self.sell_tax,
            TransferKind::Plain => TaxRate::ZERO,
        }
    }
}

// =============================================================================
// FEE SPLIT
// =============================================================================

/// How a single transfer amount is divided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    /// Classification of the transfer.
    pub kind: TransferKind,
    /// Whether an excluded party zeroed the fee.
    pub exempt: bool,
    /// Amount credited to the token contract.
    pub fee: U256,
    /// Amount credited to the destination.
    pub net: U256,
}

impl FeeSplit {
    /// A split that moves the whole amount untaxed.
    #[must_use]
    pub fn untaxed(kind: TransferKind, exempt: bool, amount: U256) -> Self {
        Self {
            kind,
            exempt,
            fee: U256::zero(),
            net: amount,
        }
    }

    /// Returns the amount the split was computed for.
    #[must_use]
    pub fn gross(&self) -> U256 {
        self.fee.saturating_add(self.net)
    }
}

// =============================================================================
// RECEIPTS
// =============================================================================

/// Outcome of one proceeds conversion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReceipt {
    /// Tokens sold to the exchange.
    pub tokens_in: U256,
    /// Reference currency the exchange reported as output.
    pub reference_out: U256,
    /// Reference currency forwarded to the treasury.
    pub forwarded: U256,
    /// Treasury that received the proceeds.
    pub treasury: Address,
}

/// Outcome of one transfer through the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Sender.
    pub from: Address,
    /// Recipient.
    pub to: Address,
    /// Fee split applied.
    pub split: FeeSplit,
    /// Conversion that ran before the fee was collected, if any.
    pub conversion: Option<ConversionReceipt>,
}

// =============================================================================
// TESTS
// =============================================================================
