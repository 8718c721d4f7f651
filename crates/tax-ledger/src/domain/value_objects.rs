//! # Value Objects
//!
//! Immutable domain primitives for the taxed ledger.
//! These types represent concepts that are defined by their value, not identity.

use crate::errors::TokenError;
use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export U256 from primitive-types for token amounts
pub use primitive_types::U256;

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte account or contract address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address (0x0000...0000).
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address whose bytes are all `byte`. Handy for fixtures.
    #[must_use]
    pub const fn repeat(byte: u8) -> Self {
        Self([byte; 20])
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == 20 {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(slice);
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...")?;
        for byte in &self.0[18..] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; 20] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

// =============================================================================
// TAX RATE (0..=10 percent)
// =============================================================================

/// A transfer tax rate in whole percent.
///
/// ## Invariants
/// - `0 <= rate <= TaxRate::MAX_PERCENT` at all times
/// - Construction above the cap fails with `TokenError::TaxRateTooHigh`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TaxRate(u8);

impl TaxRate {
    /// Highest rate an administrator may configure.
    pub const MAX_PERCENT: u8 = 10;

    /// No tax.
    pub const ZERO: Self = Self(0);

    /// Creates a rate, rejecting anything above [`Self::MAX_PERCENT`].
    pub fn new(percent: u8) -> Result<Self, TokenError> {
        if percent > Self::MAX_PERCENT {
            return Err(TokenError::TaxRateTooHigh {
                rate: percent,
                max: Self::MAX_PERCENT,
            });
        }
        Ok(Self(percent))
    }

    /// Returns the rate in whole percent.
    #[must_use]
    pub const fn percent(&self) -> u8 {
        self.0
    }

    /// Returns true if this rate collects nothing.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Applies the rate to `amount`, truncating toward zero.
    ///
    /// Equal to `amount * rate / 100` but split as `q * rate + r * rate / 100`
    /// (with `amount = 100q + r`) so that no intermediate overflows `U256`.
    #[must_use]
    pub fn apply(&self, amount: U256) -> U256 {
        let hundred = U256::from(100u8);
        let rate = U256::from(self.0);
        let quotient = amount / hundred;
        let remainder = amount % hundred;
        quotient * rate + remainder * rate / hundred
    }
}

impl TryFrom<u8> for TaxRate {
    type Error = TokenError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaxRate> for u8 {
    fn from(rate: TaxRate) -> Self {
        rate.0
    }
}

impl fmt::Debug for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaxRate({}%)", self.0)
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// =============================================================================
// TRANSFER KIND
// =============================================================================

/// Classification of a transfer by its counterparties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferKind {
    /// Source is a registered pool: tokens leave the pool.
    Buy,
    /// Destination is a registered pool: tokens enter the pool.
    Sell,
    /// Neither side is a pool.
    Plain,
}

impl TransferKind {
    /// Returns true for buys, the one kind that never triggers a conversion.
    #[must_use]
    pub const fn is_buy(&self) -> bool {
        matches!(self, Self::Buy)
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
            Self::Plain => write!(f, "transfer"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
