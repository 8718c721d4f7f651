//! # Domain Invariants
//!
//! Invariants that MUST hold around every transfer:
//! - INVARIANT-1: Fee Conservation (`fee + net == amount`)
//! - INVARIANT-2: Exempt Parties Pay Nothing
//! - INVARIANT-3: Rate Cap (both rates `<= 10%`)
//! - INVARIANT-4: Guard Released (idle between operations)

use crate::domain::entities::{FeeSplit, TaxConfiguration};
use crate::domain::guard::ConversionGuard;
use crate::domain::value_objects::{TaxRate, U256};

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// INVARIANT-1: Fee Conservation
///
/// No value is created or destroyed by the split.
#[must_use]
pub fn check_fee_conservation(split: &FeeSplit, amount: U256) -> bool {
    split
        .fee
        .checked_add(split.net)
        .is_some_and(|total| total == amount)
}

/// INVARIANT-2: Exempt Parties Pay Nothing
#[must_use]
pub fn check_exemption(split: &FeeSplit) -> bool {
    !split.exempt || split.fee.is_zero()
}

/// INVARIANT-3: Rate Cap
#[must_use]
pub fn check_rate_cap(config: &TaxConfiguration) -> bool {
    config.buy_tax.percent() <= TaxRate::MAX_PERCENT
        && config.sell_tax.percent() <= TaxRate::MAX_PERCENT
}

/// INVARIANT-4: Guard Released
///
/// Outside a conversion the guard is idle.
#[must_use]
pub fn check_guard_released(guard: &ConversionGuard) -> bool {
    guard.is_idle()
}

/// Check the per-transfer invariants at once.
#[must_use]
pub fn check_transfer_invariants(
    split: &FeeSplit,
    amount: U256,
    config: &TaxConfiguration,
) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if !check_fee_conservation(split, amount) {
        violations.push(InvariantViolation::FeeNotConserved {
            amount,
            fee: split.fee,
            net: split.net,
        });
    }

    if !check_exemption(split) {
        violations.push(InvariantViolation::ExemptPartyTaxed { fee: split.fee });
    }

    if !check_rate_cap(config) {
        violations.push(InvariantViolation::RateAboveCap {
            buy: config.buy_tax.percent(),
            sell: config.sell_tax.percent(),
        });
    }

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// `fee + net != amount`.
    FeeNotConserved { amount: U256, fee: U256, net: U256 },
    /// An exempt transfer carried a fee.
    ExemptPartyTaxed { fee: U256 },
    /// A rate exceeded the cap.
    RateAboveCap { buy: u8, sell: u8 },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FeeNotConserved { amount, fee, net } => {
                write!(f, "fee not conserved: {fee} + {net} != {amount}")
            }
            Self::ExemptPartyTaxed { fee } => {
                write!(f, "exempt transfer taxed: fee {fee}")
            }
            Self::RateAboveCap { buy, sell } => {
                write!(f, "rate above cap: buy {buy}%, sell {sell}%")
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
