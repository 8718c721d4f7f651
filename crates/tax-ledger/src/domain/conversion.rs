//! # Conversion Trigger
//!
//! Decides, once per transfer and before the fee is computed, whether the
//! accumulated proceeds must be converted first.
//!
//! The balance compared against the threshold is the contract balance *before*
//! the current transfer's fee lands, so the fee that crosses the threshold is
//! converted one transfer later.

use crate::domain::guard::ConversionGuard;
use crate::domain::value_objects::{TransferKind, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an automatic conversion did not run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Tokens are leaving a pool.
    Buy,
    /// Contract balance has not reached the threshold.
    BelowThreshold,
    /// A counterparty is tax exempt.
    ExemptParty,
    /// A conversion is already running.
    GuardBusy,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Buy => "buy",
            Self::BelowThreshold => "below threshold",
            Self::ExemptParty => "exempt party",
            Self::GuardBusy => "guard busy",
        };
        f.write_str(reason)
    }
}

/// Outcome of the trigger evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConversionDecision {
    /// Convert before processing the transfer.
    Run,
    /// Proceed without converting.
    Skip(SkipReason),
}

impl ConversionDecision {
    /// Returns true if the conversion must run.
    #[must_use]
    pub const fn should_run(&self) -> bool {
        matches!(self, Self::Run)
    }
}

/// Inputs of the trigger, captured before any balance moves.
#[derive(Clone, Copy, Debug)]
pub struct ConversionTrigger {
    /// Classification of the transfer being processed.
    pub kind: TransferKind,
    /// Whether either counterparty is exempt.
    pub exempt: bool,
    /// Token balance held by the contract itself.
    pub contract_balance: U256,
    /// Configured threshold.
    pub threshold: U256,
}

impl ConversionTrigger {
    /// Evaluates the trigger against the guard.
    ///
    /// All conditions must hold: not a buy, balance at or above threshold,
    /// nobody exempt, guard idle.
    #[must_use]
    pub fn evaluate(&self, guard: &ConversionGuard) -> ConversionDecision {
        if self.kind.is_buy() {
            ConversionDecision::Skip(SkipReason::Buy)
        } else if self.contract_balance < self.threshold {
            ConversionDecision::Skip(SkipReason::BelowThreshold)
        } else if self.exempt {
            ConversionDecision::Skip(SkipReason::ExemptParty)
        } else if !guard.is_idle() {
            ConversionDecision::Skip(SkipReason::GuardBusy)
        } else {
            ConversionDecision::Run
        }
    }
}
