//! # Conversion Guard
//!
//! Two-state non-reentrancy lock around the proceeds conversion.

use crate::errors::TokenError;
use serde::{Deserialize, Serialize};

/// Guard state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardState {
    /// No conversion in flight.
    #[default]
    Idle,
    /// A conversion is running.
    Busy,
}

/// Non-reentrant lock for the conversion step.
///
/// ## Invariants
/// - At most one conversion in flight
/// - `exit` is called on every path out of a conversion, success or failure
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConversionGuard {
    state: GuardState,
}

impl ConversionGuard {
    /// Creates an idle guard.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: GuardState::Idle,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> GuardState {
        self.state
    }

    /// Returns true if no conversion is running.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, GuardState::Idle)
    }

    /// Check-and-set: moves `Idle -> Busy`, fails if already busy.
    pub fn enter(&mut self) -> Result<(), TokenError> {
        match self.state {
            GuardState::Idle => {
                self.state = GuardState::Busy;
                Ok(())
            }
            GuardState::Busy => Err(TokenError::ConversionInProgress),
        }
    }

    /// Unconditionally returns to `Idle`.
    pub fn exit(&mut self) {
        self.state = GuardState::Idle;
    }
}
