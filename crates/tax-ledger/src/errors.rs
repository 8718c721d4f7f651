//! # Error Types
//!
//! All error types for the taxed ledger. Any of them aborts the enclosing
//! operation and rolls its state back.

use crate::domain::value_objects::{Address, U256};
use thiserror::Error;

// =============================================================================
// TOKEN ERRORS
// =============================================================================

/// Errors returned by token operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Proposed tax rate above the cap.
    #[error("tax rate {rate}% exceeds maximum of {max}%")]
    TaxRateTooHigh {
        /// Requested rate, in percent.
        rate: u8,
        /// Largest permitted rate, in percent.
        max: u8,
    },

    /// Batch operation called with no addresses.
    #[error("address list is empty")]
    EmptyAddressList,

    /// Caller is not the owner.
    #[error("caller {caller:?} is not the owner")]
    NotOwner {
        /// Rejected caller.
        caller: Address,
    },

    /// Treasury change by neither the treasury nor the owner.
    #[error("caller {caller:?} may not change the treasury wallet")]
    TreasuryChangeUnauthorized {
        /// Rejected caller.
        caller: Address,
    },

    /// Exchange tried to pay out of an account it does not control.
    #[error("exchange may not pay from {payer:?}")]
    PayerNotExchange {
        /// Rejected payer.
        payer: Address,
    },

    /// Conversion requested while another one is running.
    #[error("conversion already in progress")]
    ConversionInProgress,

    /// Zero address used as a counterparty.
    #[error("zero address not allowed")]
    ZeroAddress,

    /// Spender allowance too small.
    #[error("insufficient allowance: {spender:?} may spend {available} of {owner:?}, required {required}")]
    InsufficientAllowance {
        /// Holder whose tokens would move.
        owner: Address,
        /// Account spending the allowance.
        spender: Address,
        /// Amount requested.
        required: U256,
        /// Remaining allowance.
        available: U256,
    },

    /// Token ledger error.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Exchange service error.
    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    /// Reference-currency transfer error.
    #[error("value transfer error: {0}")]
    ValueTransfer(#[from] ValueTransferError),

    /// Deployment parameters rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl TokenError {
    /// Returns true if the error came from a collaborator outside the token.
    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self, Self::Exchange(_) | Self::ValueTransfer(_))
    }
}

// =============================================================================
// LEDGER ERRORS
// =============================================================================

/// Errors from the token ledger port.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Debit larger than the balance.
    #[error("insufficient balance for {account:?}: required {required}, available {available}")]
    InsufficientBalance {
        /// Account being debited.
        account: Address,
        /// Amount requested.
        required: U256,
        /// Current balance.
        available: U256,
    },

    /// Credit would overflow.
    #[error("balance overflow for {account:?}")]
    Overflow {
        /// Account being credited.
        account: Address,
    },
}

// =============================================================================
// EXCHANGE ERRORS
// =============================================================================

/// Errors from the exchange service port.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// Path does not start at the token or end at the reference currency.
    #[error("invalid swap path")]
    InvalidPath,

    /// Deadline already passed.
    #[error("swap expired: deadline {deadline} < now {now}")]
    Expired {
        /// Latest acceptable timestamp.
        deadline: u64,
        /// Current block timestamp.
        now: u64,
    },

    /// Output below the caller's minimum.
    #[error("insufficient output: {amount_out} < minimum {amount_out_min}")]
    InsufficientOutput {
        /// Output the swap would deliver.
        amount_out: U256,
        /// Minimum the caller accepts.
        amount_out_min: U256,
    },

    /// Pool cannot pay the output.
    #[error("insufficient liquidity: required {required}, available {available}")]
    InsufficientLiquidity {
        /// Output owed.
        required: U256,
        /// Reference currency held by the pool.
        available: U256,
    },

    /// The token rejected a call made by the exchange.
    #[error("token call failed: {0}")]
    Host(Box<TokenError>),
}

impl From<TokenError> for ExchangeError {
    fn from(err: TokenError) -> Self {
        Self::Host(Box::new(err))
    }
}

// =============================================================================
// VALUE TRANSFER ERRORS
// =============================================================================

/// Errors from reference-currency transfers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueTransferError {
    /// Recipient refused the value.
    #[error("recipient {to:?} refused the transfer")]
    Refused {
        /// Refusing recipient.
        to: Address,
    },

    /// Sender does not hold enough reference currency.
    #[error("insufficient reference balance for {account:?}: required {required}, available {available}")]
    InsufficientBalance {
        /// Paying account.
        account: Address,
        /// Amount requested.
        required: U256,
        /// Current reference balance.
        available: U256,
    },
}

// =============================================================================
// CONFIG ERRORS
// =============================================================================

/// Errors from configuration validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Field failed validation.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

// =============================================================================
// TELEMETRY ERRORS
// =============================================================================

/// Errors from tracing initialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    /// Filter or subscriber could not be installed.
    #[error("failed to initialize tracing: {0}")]
    TracerInit(String),
}

// =============================================================================
// TESTS
// =============================================================================
