//! # Tax Ledger - Taxed Fungible Token
//!
//! A fungible-token ledger with an embedded transaction-tax engine. Transfers
//! into a registered liquidity pool pay the sell tax, transfers out of one pay
//! the buy tax. Collected fees accumulate on the token's own balance and are
//! periodically sold for a reference currency, which is forwarded to a
//! treasury wallet.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | `fee + net == amount` for every transfer | `domain/invariants.rs` - `check_fee_conservation()` |
//! | Excluded parties are never taxed | `domain/tax.rs` - `TaxEngine::split()` |
//! | Rates never exceed 10% | `domain/value_objects.rs` - `TaxRate::new()` |
//! | At most one conversion at a time | `domain/guard.rs` - `ConversionGuard::enter()` |
//! | Guard idle after every operation | `pipeline.rs` - `TokenState::run_conversion()` |
//! | Failed operations change nothing | `token.rs` - `TaxedToken::atomically()` |
//!
//! ## Transfer Flow
//!
//! ```text
//! transfer(from, to, amount)
//!   1. classify: from is a pool → Buy, to is a pool → Sell, else Plain
//!   2. not a buy, nobody excluded, contract balance >= threshold, guard idle?
//!        → sell the contract balance, forward proceeds to the treasury
//!   3. fee = amount * rate / 100 (zero if either party is excluded)
//!   4. debit from, credit fee to the contract and the rest to `to`
//! ```
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose | In-memory adapter |
//! |-------|---------|-------------------|
//! | `TokenLedger` | Balances, supply, allowances | `InMemoryLedger` |
//! | `ReferenceLedger` | Reference-currency balances | `InMemoryReferenceLedger` |
//! | `ExchangeRouter` | Sell tokens for reference currency | `ConstantPriceRouter` |
//! | `PairFactory` | Create the primary pool at deployment | `DeterministicPairFactory` |
//!
//! ## Usage Example
//!
//! ```ignore
//! use tax_ledger::prelude::*;
//!
//! let token = TaxedToken::deploy(deployment, &TokenConfig::from_env(), ledger,
//!     reference, router, &mut factory, BlockContext::new(1, now))?;
//! let service = TaxedTokenService::new(token, ServiceConfig::from_env());
//!
//! let receipt = service.transfer(alice, pool, amount).await?;
//! println!("fee: {}", receipt.split.fee);
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod admin;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod pipeline;
pub mod ports;
pub mod service;
pub mod telemetry;
pub mod token;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{
        BlockContext, ConversionReceipt, FeeSplit, TaxConfiguration, TokenMetadata,
        TransferReceipt,
    };

    // Value objects
    pub use crate::domain::value_objects::{Address, TaxRate, TransferKind, U256};

    // Domain services
    pub use crate::domain::conversion::{ConversionDecision, ConversionTrigger, SkipReason};
    pub use crate::domain::guard::{ConversionGuard, GuardState};
    pub use crate::domain::registry::{ExclusionRegistry, PairRegistry};
    pub use crate::domain::tax::TaxEngine;

    // Invariants
    pub use crate::domain::invariants::{
        check_transfer_invariants, InvariantCheckResult, InvariantViolation,
    };

    // Ports
    pub use crate::ports::inbound::{TaxedTokenApi, TokenHost};
    pub use crate::ports::outbound::{ExchangeRouter, PairFactory, ReferenceLedger, TokenLedger};

    // Events
    pub use crate::events::{
        topics, AdminCommand, AdminRequestPayload, AdminResponsePayload, TokenEvent,
        TransferRequestPayload, TransferResponsePayload,
    };

    // Errors
    pub use crate::errors::{
        ConfigError, ExchangeError, LedgerError, TelemetryError, TokenError, ValueTransferError,
    };

    // Adapters
    pub use crate::adapters::{
        ConstantPriceRouter, DeterministicPairFactory, InMemoryLedger, InMemoryReferenceLedger,
    };

    // Token and service
    pub use crate::config::{ServiceConfig, TokenConfig};
    pub use crate::service::{create_test_service, create_test_token, ServiceStats, TaxedTokenService};
    pub use crate::telemetry::{init_tracing, LogConfig};
    pub use crate::token::{Deployment, TaxedToken};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Largest buy or sell tax an administrator may set, in percent.
pub const MAX_TAX_PERCENT: u8 = domain::value_objects::TaxRate::MAX_PERCENT;
