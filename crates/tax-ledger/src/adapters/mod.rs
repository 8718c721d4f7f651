//! # Adapters Layer (Outer Hexagon)
//!
//! In-memory and deterministic implementations of the driven ports.
//!
//! - [`InMemoryLedger`], [`InMemoryReferenceLedger`]: bookkeeping
//! - [`ConstantPriceRouter`]: fixed-price exchange paying out of the pool
//! - [`DeterministicPairFactory`]: CREATE2-style pool addresses
//!
//! A production deployment swaps these for host-platform adapters.

pub mod exchange;
pub mod ledger;

pub use exchange::*;
pub use ledger::*;
