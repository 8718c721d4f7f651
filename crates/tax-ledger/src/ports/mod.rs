//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions for the taxed ledger.
//!
//! - **Driving Ports (Inbound)**: `TaxedTokenApi`, `TokenHost`
//! - **Driven Ports (Outbound)**: `TokenLedger`, `ReferenceLedger`,
//!   `ExchangeRouter`, `PairFactory`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
