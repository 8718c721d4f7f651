//! # Domain Layer (Inner Hexagon)
//!
//! Pure business logic for the taxed ledger.
//! NO I/O, NO async, NO port calls.
//!
//! - Registries and configuration are plain data.
//! - `TaxEngine` and `ConversionTrigger` are pure functions of that data.
//! - Dependencies point INWARD only (pipeline and adapters depend on this).

pub mod conversion;
pub mod entities;
pub mod guard;
pub mod invariants;
pub mod registry;
pub mod tax;
pub mod value_objects;

pub use conversion::*;
pub use entities::*;
pub use guard::*;
pub use invariants::*;
pub use registry::*;
pub use tax::*;
pub use value_objects::*;
