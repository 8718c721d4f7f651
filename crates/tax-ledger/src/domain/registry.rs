//! # Address Registries
//!
//! The two address sets consulted on every transfer: tax-exempt accounts and
//! recognized liquidity pools.

use crate::domain::value_objects::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// =============================================================================
// EXCLUSION REGISTRY
// =============================================================================

/// Addresses exempt from transfer taxation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRegistry {
    excluded: HashSet<Address>,
}

impl ExclusionRegistry {
    /// Creates a registry with the given addresses excluded.
    pub fn with_excluded(addresses: impl IntoIterator<Item = Address>) -> Self {
        Self {
            excluded: addresses.into_iter().collect(),
        }
    }

    /// Returns true if `address` is exempt.
    #[must_use]
    pub fn contains(&self, address: &Address) -> bool {
        self.excluded.contains(address)
    }

    /// Returns true if either party is exempt.
    #[must_use]
    pub fn either(&self, a: &Address, b: &Address) -> bool {
        self.contains(a) || self.contains(b)
    }

    /// Sets the exclusion status of `address`. Returns the previous status.
    pub fn set(&mut self, address: Address, excluded: bool) -> bool {
        if excluded {
            !self.excluded.insert(address)
        } else {
            self.excluded.remove(&address)
        }
    }

    /// Number of excluded addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.excluded.len()
    }

    /// Returns true if nothing is excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }
}

// =============================================================================
// PAIR REGISTRY
// =============================================================================

/// Addresses recognized as liquidity-pool contracts. Append-only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRegistry {
    pairs: HashSet<Address>,
}

impl PairRegistry {
    /// Creates a registry holding the initial pool.
    #[must_use]
    pub fn with_primary(pair: Address) -> Self {
        let mut pairs = HashSet::new();
        pairs.insert(pair);
        Self { pairs }
    }

    /// Returns true if `address` is a registered pool.
    #[must_use]
    pub fn contains(&self, address: &Address) -> bool {
        self.pairs.contains(address)
    }

    /// Registers a pool. Returns false if it was already registered.
    pub fn register(&mut self, pair: Address) -> bool {
        self.pairs.insert(pair)
    }

    /// Number of registered pools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if no pool is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
