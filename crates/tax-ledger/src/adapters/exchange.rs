//! # Exchange Adapters
//!
//! Deterministic stand-ins for the external exchange:
//!
//! - [`ConstantPriceRouter`] sells tokens into one pool at a fixed price
//! - [`DeterministicPairFactory`] derives pool addresses the CREATE2 way
//!
//! Pool address = keccak256(0xff ++ factory ++ keccak256(token0 ++ token1) ++ init_code_hash)\[12:\]

use crate::domain::value_objects::{Address, U256};
use crate::errors::ExchangeError;
use crate::ports::inbound::TokenHost;
use crate::ports::outbound::{ExchangeRouter, PairFactory};
use sha3::{Digest, Keccak256};
use std::collections::HashMap;
use tracing::debug;

// =============================================================================
// CONSTANT PRICE ROUTER
// =============================================================================

/// Router that prices every token at `numerator / denominator` units of
/// reference currency.
///
/// Tokens are pulled into `pool` with `transfer_from`; the output is paid from
/// the pool's reference balance. Fee-on-transfer is supported: the output is
/// priced on what the pool actually received.
#[derive(Clone, Debug)]
pub struct ConstantPriceRouter {
    address: Address,
    reference_token: Address,
    pool: Address,
    numerator: U256,
    denominator: U256,
}

impl ConstantPriceRouter {
    /// Creates a router. A zero `denominator` is treated as one.
    #[must_use]
    pub fn new(
        address: Address,
        reference_token: Address,
        pool: Address,
        numerator: U256,
        denominator: U256,
    ) -> Self {
        let denominator = if denominator.is_zero() {
            U256::one()
        } else {
            denominator
        };
        Self {
            address,
            reference_token,
            pool,
            numerator,
            denominator,
        }
    }

    /// The pool tokens are sold into.
    #[must_use]
    pub fn pool(&self) -> Address {
        self.pool
    }

    /// Reference output for `amount_in` tokens, `None` on overflow.
    #[must_use]
    pub fn quote(&self, amount_in: U256) -> Option<U256> {
        amount_in
            .checked_mul(self.numerator)
            .map(|scaled| scaled / self.denominator)
    }
}

impl ExchangeRouter for ConstantPriceRouter {
    fn address(&self) -> Address {
        self.address
    }

    fn reference_token(&self) -> Address {
        self.reference_token
    }

    fn swap_exact_tokens_for_reference(
        &self,
        host: &mut dyn TokenHost,
        amount_in: U256,
        amount_out_min: U256,
        path: &[Address],
        to: Address,
        deadline: u64,
    ) -> Result<U256, ExchangeError> {
        let token = host.token_address();
        if path != [token, self.reference_token] {
            return Err(ExchangeError::InvalidPath);
        }
        let now = host.now();
        if deadline < now {
            return Err(ExchangeError::Expired { deadline, now });
        }

        // The token being sold is also the one that holds the balance.
        let before = host.balance_of(self.pool);
        host.transfer_from(token, self.pool, amount_in)?;
        let received = host.balance_of(self.pool).saturating_sub(before);

        let available = host.reference_balance_of(self.pool);
        let amount_out = self
            .quote(received)
            .ok_or(ExchangeError::InsufficientLiquidity {
                required: U256::MAX,
                available,
            })?;
        if amount_out < amount_out_min {
            return Err(ExchangeError::InsufficientOutput {
                amount_out,
                amount_out_min,
            });
        }
        if amount_out > available {
            return Err(ExchangeError::InsufficientLiquidity {
                required: amount_out,
                available,
            });
        }

        host.send_reference(self.pool, to, amount_out)?;
        debug!(
            amount_in = %amount_in,
            received = %received,
            amount_out = %amount_out,
            "swap settled"
        );
        Ok(amount_out)
    }
}

// =============================================================================
// PAIR FACTORY
// =============================================================================

/// Pair factory with CREATE2-style addresses.
#[derive(Clone, Debug)]
pub struct DeterministicPairFactory {
    address: Address,
    init_code_hash: [u8; 32],
    pairs: HashMap<(Address, Address), Address>,
}

impl DeterministicPairFactory {
    /// Creates a factory deployed at `address`.
    #[must_use]
    pub fn new(address: Address, init_code_hash: [u8; 32]) -> Self {
        Self {
            address,
            init_code_hash,
            pairs: HashMap::new(),
        }
    }

    /// Number of pools created.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// The address the pool for `(token_a, token_b)` has or will have.
    #[must_use]
    pub fn pair_address(&self, token_a: Address, token_b: Address) -> Address {
        let (token0, token1) = sort_tokens(token_a, token_b);
        let mut salt_input = Vec::with_capacity(40);
        salt_input.extend_from_slice(token0.as_bytes());
        salt_input.extend_from_slice(token1.as_bytes());
        let salt = Keccak256::digest(&salt_input);

        let mut data = Vec::with_capacity(85);
        data.push(0xff);
        data.extend_from_slice(self.address.as_bytes());
        data.extend_from_slice(&salt);
        data.extend_from_slice(&self.init_code_hash);

        let hash = Keccak256::digest(&data);
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&hash[12..32]);
        Address::new(addr)
    }
}

impl PairFactory for DeterministicPairFactory {
    fn get_pair(&self, token_a: Address, token_b: Address) -> Option<Address> {
        self.pairs.get(&sort_tokens(token_a, token_b)).copied()
    }

    fn create_pair(
        &mut self,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address, ExchangeError> {
        if token_a == token_b || token_a.is_zero() || token_b.is_zero() {
            return Err(ExchangeError::InvalidPath);
        }
        if let Some(existing) = self.get_pair(token_a, token_b) {
            return Ok(existing);
        }
        let pair = self.pair_address(token_a, token_b);
        self.pairs.insert(sort_tokens(token_a, token_b), pair);
        debug!(pair = ?pair, "pair created");
        Ok(pair)
    }
}

fn sort_tokens(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_address_deterministic_and_order_independent() {
        let factory = DeterministicPairFactory::new(Address::repeat(0xF0), [7u8; 32]);
        let a = Address::repeat(1);
        let b = Address::repeat(2);

        assert_eq!(factory.pair_address(a, b), factory.pair_address(b, a));
        assert!(!factory.pair_address(a, b).is_zero());
        assert_ne!(
            factory.pair_address(a, b),
            factory.pair_address(a, Address::repeat(3))
        );
    }

    #[test]
    fn test_create_pair_registers_once() {
        let mut factory = DeterministicPairFactory::new(Address::repeat(0xF0), [7u8; 32]);
        let a = Address::repeat(1);
        let b = Address::repeat(2);

        assert!(factory.get_pair(a, b).is_none());
        let pair = factory.get_or_create_pair(a, b).unwrap();
        assert_eq!(factory.get_pair(b, a), Some(pair));
        assert_eq!(factory.create_pair(b, a).unwrap(), pair);
        assert_eq!(factory.pair_count(), 1);
    }

    #[test]
    fn test_create_pair_rejects_identical_tokens() {
        let mut factory = DeterministicPairFactory::new(Address::repeat(0xF0), [7u8; 32]);
        let a = Address::repeat(1);
        assert_eq!(factory.create_pair(a, a), Err(ExchangeError::InvalidPath));
    }

    #[test]
    fn test_quote() {
        let router = ConstantPriceRouter::new(
            Address::repeat(0xB0),
            Address::repeat(0xC0),
            Address::repeat(0xA0),
            U256::from(3),
            U256::from(2),
        );
        assert_eq!(router.quote(U256::from(10)), Some(U256::from(15)));
        assert_eq!(router.quote(U256::MAX), None);
    }
}
