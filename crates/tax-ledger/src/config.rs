//! # Configuration
//!
//! Deployment parameters of the token and tuning of the async service.
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `TAX_LEDGER_NAME` | `name` | `Taxed Token` |
//! | `TAX_LEDGER_SYMBOL` | `symbol` | `TAX` |
//! | `TAX_LEDGER_DECIMALS` | `decimals` | 18 |
//! | `TAX_LEDGER_TOTAL_SUPPLY` | `total_supply` (whole tokens) | 1,000,000,000 |
//! | `TAX_LEDGER_BUY_TAX` | `buy_tax_percent` | 2 |
//! | `TAX_LEDGER_SELL_TAX` | `sell_tax_percent` | 5 |
//! | `TAX_LEDGER_SWAP_THRESHOLD` | `swap_threshold` (whole tokens) | 2,500,000 |
//! | `TAX_LEDGER_EVENT_HISTORY` | `ServiceConfig::event_history_limit` | 10,000 |

use crate::domain::entities::{TaxConfiguration, TokenMetadata};
use crate::domain::value_objects::{TaxRate, U256};
use crate::errors::ConfigError;
use std::env;

/// Largest accepted `decimals`; keeps `10^decimals * supply` inside `U256`.
pub const MAX_DECIMALS: u8 = 36;

/// Token deployment parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    /// Token name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Decimals of the smallest unit.
    pub decimals: u8,
    /// Supply minted to the owner, in whole tokens.
    pub total_supply: u128,
    /// Initial buy tax (percent).
    pub buy_tax_percent: u8,
    /// Initial sell tax (percent).
    pub sell_tax_percent: u8,
    /// Initial conversion threshold, in whole tokens.
    pub swap_threshold: u128,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "Taxed Token".to_string(),
            symbol: "TAX".to_string(),
            decimals: 18,
            total_supply: 1_000_000_000,
            buy_tax_percent: 2,
            sell_tax_percent: 5,
            swap_threshold: 2_500_000,
        }
    }
}

impl TokenConfig {
    /// Create configuration from environment variables, falling back to the
    /// defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            name: env::var("TAX_LEDGER_NAME").unwrap_or(defaults.name),
            symbol: env::var("TAX_LEDGER_SYMBOL").unwrap_or(defaults.symbol),
            decimals: parse_var("TAX_LEDGER_DECIMALS").unwrap_or(defaults.decimals),
            total_supply: parse_var("TAX_LEDGER_TOTAL_SUPPLY").unwrap_or(defaults.total_supply),
            buy_tax_percent: parse_var("TAX_LEDGER_BUY_TAX").unwrap_or(defaults.buy_tax_percent),
            sell_tax_percent: parse_var("TAX_LEDGER_SELL_TAX")
                .unwrap_or(defaults.sell_tax_percent),
            swap_threshold: parse_var("TAX_LEDGER_SWAP_THRESHOLD")
                .unwrap_or(defaults.swap_threshold),
        }
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(invalid("name", "must not be empty"));
        }
        if self.symbol.trim().is_empty() {
            return Err(invalid("symbol", "must not be empty"));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(invalid(
                "decimals",
                format!("{} exceeds maximum of {}", self.decimals, MAX_DECIMALS),
            ));
        }
        if self.total_supply == 0 {
            return Err(invalid("total_supply", "must be positive"));
        }
        if self.buy_tax_percent > TaxRate::MAX_PERCENT {
            return Err(invalid(
                "buy_tax_percent",
                format!("{}% exceeds maximum of {}%", self.buy_tax_percent, TaxRate::MAX_PERCENT),
            ));
        }
        if self.sell_tax_percent > TaxRate::MAX_PERCENT {
            return Err(invalid(
                "sell_tax_percent",
                format!("{}% exceeds maximum of {}%", self.sell_tax_percent, TaxRate::MAX_PERCENT),
            ));
        }
        Ok(())
    }

    /// Metadata derived from this configuration.
    #[must_use]
    pub fn metadata(&self) -> TokenMetadata {
        TokenMetadata {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
        }
    }

    /// Total supply in smallest units.
    #[must_use]
    pub fn total_supply_units(&self) -> U256 {
        U256::from(self.total_supply) * self.metadata().unit()
    }

    /// Conversion threshold in smallest units.
    #[must_use]
    pub fn swap_threshold_units(&self) -> U256 {
        U256::from(self.swap_threshold) * self.metadata().unit()
    }

    /// Validates and builds the initial tax configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any field is invalid.
    pub fn tax_configuration(&self) -> Result<TaxConfiguration, ConfigError> {
        self.validate()?;
        let rate = |field: &'static str, percent: u8| {
            TaxRate::new(percent).map_err(|e| invalid(field, e.to_string()))
        };
        Ok(TaxConfiguration::new(
            rate("buy_tax_percent", self.buy_tax_percent)?,
            rate("sell_tax_percent", self.sell_tax_percent)?,
            self.swap_threshold_units(),
        ))
    }
}

/// Async service tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Committed events kept for [`crate::service::TaxedTokenService::recent_events`].
    pub event_history_limit: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            event_history_limit: 10_000,
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            event_history_limit: parse_var("TAX_LEDGER_EVENT_HISTORY")
                .unwrap_or(Self::default().event_history_limit),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TokenConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buy_tax_percent, 2);
        assert_eq!(config.sell_tax_percent, 5);
        assert_eq!(config.swap_threshold, 2_500_000);
    }

    #[test]
    fn test_units_scale_with_decimals() {
        let config = TokenConfig {
            decimals: 2,
            swap_threshold: 7,
            total_supply: 1_000,
            ..TokenConfig::default()
        };
        assert_eq!(config.swap_threshold_units(), U256::from(700));
        assert_eq!(config.total_supply_units(), U256::from(100_000));
    }

    #[test]
    fn test_rejects_high_tax() {
        let config = TokenConfig {
            sell_tax_percent: 11,
            ..TokenConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "sell_tax_percent",
                ..
            }
        ));
        assert!(config.tax_configuration().is_err());
    }

    #[test]
    fn test_rejects_empty_symbol_and_zero_supply() {
        let empty = TokenConfig {
            symbol: " ".to_string(),
            ..TokenConfig::default()
        };
        assert!(empty.validate().is_err());

        let zero = TokenConfig {
            total_supply: 0,
            ..TokenConfig::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_tax_configuration() {
        let taxes = TokenConfig::default().tax_configuration().unwrap();
        assert_eq!(taxes.buy_tax.percent(), 2);
        assert_eq!(taxes.sell_tax.percent(), 5);
        assert_eq!(
            taxes.swap_threshold,
            U256::from(2_500_000u64) * U256::exp10(18)
        );
    }

    #[test]
    fn test_service_config_default() {
        assert_eq!(ServiceConfig::default().event_history_limit, 10_000);
    }
}
