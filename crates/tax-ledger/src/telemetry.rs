//! Structured logging setup.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either a
//! pretty or a JSON formatting layer.

use crate::errors::TelemetryError;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive (trace, debug, info, warn, error, or full `EnvFilter` syntax)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl LogConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TAX_LEDGER_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `TAX_LEDGER_JSON_LOGS`: Enable JSON logs (default: false outside containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            log_level: env::var("TAX_LEDGER_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("TAX_LEDGER_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),
        }
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails if the filter directive is malformed or a global subscriber is
/// already set.
pub fn init_tracing(config: &LogConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::TracerInit(e.to_string()))?;

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::TracerInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::TracerInit(e.to_string()))?;
    }

    tracing::info!(
        level = %config.log_level,
        json = config.json_logs,
        "tracing initialized"
    );
    Ok(())
}
