//! Ledger configuration
//!
//! Settings come from three layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file
//! 3. Environment variables (`LEDGER_LOCK_TIMEOUT_MS`, `LEDGER_LOG`)
//!
//! Command-line flags are applied on top by the CLI.
//!
//! # Example
//!
//! ```toml
//! currencies = ["USD", "EUR", "GBP", "JPY", "CHF"]
//! lock_timeout_ms = 500
//! log_filter = "bank_ledger=debug"
//!
//! [batch]
//! batch_size = 2000
//! max_concurrent = 4
//! ```

use crate::core::validation::StaticCurrencyRegistry;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding `lock_timeout_ms`
pub const LOCK_TIMEOUT_ENV: &str = "LEDGER_LOCK_TIMEOUT_MS";

/// Environment variable overriding `log_filter`
pub const LOG_FILTER_ENV: &str = "LEDGER_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse config file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Top-level ledger settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Accepted currency codes
    pub currencies: Vec<String>,

    /// Maximum wait for account locks; unset waits indefinitely
    pub lock_timeout_ms: Option<u64>,

    /// `tracing` filter directive used when `RUST_LOG` is not set
    pub log_filter: String,

    pub batch: BatchSettings,
}

/// Async strategy settings; unset values fall back to `BatchConfig` defaults
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub batch_size: Option<usize>,
    pub max_concurrent: Option<usize>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currencies: StaticCurrencyRegistry::default()
                .codes()
                .iter()
                .map(ToString::to_string)
                .collect(),
            lock_timeout_ms: None,
            log_filter: "info".to_string(),
            batch: BatchSettings::default(),
        }
    }
}

impl LedgerConfig {
    /// Load settings from a TOML file
    ///
    /// Keys missing from the file keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        self.merge_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn merge_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(LOCK_TIMEOUT_ENV) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: LOCK_TIMEOUT_ENV.to_string(),
                    message: format!("'{}': {}", raw, e),
                })?;
            self.lock_timeout_ms = Some(millis);
        }

        if let Some(filter) = lookup(LOG_FILTER_ENV) {
            if !filter.trim().is_empty() {
                self.log_filter = filter;
            }
        }

        Ok(())
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }

    /// Registry of the configured currencies
    pub fn currency_registry(&self) -> Result<StaticCurrencyRegistry, ConfigError> {
        if self.currencies.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "currencies".to_string(),
                message: "at least one currency is required".to_string(),
            });
        }

        StaticCurrencyRegistry::from_codes(&self.currencies).map_err(|e| {
            ConfigError::InvalidValue {
                key: "currencies".to_string(),
                message: e.to_string(),
            }
        })
    }
}
