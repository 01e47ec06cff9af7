use crate::config::{BatchSettings, ConfigError, LedgerConfig};
use crate::strategy::{BatchConfig, LedgerInputs};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Apply deposits, withdrawals and transfers to a set of accounts
#[derive(Parser, Debug)]
#[command(name = "bank-ledger")]
#[command(about = "Apply deposits, withdrawals and transfers to a set of accounts", long_about = None)]
pub struct CliArgs {
    /// Operations CSV file path
    #[arg(value_name = "OPERATIONS", help = "Path to the operations CSV file")]
    pub operations_file: PathBuf,

    /// Accounts CSV file path
    #[arg(
        long = "accounts",
        value_name = "FILE",
        help = "Path to the accounts CSV file (account,owner,currency,kind,credit_limit)"
    )]
    pub accounts_file: PathBuf,

    /// Processing strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for sequential or 'async' for batched parallel"
    )]
    pub strategy: StrategyType,

    /// Number of operations per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Optional TOML configuration file
    #[arg(long = "config", value_name = "FILE", help = "Path to a TOML configuration file")]
    pub config_file: Option<PathBuf>,

    /// Optional audit journal output
    #[arg(
        long = "journal",
        value_name = "FILE",
        help = "Write every audit record to this CSV file"
    )]
    pub journal_file: Option<PathBuf>,

    /// Lock wait limit
    #[arg(
        long = "lock-timeout-ms",
        value_name = "MILLIS",
        help = "Reject operations that wait longer than this for an account lock"
    )]
    pub lock_timeout_ms: Option<u64>,
}

/// Available processing strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments and file settings
    ///
    /// Flags win over `settings`, which win over the built-in defaults. Zero
    /// values fall back to the defaults with a warning.
    pub fn to_batch_config(&self, settings: &BatchSettings) -> BatchConfig {
        let batch_size = self.batch_size.or(settings.batch_size);
        let max_concurrent = self.max_concurrent_batches.or(settings.max_concurrent);

        if batch_size.is_none() && max_concurrent.is_none() {
            return BatchConfig::default();
        }

        let default = BatchConfig::default();
        BatchConfig::new(
            batch_size.unwrap_or(default.batch_size),
            max_concurrent.unwrap_or(default.max_concurrent_batches),
        )
    }

    /// Resolve the effective configuration
    ///
    /// Reads `--config` when given, applies environment overrides, then
    /// `--lock-timeout-ms`.
    pub fn load_config(&self) -> Result<LedgerConfig, ConfigError> {
        let mut config = match &self.config_file {
            Some(path) => LedgerConfig::load(path)?,
            None => LedgerConfig::default(),
        };
        config.merge_with_env()?;

        if let Some(millis) = self.lock_timeout_ms {
            config.lock_timeout_ms = Some(millis);
        }

        Ok(config)
    }

    /// Bundle file paths and configuration for a strategy run
    pub fn to_inputs(&self, config: LedgerConfig) -> LedgerInputs {
        LedgerInputs {
            accounts: self.accounts_file.clone(),
            operations: self.operations_file.clone(),
            journal: self.journal_file.clone(),
            config,
        }
    }
}
