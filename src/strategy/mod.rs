//! Processing strategy module for ledger runs
//!
//! This module defines the Strategy pattern for complete processing pipelines:
//! loading accounts, reading operations, running them through the ledger engine
//! and writing the resulting balances. Different implementations (synchronous,
//! asynchronous batch) can be selected at runtime.
//!
//! Both strategies share the same setup and output code, defined here, so they
//! differ only in how operations are read and scheduled.

use crate::cli::StrategyType;
use crate::config::LedgerConfig;
use crate::core::{InMemoryAccountRepository, InMemoryTransactionRepository, LedgerEngine};
use crate::io::csv_format::{write_accounts_csv, write_transactions_csv};
use crate::io::sync_reader::load_accounts;
use crate::types::{LedgerRequest, OperationStatus, Outcome};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Everything a run needs besides the output writer
#[derive(Debug, Clone)]
pub struct LedgerInputs {
    /// Accounts file, loaded before any operation runs
    pub accounts: PathBuf,

    /// Operations file, processed in order
    pub operations: PathBuf,

    /// Where to write the audit journal, if anywhere
    pub journal: Option<PathBuf>,

    pub config: LedgerConfig,
}

/// Per-status counts for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub rejected: usize,
    pub rolled_back: usize,

    /// Rows that never reached the engine
    pub malformed: usize,
}

impl RunSummary {
    pub fn record(&mut self, status: OperationStatus) {
        match status {
            OperationStatus::Completed => self.completed += 1,
            OperationStatus::Rejected => self.rejected += 1,
            OperationStatus::RolledBack => self.rolled_back += 1,
        }
    }

    /// Rows read from the operations file
    pub fn total(&self) -> usize {
        self.completed + self.rejected + self.rolled_back + self.malformed
    }
}

/// Processing strategy trait for complete ledger pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Run every operation in `inputs` and write final balances to `output`
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` if the run finished, including runs where some
    ///   operations were rejected or rolled back
    /// * `Err(String)` if a fatal error occurred
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The accounts or operations file cannot be opened
    /// - The accounts file contains a malformed or duplicate row
    /// - The configured currency list is invalid
    /// - Output cannot be written
    ///
    /// Individual operation failures are logged and counted but never abort
    /// the run.
    fn process(&self, inputs: &LedgerInputs, output: &mut dyn Write) -> Result<RunSummary, String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `config` - Optional configuration for async batch processing (ignored for sync)
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config))
        }
    }
}

/// Engine plus handles on its in-memory storage
pub(crate) struct InMemoryLedger {
    pub engine: Arc<LedgerEngine>,
    pub journal: Arc<InMemoryTransactionRepository>,
}

/// Load accounts and build an engine configured from `inputs.config`
pub(crate) fn build_ledger(inputs: &LedgerInputs) -> Result<InMemoryLedger, String> {
    let registry = inputs
        .config
        .currency_registry()
        .map_err(|e| e.to_string())?;

    let accounts = InMemoryAccountRepository::new();
    for account in load_accounts(&inputs.accounts)? {
        accounts.open(account).map_err(|e| e.to_string())?;
    }
    debug!(accounts = accounts.len(), "accounts loaded");

    let journal = Arc::new(InMemoryTransactionRepository::new());
    let engine = LedgerEngine::new(Arc::new(accounts), journal.clone(), Arc::new(registry))
        .with_lock_timeout(inputs.config.lock_timeout());

    Ok(InMemoryLedger {
        engine: Arc::new(engine),
        journal,
    })
}

/// Count an outcome and log anything other than success
pub(crate) fn record_outcome(
    summary: &mut RunSummary,
    line: Option<usize>,
    request: &LedgerRequest,
    outcome: &Outcome,
) {
    summary.record(outcome.status);

    if outcome.is_completed() {
        debug!(
            line,
            operation = request.operation.name(),
            account = request.operation.source_account(),
            "{}",
            outcome.message
        );
    } else {
        warn!(
            line,
            operation = request.operation.name(),
            account = request.operation.source_account(),
            status = %outcome.status,
            "{}",
            outcome.message
        );
    }
}

/// Write balances to `output` and the journal to its file, if configured
pub(crate) fn write_results(
    ledger: &InMemoryLedger,
    inputs: &LedgerInputs,
    output: &mut dyn Write,
) -> Result<(), String> {
    let accounts = ledger.engine.accounts().map_err(|e| e.to_string())?;
    write_accounts_csv(&accounts, output)?;

    if let Some(path) = &inputs.journal {
        let file = File::create(path)
            .map_err(|e| format!("Failed to create journal '{}': {}", path.display(), e))?;
        let mut writer = BufWriter::new(file);
        write_transactions_csv(&ledger.journal.all(), &mut writer)?;
        writer
            .flush()
            .map_err(|e| format!("Failed to flush journal: {}", e))?;
    }

    Ok(())
}
