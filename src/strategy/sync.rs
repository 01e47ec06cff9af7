//! Synchronous processing strategy
//!
//! This module provides a single-threaded implementation of the
//! ProcessingStrategy trait. Operations are dispatched one at a time, in file
//! order, on the calling thread.
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Authorization and execution to `dispatch` over a `LedgerEngine`
//! - CSV output to the shared `write_results`
//!
//! Only the account table and the journal are held in memory; operations are
//! streamed.

use crate::core::dispatch;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{
    build_ledger, record_outcome, write_results, LedgerInputs, ProcessingStrategy, RunSummary,
};
use std::io::Write;
use tracing::warn;

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use bank_ledger::config::LedgerConfig;
/// use bank_ledger::strategy::{LedgerInputs, ProcessingStrategy, SyncProcessingStrategy};
/// use std::io;
///
/// let inputs = LedgerInputs {
///     accounts: "accounts.csv".into(),
///     operations: "operations.csv".into(),
///     journal: None,
///     config: LedgerConfig::default(),
/// };
///
/// let summary = SyncProcessingStrategy
///     .process(&inputs, &mut io::stdout())
///     .expect("Processing failed");
/// println!("{} operations completed", summary.completed);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, inputs: &LedgerInputs, output: &mut dyn Write) -> Result<RunSummary, String> {
        let ledger = build_ledger(inputs)?;
        let mut reader = SyncReader::new(&inputs.operations)?;
        let mut summary = RunSummary::default();

        while let Some(result) = reader.next() {
            match result {
                Ok(request) => {
                    let outcome = dispatch(&ledger.engine, &request);
                    record_outcome(&mut summary, Some(reader.line_num()), &request, &outcome);
                }
                Err(e) => {
                    summary.malformed += 1;
                    warn!("Skipping row: {}", e);
                }
            }
        }

        write_results(&ledger, inputs, output)?;
        Ok(summary)
    }
}
