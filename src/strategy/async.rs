//! Asynchronous batch processing strategy
//!
//! This module provides a multi-threaded implementation of the ProcessingStrategy
//! trait. Operations are read in batches and each batch is split into account
//! groups that run in parallel.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (account-group partitioning + blocking workers)
//!         └── LedgerEngine (per-account locks, DashMap-backed storage)
//! ```
//!
//! # Ordering
//!
//! - Batches run one after another, so an account's operations keep file order
//!   across batch boundaries
//! - Within a batch, groups that share no account run concurrently
//! - Within a group, operations run in file order
//!
//! The final balances therefore match the sync strategy for any input.

use crate::core::BatchProcessor;
use crate::io::async_reader::AsyncReader;
use crate::strategy::{
    build_ledger, record_outcome, write_results, LedgerInputs, ProcessingStrategy, RunSummary,
};
use std::io::Write;
use tracing::warn;

/// Configuration for batch processing
///
/// Controls how operations are batched and the number of worker threads.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of operations per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, replacing zero values with the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size, default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                "Invalid max_concurrent_batches ({}), using default ({})",
                max_concurrent_batches, default.max_concurrent_batches
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    /// Create a new AsyncProcessingStrategy with the specified configuration
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Run the operations file batch by batch
    ///
    /// 1. Builds the ledger and a BatchProcessor around it
    /// 2. Creates a tokio multi-threaded runtime
    /// 3. Reads a batch with AsyncReader and waits for it to finish
    ///    before reading the next
    /// 4. Writes final balances once the input is exhausted
    fn process(&self, inputs: &LedgerInputs, output: &mut dyn Write) -> Result<RunSummary, String> {
        let ledger = build_ledger(inputs)?;
        let processor = BatchProcessor::new(ledger.engine.clone());

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .max_blocking_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let summary = runtime.block_on(async {
            let file = tokio::fs::File::open(&inputs.operations)
                .await
                .map_err(|e| {
                    format!(
                        "Failed to open file '{}': {}",
                        inputs.operations.display(),
                        e
                    )
                })?;

            // Wrap tokio file in a compatibility layer for csv-async
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);
            let mut summary = RunSummary::default();

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for result in processor.process_batch(batch).await {
                    record_outcome(&mut summary, None, &result.request, &result.outcome);
                }
            }

            summary.malformed = reader.malformed();
            Ok::<_, String>(summary)
        })?;

        write_results(&ledger, inputs, output)?;
        Ok(summary)
    }
}
