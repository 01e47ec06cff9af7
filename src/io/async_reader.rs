//! Asynchronous CSV reader with batch interface
//!
//! Streams ledger requests from an operations file in fixed-size batches.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - futures streams to pull one record at a time
//! - Batch reading so the strategy can hand whole batches to the processor
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of LedgerRequests
//!                  ↓
//!           csv_format module
//!           (OperationCsvRecord, convert_operation_record)
//! ```
//!
//! Malformed rows are logged with their line number, counted, and skipped.

use crate::io::csv_format::{convert_operation_record, OperationCsvRecord};
use crate::types::LedgerRequest;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous operations reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: usize,
    malformed: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader from an async reader
    ///
    /// # Arguments
    ///
    /// * `reader` - Async reader providing CSV data, header row first
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 1,
            malformed: 0,
        }
    }

    /// Read a batch of ledger requests
    ///
    /// Reads rows until `batch_size` requests have been collected or the input
    /// ends. Rows that fail to parse do not count towards `batch_size`.
    ///
    /// # Returns
    ///
    /// The converted requests in file order. An empty vector means the end of
    /// the input was reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<LedgerRequest> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<OperationCsvRecord>();

        while batch.len() < batch_size {
            let Some(result) = records.next().await else {
                break;
            };
            self.line_num += 1;

            match result {
                Ok(record) => match convert_operation_record(record) {
                    Ok(request) => batch.push(request),
                    Err(e) => {
                        self.malformed += 1;
                        warn!(line = self.line_num, error = %e, "skipping malformed operation");
                    }
                },
                Err(e) => {
                    self.malformed += 1;
                    warn!(line = self.line_num, error = %e, "CSV parse error");
                }
            }
        }

        batch
    }

    /// Number of rows skipped so far
    pub fn malformed(&self) -> usize {
        self.malformed
    }
}
