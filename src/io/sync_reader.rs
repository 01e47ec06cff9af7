//! Synchronous CSV readers
//!
//! Provides a streaming iterator over ledger requests from an operations file,
//! plus a strict loader for the accounts file. Format concerns live in the
//! csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding `Result<LedgerRequest, String>`
//! for each CSV row:
//!
//! ```no_run
//! use bank_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("operations.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(request) => println!("{:?}", request.operation),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Malformed rows are yielded as Err variants and iteration continues
//! - Error messages carry the 1-based file line, header included
//!
//! The accounts file is different: a single bad row fails the whole load,
//! since operations against a half-loaded account set are meaningless.

use crate::io::csv_format::{
    convert_account_record, convert_operation_record, AccountCsvRecord, OperationCsvRecord,
};
use crate::types::{Account, LedgerRequest};
use csv::{ReaderBuilder, Trim};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

fn open_csv(path: &Path) -> Result<csv::Reader<File>, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    Ok(ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .buffer_capacity(8 * 1024)
        .from_reader(file))
}

/// Synchronous reader over an operations file
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Open an operations file
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReader)` - Reader positioned after the header row
    /// * `Err(String)` - The file could not be opened
    pub fn new(path: &Path) -> Result<Self, String> {
        Ok(Self {
            reader: open_csv(path)?,
            line_num: 1,
        })
    }

    /// Line number of the row most recently yielded
    pub fn line_num(&self) -> usize {
        self.line_num
    }
}

impl Iterator for SyncReader {
    type Item = Result<LedgerRequest, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.reader.deserialize::<OperationCsvRecord>().next()?;
        self.line_num += 1;

        Some(match result {
            Ok(record) => convert_operation_record(record)
                .map_err(|e| format!("Line {}: {}", self.line_num, e)),
            Err(e) => Err(format!("Line {}: CSV parse error: {}", self.line_num, e)),
        })
    }
}

/// Load every account from an accounts file
///
/// # Returns
///
/// * `Ok(Vec<Account>)` - Accounts in file order, all with a zero balance
/// * `Err(String)` - Unreadable file, malformed row, or duplicate account id
pub fn load_accounts(path: &Path) -> Result<Vec<Account>, String> {
    let mut reader = open_csv(path)?;
    let mut seen = HashSet::new();
    let mut accounts = Vec::new();

    for (index, result) in reader.deserialize::<AccountCsvRecord>().enumerate() {
        let line = index + 2;
        let record = result.map_err(|e| format!("Line {}: CSV parse error: {}", line, e))?;
        let account = convert_account_record(record).map_err(|e| format!("Line {}: {}", line, e))?;

        if !seen.insert(account.id) {
            return Err(format!("Line {}: duplicate account {}", line, account.id));
        }
        accounts.push(account);
    }

    Ok(accounts)
}
