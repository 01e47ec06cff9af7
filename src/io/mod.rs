//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, output serialization)
//! - `sync_reader` - Synchronous operations reader and accounts loader
//! - `async_reader` - Asynchronous operations reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_account_record, convert_operation_record, write_accounts_csv,
    write_transactions_csv, AccountCsvRecord, OperationCsvRecord,
};
pub use sync_reader::{load_accounts, SyncReader};
