//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account state and the balance floor rules
//! - `currency`: Three-letter currency codes
//! - `transaction`: Audit records and history filters
//! - `operation`: Deposit, withdrawal and transfer requests
//! - `outcome`: Statuses and receipts returned to callers
//! - `error`: Error types for the ledger

pub mod account;
pub mod currency;
pub mod error;
pub mod operation;
pub mod outcome;
pub mod transaction;

pub use account::{Account, AccountId, AccountKind, AccountStatus, OwnerId};
pub use currency::Currency;
pub use error::{ErrorKind, LedgerError, RepositoryError};
pub use operation::{LedgerRequest, Operation};
pub use outcome::{OperationStatus, Outcome, Receipt};
pub use transaction::{
    HistoryQuery, NewTransaction, Transaction, TransactionId, TransactionKind,
    DEFAULT_HISTORY_LIMIT,
};
