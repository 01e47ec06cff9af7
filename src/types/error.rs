//! Error types for the bank ledger
//!
//! This module defines every error a ledger operation can end with, plus the
//! narrower error type the storage collaborators report.
//!
//! # Error Categories
//!
//! - **Validation Errors**: Invalid amount, unknown currency, same-account transfer
//! - **Account Errors**: Not found, closed, not empty, currency mismatch
//! - **Balance Errors**: Insufficient funds, arithmetic overflow
//! - **Access Errors**: Requester does not own the account
//! - **Infrastructure Errors**: Storage failures, lock timeouts, failed compensation
//!
//! Every variant maps to an [`OperationStatus`] through [`LedgerError::status`]:
//! storage failures report `RolledBack`, everything else is a plain `Rejected`.

use super::account::{AccountId, OwnerId};
use super::currency::Currency;
use super::outcome::OperationStatus;
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Failure reported by an account or transaction repository
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The backing store could not be reached
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The store refused the write
    #[error("write rejected: {0}")]
    WriteRejected(String),

    /// A write targeted an account the store does not hold
    #[error("account {0} is not stored")]
    UnknownAccount(AccountId),
}

/// Main error type for the ledger
///
/// Each variant carries enough context to explain the failure to a caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Amount is zero, negative, or has more than two decimal places
    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount { amount: Decimal, reason: String },

    /// Currency code is malformed or not in the registry
    #[error("Unknown currency '{code}'")]
    UnknownCurrency { code: String },

    /// Transfer source and destination are the same account
    #[error("Cannot transfer from account {account} to itself")]
    SameAccount { account: AccountId },

    #[error("Account {account} not found")]
    AccountNotFound { account: AccountId },

    /// Closed accounts accept no further balance changes
    #[error("Account {account} is closed")]
    AccountClosed { account: AccountId },

    /// Only zero-balance accounts can be closed
    #[error("Account {account} cannot be closed with balance {balance}")]
    AccountNotEmpty { account: AccountId, balance: Decimal },

    #[error("Currency mismatch on account {account}: account holds {expected}, operation uses {actual}")]
    CurrencyMismatch {
        account: AccountId,
        expected: Currency,
        actual: Currency,
    },

    /// The debit would take the balance below the account's floor
    #[error("Insufficient funds on account {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        operation: String,
        account: AccountId,
    },

    #[error("Requester {requester} does not own account {account}")]
    PermissionDenied {
        account: AccountId,
        requester: OwnerId,
    },

    /// An account lock could not be acquired before the deadline
    #[error("Timed out waiting for the lock on account {account}")]
    LockTimeout { account: AccountId },

    /// A repository call failed; any applied balance changes were reverted
    #[error("Persistence failure during {operation}: {source}")]
    PersistenceFailure {
        operation: String,
        #[source]
        source: RepositoryError,
    },

    /// Reverting applied balance changes failed too
    ///
    /// The affected accounts need reconciliation against the audit log.
    #[error("Compensation failed after '{cause}': {compensation}")]
    CompensationFailed {
        cause: Box<LedgerError>,
        compensation: RepositoryError,
    },

    /// Statement period does not name a real calendar month
    #[error("Invalid statement period {year}-{month:02}")]
    InvalidPeriod { year: i32, month: u32 },
}

/// Flat tag for each [`LedgerError`] variant
///
/// Front ends use this to map failures onto their own codes without matching on
/// the error's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidAmount,
    UnknownCurrency,
    SameAccount,
    AccountNotFound,
    AccountClosed,
    AccountNotEmpty,
    CurrencyMismatch,
    InsufficientFunds,
    ArithmeticOverflow,
    PermissionDenied,
    LockTimeout,
    PersistenceFailure,
    InvalidPeriod,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidAmount => "invalid_amount",
            ErrorKind::UnknownCurrency => "unknown_currency",
            ErrorKind::SameAccount => "same_account",
            ErrorKind::AccountNotFound => "account_not_found",
            ErrorKind::AccountClosed => "account_closed",
            ErrorKind::AccountNotEmpty => "account_not_empty",
            ErrorKind::CurrencyMismatch => "currency_mismatch",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::ArithmeticOverflow => "arithmetic_overflow",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::LockTimeout => "lock_timeout",
            ErrorKind::PersistenceFailure => "persistence_failure",
            ErrorKind::InvalidPeriod => "invalid_period",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LedgerError {
    /// Status an operation ending in this error reports
    pub fn status(&self) -> OperationStatus {
        match self {
            LedgerError::PersistenceFailure { .. } | LedgerError::CompensationFailed { .. } => {
                OperationStatus::RolledBack
            }
            _ => OperationStatus::Rejected,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            LedgerError::UnknownCurrency { .. } => ErrorKind::UnknownCurrency,
            LedgerError::SameAccount { .. } => ErrorKind::SameAccount,
            LedgerError::AccountNotFound { .. } => ErrorKind::AccountNotFound,
            LedgerError::AccountClosed { .. } => ErrorKind::AccountClosed,
            LedgerError::AccountNotEmpty { .. } => ErrorKind::AccountNotEmpty,
            LedgerError::CurrencyMismatch { .. } => ErrorKind::CurrencyMismatch,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::ArithmeticOverflow { .. } => ErrorKind::ArithmeticOverflow,
            LedgerError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            LedgerError::LockTimeout { .. } => ErrorKind::LockTimeout,
            LedgerError::PersistenceFailure { .. } | LedgerError::CompensationFailed { .. } => {
                ErrorKind::PersistenceFailure
            }
            LedgerError::InvalidPeriod { .. } => ErrorKind::InvalidPeriod,
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal, reason: &str) -> Self {
        LedgerError::InvalidAmount {
            amount,
            reason: reason.to_string(),
        }
    }

    /// Create an UnknownCurrency error
    pub fn unknown_currency(code: &str) -> Self {
        LedgerError::UnknownCurrency {
            code: code.to_string(),
        }
    }

    /// Create a SameAccount error
    pub fn same_account(account: AccountId) -> Self {
        LedgerError::SameAccount { account }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account: AccountId) -> Self {
        LedgerError::AccountNotFound { account }
    }

    /// Create an AccountClosed error
    pub fn account_closed(account: AccountId) -> Self {
        LedgerError::AccountClosed { account }
    }

    /// Create an AccountNotEmpty error
    pub fn account_not_empty(account: AccountId, balance: Decimal) -> Self {
        LedgerError::AccountNotEmpty { account, balance }
    }

    /// Create a CurrencyMismatch error
    pub fn currency_mismatch(account: AccountId, expected: Currency, actual: Currency) -> Self {
        LedgerError::CurrencyMismatch {
            account,
            expected,
            actual,
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: AccountId, available: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            account,
            available,
            requested,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    /// Create a PermissionDenied error
    pub fn permission_denied(account: AccountId, requester: OwnerId) -> Self {
        LedgerError::PermissionDenied { account, requester }
    }

    /// Create a LockTimeout error
    pub fn lock_timeout(account: AccountId) -> Self {
        LedgerError::LockTimeout { account }
    }

    /// Create a PersistenceFailure error
    pub fn persistence(operation: &str, source: RepositoryError) -> Self {
        LedgerError::PersistenceFailure {
            operation: operation.to_string(),
            source,
        }
    }

    /// Create a CompensationFailed error
    pub fn compensation_failed(cause: LedgerError, compensation: RepositoryError) -> Self {
        LedgerError::CompensationFailed {
            cause: Box::new(cause),
            compensation,
        }
    }
}
