//! Bank Ledger Library
//! # Overview
//!
//! This library provides a ledger engine that applies deposits, withdrawals and
//! transfers to accounts, recording every balance change in an append-only
//! journal. Each operation either changes balances together with its audit
//! records or leaves state untouched.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, Transaction, Operation, LedgerError, etc.)
//! - [`core`] - Business logic components:
//!   - [`core::validation`] - Amount, currency, account and ownership checks
//!   - [`core::locks`] - Per-account locks taken in ascending id order
//!   - [`core::account_store`] - Balance reads and writes under a held lock
//!   - [`core::audit_log`] - Append-only transaction journal
//!   - [`core::engine`] - Operation orchestration with compensation on failure
//!   - [`core::dispatch`] - Authorization and outcome reporting for front ends
//!   - [`core::batch_processor`] - Parallel processing of independent accounts
//! - [`io`] - CSV readers and writers
//! - [`strategy`] - Sync and async processing pipelines
//! - [`cli`] - CLI arguments parsing
//! - [`config`] - TOML configuration with environment overrides
//! - [`observability`] - `tracing` subscriber setup
//!
//! # Operations
//!
//! - **Deposit**: Credit external funds to an account
//! - **Withdrawal**: Debit funds, never taking the balance below the account's floor
//! - **Transfer**: Move funds between two accounts of the same currency
//!
//! # Account Floors
//!
//! Checking and savings accounts may not go below zero. Credit accounts may go
//! down to minus their credit limit.

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod observability;
pub mod strategy;
pub mod types;

pub use crate::core::{dispatch, LedgerEngine};
pub use io::write_accounts_csv;
pub use types::{
    Account, AccountId, Currency, LedgerError, LedgerRequest, Operation, OperationStatus,
    Outcome, Receipt, Transaction, TransactionId, TransactionKind,
};
