//! Core business logic module
//!
//! This module contains the ledger components:
//! - `traits` - Storage and currency abstractions
//! - `validation` - Stateless input checks and the static currency registry
//! - `locks` - Per-account mutual exclusion
//! - `account_store` - Balance reads and writes under a lock scope
//! - `audit_log` - Append-only transaction journal
//! - `engine` - Deposit, withdrawal and transfer orchestration
//! - `dispatch` - Ownership checks and outcome reporting for front ends
//! - `batch_processor` - Concurrent processing of account groups
//! - `memory` - In-memory repository implementations
//! - `clock` - Time sources

pub mod account_store;
pub mod audit_log;
pub mod batch_processor;
pub mod clock;
pub mod dispatch;
pub mod engine;
pub mod locks;
pub mod memory;
pub mod traits;
pub mod validation;

pub use account_store::AccountStore;
pub use audit_log::AuditLog;
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use clock::{Clock, FixedClock, SystemClock};
pub use dispatch::dispatch;
pub use engine::{LedgerEngine, Reconciliation};
pub use locks::{LockManager, LockScope};
pub use memory::{InMemoryAccountRepository, InMemoryTransactionRepository};
pub use traits::{AccountRepository, CurrencyRegistry, TransactionRepository};
pub use validation::StaticCurrencyRegistry;
