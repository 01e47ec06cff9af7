//! In-memory storage implementations
//!
//! Thread-safe implementations of the repository traits, used by the CLI and by
//! tests:
//!
//! - **InMemoryAccountRepository**: Account records in a `DashMap`
//! - **InMemoryTransactionRepository**: Append-only journal behind a `parking_lot::RwLock`
//!
//! Nothing here persists across process restarts.

pub mod account_repository;
pub mod transaction_repository;

pub use account_repository::InMemoryAccountRepository;
pub use transaction_repository::InMemoryTransactionRepository;
