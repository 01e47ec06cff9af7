//! Core traits for account storage, transaction storage, and currency lookup
//!
//! The ledger engine only talks to storage through these traits, so in-memory
//! and persistent implementations can be used interchangeably.
//!
//! All traits require `Send + Sync`: a single engine is shared across worker
//! threads, and each collaborator must tolerate concurrent calls for different
//! accounts. Serializing calls for the *same* account is the engine's job.

use crate::types::{
    Account, AccountId, AccountStatus, Currency, HistoryQuery, NewTransaction, RepositoryError,
    Transaction,
};
use rust_decimal::Decimal;

/// Storage for account records
pub trait AccountRepository: Send + Sync {
    /// Fetch an account snapshot, `Ok(None)` if it does not exist
    fn get(&self, id: AccountId) -> Result<Option<Account>, RepositoryError>;

    /// Overwrite an account's balance
    fn set_balance(&self, id: AccountId, balance: Decimal) -> Result<(), RepositoryError>;

    /// Overwrite an account's lifecycle status
    fn set_status(&self, id: AccountId, status: AccountStatus) -> Result<(), RepositoryError>;

    /// Every account, ordered by id
    fn list(&self) -> Result<Vec<Account>, RepositoryError>;
}

/// Append-only storage for audit records
pub trait TransactionRepository: Send + Sync {
    /// Append records as one unit, assigning ids in order
    ///
    /// Either every record is stored and returned in input order, or none is
    /// stored and the call fails. Returning fewer or more records than were
    /// passed in breaks this contract.
    fn append_all(&self, records: Vec<NewTransaction>)
        -> Result<Vec<Transaction>, RepositoryError>;

    /// Records for one account that match `query`, newest first
    ///
    /// Ordering is by timestamp descending, then id descending. Paging is applied
    /// after filtering and sorting.
    fn query(
        &self,
        account: AccountId,
        query: &HistoryQuery,
    ) -> Result<Vec<Transaction>, RepositoryError>;
}

/// The set of currency codes the ledger accepts
pub trait CurrencyRegistry: Send + Sync {
    fn is_recognized(&self, currency: &Currency) -> bool;
}
