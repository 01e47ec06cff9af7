//! Thread-safe in-memory account storage
//!
//! This module provides the `InMemoryAccountRepository` struct, which stores account
//! records in a concurrent map so worker threads can read and write different
//! accounts without contending on a global lock.
//!
//! # Design
//!
//! Records live in a `DashMap` keyed by account id. DashMap shards its buckets, so
//! writes to different accounts rarely touch the same shard lock. The repository
//! does not serialize read-modify-write sequences itself; callers hold the
//! per-account lock from `LockManager` for that.

use crate::core::traits::AccountRepository;
use crate::types::{Account, AccountId, AccountStatus, RepositoryError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;

/// Concurrent account store backed by `DashMap`
///
/// # Thread Safety
///
/// All methods are safe to call from multiple threads concurrently. Each call
/// observes or replaces a whole record, so no caller ever sees a half-written account.
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    /// Account records by id
    accounts: DashMap<AccountId, Account>,
}

impl InMemoryAccountRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Register a new account
    ///
    /// # Arguments
    ///
    /// * `account` - The account to store, with its opening balance
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the account was stored
    /// * `Err(RepositoryError::WriteRejected)` if the id is already taken
    pub fn open(&self, account: Account) -> Result<(), RepositoryError> {
        match self.accounts.entry(account.id) {
            Entry::Occupied(_) => Err(RepositoryError::WriteRejected(format!(
                "account {} already exists",
                account.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(account);
                Ok(())
            }
        }
    }

    /// Number of stored accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AccountRepository for InMemoryAccountRepository {
    fn get(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        Ok(self.accounts.get(&id).map(|entry| entry.value().clone()))
    }

    fn set_balance(&self, id: AccountId, balance: Decimal) -> Result<(), RepositoryError> {
        let mut entry = self
            .accounts
            .get_mut(&id)
            .ok_or(RepositoryError::UnknownAccount(id))?;
        entry.balance = balance;
        Ok(())
    }

    fn set_status(&self, id: AccountId, status: AccountStatus) -> Result<(), RepositoryError> {
        let mut entry = self
            .accounts
            .get_mut(&id)
            .ok_or(RepositoryError::UnknownAccount(id))?;
        entry.status = status;
        Ok(())
    }

    fn list(&self) -> Result<Vec<Account>, RepositoryError> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by_key(|account| account.id);
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountKind, Currency};
    use std::sync::Arc;
    use std::thread;

    fn account(id: AccountId) -> Account {
        Account::new(id, 100 + id, Currency::USD, AccountKind::Checking)
    }

    #[test]
    fn test_open_and_get() {
        let repo = InMemoryAccountRepository::new();
        repo.open(account(1)).unwrap();

        let stored = repo.get(1).unwrap().unwrap();
        assert_eq!(stored.owner, 101);
        assert_eq!(repo.get(2).unwrap(), None);
    }

    #[test]
    fn test_open_rejects_duplicate_id() {
        let repo = InMemoryAccountRepository::new();
        repo.open(account(1)).unwrap();

        let result = repo.open(account(1));
        assert!(matches!(result, Err(RepositoryError::WriteRejected(_))));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_set_balance_and_status() {
        let repo = InMemoryAccountRepository::new();
        repo.open(account(3)).unwrap();

        repo.set_balance(3, Decimal::new(4250, 2)).unwrap();
        repo.set_status(3, AccountStatus::Closed).unwrap();

        let stored = repo.get(3).unwrap().unwrap();
        assert_eq!(stored.balance, Decimal::new(4250, 2));
        assert_eq!(stored.status, AccountStatus::Closed);
    }

    #[test]
    fn test_writes_to_missing_account_fail() {
        let repo = InMemoryAccountRepository::new();
        assert_eq!(
            repo.set_balance(9, Decimal::ONE),
            Err(RepositoryError::UnknownAccount(9))
        );
        assert_eq!(
            repo.set_status(9, AccountStatus::Closed),
            Err(RepositoryError::UnknownAccount(9))
        );
    }

    #[test]
    fn test_list_is_sorted_by_id() {
        let repo = InMemoryAccountRepository::new();
        for id in [5, 1, 3] {
            repo.open(account(id)).unwrap();
        }

        let ids: Vec<AccountId> = repo.list().unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn test_concurrent_writes_to_different_accounts() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        for id in 0..10 {
            repo.open(account(id)).unwrap();
        }

        let mut handles = vec![];
        for id in 0..10u32 {
            let repo = Arc::clone(&repo);
            handles.push(thread::spawn(move || {
                repo.set_balance(id, Decimal::from(id)).unwrap();
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        for id in 0..10u32 {
            assert_eq!(repo.get(id).unwrap().unwrap().balance, Decimal::from(id));
        }
    }
}
