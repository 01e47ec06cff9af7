//! Per-account mutual exclusion
//!
//! The `LockManager` hands out one mutex per account id. Every read-modify-write
//! of an account balance runs inside [`LockManager::with_account_lock`] or
//! [`LockManager::with_accounts_locked`], which give the closure a [`LockScope`]
//! naming the accounts it may touch.
//!
//! # Deadlock freedom
//!
//! Two-account sections always lock the lower id first. Any set of concurrent
//! transfers therefore acquires locks in one global order and cannot form a cycle.
//!
//! # Release
//!
//! Guards live on the stack of the `with_*` call, so locks are released on every
//! exit path, including early returns and panics inside the closure.

use crate::types::{AccountId, LedgerError};
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

/// Proof that the listed accounts are locked by the current caller
///
/// Only the `LockManager` can create one, and callers only ever see it by
/// reference for the duration of the locked section.
#[derive(Debug)]
pub struct LockScope {
    held: Vec<AccountId>,
}

impl LockScope {
    /// Accounts held, in acquisition order
    pub fn held(&self) -> &[AccountId] {
        &self.held
    }

    pub fn covers(&self, account: AccountId) -> bool {
        self.held.contains(&account)
    }
}

/// Table of per-account mutexes
///
/// Mutexes are created on first use and kept for the life of the manager.
#[derive(Debug, Default)]
pub struct LockManager {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for one account
    ///
    /// # Arguments
    ///
    /// * `account` - Account to lock
    /// * `deadline` - Give up with `LockTimeout` if the lock is not free by then;
    ///   `None` waits indefinitely
    /// * `f` - Critical section
    ///
    /// # Returns
    ///
    /// Whatever `f` returns, or `LockTimeout` if `f` never ran.
    pub fn with_account_lock<T, F>(
        &self,
        account: AccountId,
        deadline: Option<Instant>,
        f: F,
    ) -> Result<T, LedgerError>
    where
        F: FnOnce(&LockScope) -> Result<T, LedgerError>,
    {
        let mutex = self.mutex_for(account);
        let _guard = acquire(&mutex, account, deadline)?;

        let scope = LockScope {
            held: vec![account],
        };
        f(&scope)
    }

    /// Run `f` while holding the locks for two distinct accounts
    ///
    /// Locks are taken in ascending id order regardless of argument order.
    /// Passing the same account twice fails with `SameAccount` before anything is
    /// locked. If the second lock times out, the first is released before returning.
    pub fn with_accounts_locked<T, F>(
        &self,
        a: AccountId,
        b: AccountId,
        deadline: Option<Instant>,
        f: F,
    ) -> Result<T, LedgerError>
    where
        F: FnOnce(&LockScope) -> Result<T, LedgerError>,
    {
        if a == b {
            return Err(LedgerError::same_account(a));
        }

        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first_mutex = self.mutex_for(first);
        let second_mutex = self.mutex_for(second);

        let _first_guard = acquire(&first_mutex, first, deadline)?;
        let _second_guard = acquire(&second_mutex, second, deadline)?;

        let scope = LockScope {
            held: vec![first, second],
        };
        f(&scope)
    }

    /// Whether some caller currently holds this account's lock
    pub fn is_locked(&self, account: AccountId) -> bool {
        self.locks
            .get(&account)
            .map(|mutex| mutex.is_locked())
            .unwrap_or(false)
    }

    fn mutex_for(&self, account: AccountId) -> Arc<Mutex<()>> {
        // Clone the Arc out so the map shard is not held while we block on the mutex.
        self.locks
            .entry(account)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn acquire(
    mutex: &Mutex<()>,
    account: AccountId,
    deadline: Option<Instant>,
) -> Result<MutexGuard<'_, ()>, LedgerError> {
    let guard = match deadline {
        None => mutex.lock(),
        Some(deadline) => mutex
            .try_lock_until(deadline)
            .ok_or_else(|| LedgerError::lock_timeout(account))?,
    };
    trace!(account, "account lock acquired");
    Ok(guard)
}
