//! Balance reads and writes on top of an `AccountRepository`
//!
//! Every mutating method takes a [`LockScope`], so a balance can only change
//! inside a section that holds that account's lock.

use super::locks::LockScope;
use super::traits::AccountRepository;
use crate::types::{Account, AccountId, AccountStatus, Currency, LedgerError, RepositoryError};
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Clone)]
pub struct AccountStore {
    repository: Arc<dyn AccountRepository>,
}

impl AccountStore {
    pub fn new(repository: Arc<dyn AccountRepository>) -> Self {
        Self { repository }
    }

    /// Current account snapshot
    pub fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.repository
            .get(id)
            .map_err(|source| LedgerError::persistence("get_account", source))?
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    /// Apply a signed change to an account's balance
    ///
    /// # Arguments
    ///
    /// * `scope` - Must cover `id`
    /// * `id` - Account to change
    /// * `delta` - Positive to credit, negative to debit
    /// * `currency` - Currency the change is denominated in
    ///
    /// # Returns
    ///
    /// The new balance. Fails without writing if the account is missing or closed,
    /// holds another currency, would overflow, or would go below its floor.
    pub fn adjust_balance(
        &self,
        scope: &LockScope,
        id: AccountId,
        delta: Decimal,
        currency: Currency,
    ) -> Result<Decimal, LedgerError> {
        debug_assert!(scope.covers(id), "account {id} adjusted without its lock");

        let account = self.get_account(id)?;
        if account.currency != currency {
            return Err(LedgerError::currency_mismatch(id, account.currency, currency));
        }

        let new_balance = account.projected_balance(delta)?;
        self.repository
            .set_balance(id, new_balance)
            .map_err(|source| LedgerError::persistence("adjust_balance", source))?;

        Ok(new_balance)
    }

    /// Put back a balance captured before a failed operation
    pub fn restore_balance(
        &self,
        scope: &LockScope,
        id: AccountId,
        balance: Decimal,
    ) -> Result<(), RepositoryError> {
        debug_assert!(scope.covers(id), "account {id} restored without its lock");
        self.repository.set_balance(id, balance)
    }

    /// Mark a zero-balance account as closed
    pub fn close(&self, scope: &LockScope, id: AccountId) -> Result<Account, LedgerError> {
        debug_assert!(scope.covers(id), "account {id} closed without its lock");

        let mut account = self.get_account(id)?;
        if account.is_closed() {
            return Err(LedgerError::account_closed(id));
        }
        if !account.balance.is_zero() {
            return Err(LedgerError::account_not_empty(id, account.balance));
        }

        self.repository
            .set_status(id, AccountStatus::Closed)
            .map_err(|source| LedgerError::persistence("close_account", source))?;
        account.status = AccountStatus::Closed;
        Ok(account)
    }

    pub fn list(&self) -> Result<Vec<Account>, LedgerError> {
        self.repository
            .list()
            .map_err(|source| LedgerError::persistence("list_accounts", source))
    }
}
