//! Append-only audit trail on top of a `TransactionRepository`
//!
//! Records are written while the affected accounts are still locked, which keeps
//! the journal order for an account identical to the order its balance changed.
//! Replaying an account's records from zero therefore reproduces its balance.

use super::locks::LockScope;
use super::traits::TransactionRepository;
use crate::types::{
    AccountId, HistoryQuery, LedgerError, NewTransaction, RepositoryError, Transaction,
};
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuditLog {
    repository: Arc<dyn TransactionRepository>,
}

impl AuditLog {
    pub fn new(repository: Arc<dyn TransactionRepository>) -> Self {
        Self { repository }
    }

    /// Append one record
    pub fn append(
        &self,
        scope: &LockScope,
        record: NewTransaction,
    ) -> Result<Transaction, LedgerError> {
        debug_assert!(scope.covers(record.account));

        let mut appended = self
            .repository
            .append_all(vec![record])
            .map_err(|source| LedgerError::persistence("append", source))?;

        match (appended.pop(), appended.is_empty()) {
            (Some(transaction), true) => Ok(transaction),
            _ => Err(short_write("append")),
        }
    }

    /// Append both halves of a transfer as one unit
    ///
    /// Returns `(outgoing, incoming)` with consecutive ids. If the repository
    /// fails, neither record exists.
    pub fn append_linked(
        &self,
        scope: &LockScope,
        outgoing: NewTransaction,
        incoming: NewTransaction,
    ) -> Result<(Transaction, Transaction), LedgerError> {
        debug_assert!(scope.covers(outgoing.account) && scope.covers(incoming.account));

        let appended = self
            .repository
            .append_all(vec![outgoing, incoming])
            .map_err(|source| LedgerError::persistence("append_linked", source))?;

        let mut records = appended.into_iter();
        match (records.next(), records.next(), records.next()) {
            (Some(outgoing), Some(incoming), None) => Ok((outgoing, incoming)),
            _ => Err(short_write("append_linked")),
        }
    }

    /// Records for one account, newest first
    pub fn query_by_account(
        &self,
        account: AccountId,
        query: &HistoryQuery,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.repository
            .query(account, query)
            .map_err(|source| LedgerError::persistence("query_history", source))
    }

    /// Sum of every signed amount recorded for the account
    ///
    /// Equals the account's balance minus its opening balance whenever no
    /// operation on it is in flight.
    pub fn replay_balance(&self, account: AccountId) -> Result<Decimal, LedgerError> {
        self.query_by_account(account, &HistoryQuery::all())?
            .iter()
            .try_fold(Decimal::ZERO, |total, transaction| {
                total
                    .checked_add(transaction.signed_amount())
                    .ok_or_else(|| LedgerError::arithmetic_overflow("replay_balance", account))
            })
    }
}

/// A repository that returned the wrong record count broke the `append_all`
/// contract. The caller compensates as for any persistence failure, so a
/// repository that stored records anyway leaves them without a balance change.
/// `reconcile` reports that drift.
fn short_write(operation: &str) -> LedgerError {
    LedgerError::persistence(
        operation,
        RepositoryError::WriteRejected("repository returned an unexpected record count".to_string()),
    )
}
