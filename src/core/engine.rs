//! Ledger operation orchestration
//!
//! This module provides the `LedgerEngine` struct, which runs deposits,
//! withdrawals and transfers against an `AccountStore` and an `AuditLog` while
//! holding the right account locks.
//!
//! # Architecture
//!
//! ```text
//! LedgerEngine
//!     ├── AccountStore   (balances, via Arc<dyn AccountRepository>)
//!     ├── AuditLog       (journal, via Arc<dyn TransactionRepository>)
//!     ├── LockManager    (one mutex per account)
//!     ├── Arc<dyn CurrencyRegistry>
//!     └── Arc<dyn Clock>
//! ```
//!
//! # Operation Flow
//!
//! 1. Stateless validation (amount, currency, distinct accounts); no lock taken
//! 2. Lock the touched accounts (ascending id order for transfers)
//! 3. Read accounts and check every precondition before writing anything
//! 4. Apply balance changes, then append audit records
//! 5. If a write fails after a balance changed, restore the captured balances
//!
//! Balances and audit records are either both written or both absent once an
//! operation returns, unless the restore itself fails, which is reported as
//! `CompensationFailed`.
//!
//! # Thread Safety
//!
//! `LedgerEngine` is `Send + Sync`. Share it behind an `Arc`; operations on
//! disjoint accounts run in parallel.

use super::account_store::AccountStore;
use super::audit_log::AuditLog;
use super::clock::{Clock, SystemClock};
use super::locks::{LockManager, LockScope};
use super::traits::{AccountRepository, CurrencyRegistry, TransactionRepository};
use super::validation::{validate_amount, validate_currency, validate_distinct_accounts};
use crate::types::{
    Account, AccountId, Currency, HistoryQuery, LedgerError, NewTransaction, Operation,
    OperationStatus, Receipt, Transaction, TransactionKind,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, instrument, warn};

/// An account's stored balance next to the total its audit records imply
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub account: AccountId,
    pub balance: Decimal,
    pub journal_total: Decimal,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        self.balance == self.journal_total
    }

    /// Stored balance minus journal total
    pub fn discrepancy(&self) -> Decimal {
        self.balance.saturating_sub(self.journal_total)
    }
}

/// Orchestrates ledger operations
pub struct LedgerEngine {
    accounts: AccountStore,
    audit: AuditLog,
    locks: LockManager,
    currencies: Arc<dyn CurrencyRegistry>,
    clock: Arc<dyn Clock>,

    /// How long an operation may wait for account locks; `None` waits indefinitely
    lock_timeout: Option<Duration>,
}

impl LedgerEngine {
    /// Create an engine using the system clock and no lock timeout
    ///
    /// # Arguments
    ///
    /// * `accounts` - Account storage
    /// * `transactions` - Audit journal storage
    /// * `currencies` - Currencies operations may use
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        transactions: Arc<dyn TransactionRepository>,
        currencies: Arc<dyn CurrencyRegistry>,
    ) -> Self {
        Self {
            accounts: AccountStore::new(accounts),
            audit: AuditLog::new(transactions),
            locks: LockManager::new(),
            currencies,
            clock: Arc::new(SystemClock),
            lock_timeout: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout
    }

    /// Deadline for an operation starting now, from the configured lock timeout
    pub fn default_deadline(&self) -> Option<Instant> {
        self.lock_timeout
            .and_then(|timeout| Instant::now().checked_add(timeout))
    }

    /// Credit `amount` of `currency` to an account
    pub fn deposit(
        &self,
        account: AccountId,
        amount: Decimal,
        currency: &str,
    ) -> Result<Receipt, LedgerError> {
        self.execute(
            &Operation::deposit(account, amount, currency),
            self.default_deadline(),
        )
    }

    /// Debit `amount` from an account, in the account's currency
    pub fn withdraw(&self, account: AccountId, amount: Decimal) -> Result<Receipt, LedgerError> {
        self.execute(
            &Operation::withdrawal(account, amount),
            self.default_deadline(),
        )
    }

    /// Move `amount` of `currency` from one account to another
    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        currency: &str,
    ) -> Result<Receipt, LedgerError> {
        self.execute(
            &Operation::transfer(from, to, amount, currency),
            self.default_deadline(),
        )
    }

    /// Run one operation to completion
    ///
    /// # Arguments
    ///
    /// * `operation` - The deposit, withdrawal or transfer to apply
    /// * `deadline` - Latest instant to wait for account locks
    ///
    /// # Returns
    ///
    /// * `Ok(Receipt)` - Balances changed and audit records were written
    /// * `Err(LedgerError)` - Nothing changed; see [`LedgerError::status`] for
    ///   whether a rollback was involved
    #[instrument(level = "debug", skip_all, fields(operation = operation.name()))]
    pub fn execute(
        &self,
        operation: &Operation,
        deadline: Option<Instant>,
    ) -> Result<Receipt, LedgerError> {
        let result = match operation {
            Operation::Deposit {
                account,
                amount,
                currency,
                description,
            } => self.apply_deposit(*account, *amount, currency, description.as_deref(), deadline),
            Operation::Withdrawal {
                account,
                amount,
                description,
            } => self.apply_withdrawal(*account, *amount, description.as_deref(), deadline),
            Operation::Transfer {
                from,
                to,
                amount,
                currency,
                description,
            } => self.apply_transfer(
                *from,
                *to,
                *amount,
                currency,
                description.as_deref(),
                deadline,
            ),
        };

        match &result {
            Ok(receipt) => debug!(transaction = receipt.primary().id, "operation completed"),
            Err(error) if error.status() == OperationStatus::RolledBack => {
                warn!(%error, "operation rolled back")
            }
            Err(error) => debug!(%error, "operation rejected"),
        }

        result
    }

    /// Current snapshot of one account
    pub fn account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.accounts.get_account(id)
    }

    /// Every account, ordered by id
    pub fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.accounts.list()
    }

    /// Audit records for an account, newest first
    pub fn history(
        &self,
        id: AccountId,
        query: &HistoryQuery,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.accounts.get_account(id)?;
        self.audit.query_by_account(id, query)
    }

    /// Every audit record for an account within one calendar month (UTC), newest first
    pub fn monthly_statement(
        &self,
        id: AccountId,
        year: i32,
        month: u32,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let (from, to) =
            month_bounds(year, month).ok_or(LedgerError::InvalidPeriod { year, month })?;
        self.history(id, &HistoryQuery::all().between(from, to))
    }

    /// Close a zero-balance account
    pub fn close_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        let closed = self
            .locks
            .with_account_lock(id, self.default_deadline(), |scope| {
                self.accounts.close(scope, id)
            })?;
        debug!(account = id, "account closed");
        Ok(closed)
    }

    /// Compare an account's balance with the replay of its audit records
    ///
    /// Runs under the account lock so no operation is half-applied while reading.
    pub fn reconcile(&self, id: AccountId) -> Result<Reconciliation, LedgerError> {
        let reconciliation = self
            .locks
            .with_account_lock(id, self.default_deadline(), |_scope| {
                let account = self.accounts.get_account(id)?;
                let journal_total = self.audit.replay_balance(id)?;
                Ok(Reconciliation {
                    account: id,
                    balance: account.balance,
                    journal_total,
                })
            })?;

        if !reconciliation.is_consistent() {
            warn!(
                account = id,
                balance = %reconciliation.balance,
                journal_total = %reconciliation.journal_total,
                "account balance disagrees with audit log"
            );
        }
        Ok(reconciliation)
    }

    fn apply_deposit(
        &self,
        account: AccountId,
        amount: Decimal,
        currency: &str,
        description: Option<&str>,
        deadline: Option<Instant>,
    ) -> Result<Receipt, LedgerError> {
        validate_amount(amount)?;
        let currency = validate_currency(self.currencies.as_ref(), currency)?;

        self.locks.with_account_lock(account, deadline, |scope| {
            let before = self.accounts.get_account(account)?.balance;
            let balance = self.accounts.adjust_balance(scope, account, amount, currency)?;

            let record = NewTransaction {
                account,
                counterparty: None,
                kind: TransactionKind::Deposit,
                amount,
                currency,
                timestamp: self.clock.now(),
                description: description.unwrap_or("Deposit").to_string(),
                resulting_balance: balance,
            };

            self.audit
                .append(scope, record)
                .map(Receipt::Deposit)
                .map_err(|cause| self.compensate(scope, &[(account, before)], cause))
        })
    }

    fn apply_withdrawal(
        &self,
        account: AccountId,
        amount: Decimal,
        description: Option<&str>,
        deadline: Option<Instant>,
    ) -> Result<Receipt, LedgerError> {
        validate_amount(amount)?;

        self.locks.with_account_lock(account, deadline, |scope| {
            let snapshot = self.accounts.get_account(account)?;
            let balance =
                self.accounts
                    .adjust_balance(scope, account, -amount, snapshot.currency)?;

            let record = NewTransaction {
                account,
                counterparty: None,
                kind: TransactionKind::Withdrawal,
                amount,
                currency: snapshot.currency,
                timestamp: self.clock.now(),
                description: description.unwrap_or("Withdrawal").to_string(),
                resulting_balance: balance,
            };

            self.audit
                .append(scope, record)
                .map(Receipt::Withdrawal)
                .map_err(|cause| self.compensate(scope, &[(account, snapshot.balance)], cause))
        })
    }

    fn apply_transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        currency: &str,
        description: Option<&str>,
        deadline: Option<Instant>,
    ) -> Result<Receipt, LedgerError> {
        validate_amount(amount)?;
        let currency = validate_currency(self.currencies.as_ref(), currency)?;
        validate_distinct_accounts(from, to)?;

        self.locks.with_accounts_locked(from, to, deadline, |scope| {
            let source = self.accounts.get_account(from)?;
            let destination = self.accounts.get_account(to)?;
            ensure_currency(&source, currency)?;
            ensure_currency(&destination, currency)?;

            // Both sides must be able to take the change before either is written.
            source.projected_balance(-amount)?;
            destination.projected_balance(amount)?;

            let source_balance = self.accounts.adjust_balance(scope, from, -amount, currency)?;
            let destination_balance =
                match self.accounts.adjust_balance(scope, to, amount, currency) {
                    Ok(balance) => balance,
                    Err(cause) => {
                        return Err(self.compensate(scope, &[(from, source.balance)], cause))
                    }
                };

            let timestamp = self.clock.now();
            let text = description.unwrap_or("Transfer");
            let outgoing = NewTransaction {
                account: from,
                counterparty: Some(to),
                kind: TransactionKind::TransferOut,
                amount,
                currency,
                timestamp,
                description: format!("{text} to {to}"),
                resulting_balance: source_balance,
            };
            let incoming = NewTransaction {
                account: to,
                counterparty: Some(from),
                kind: TransactionKind::TransferIn,
                amount,
                currency,
                timestamp,
                description: format!("{text} from {from}"),
                resulting_balance: destination_balance,
            };

            match self.audit.append_linked(scope, outgoing, incoming) {
                Ok((outgoing, incoming)) => Ok(Receipt::Transfer { outgoing, incoming }),
                Err(cause) => Err(self.compensate(
                    scope,
                    &[(from, source.balance), (to, destination.balance)],
                    cause,
                )),
            }
        })
    }

    /// Restore captured balances, most recent change first
    ///
    /// Returns `cause` when every restore succeeds, `CompensationFailed` otherwise.
    fn compensate(
        &self,
        scope: &LockScope,
        applied: &[(AccountId, Decimal)],
        cause: LedgerError,
    ) -> LedgerError {
        for &(account, balance) in applied.iter().rev() {
            if let Err(compensation) = self.accounts.restore_balance(scope, account, balance) {
                error!(
                    account,
                    %cause,
                    %compensation,
                    "failed to restore balance; account needs reconciliation"
                );
                return LedgerError::compensation_failed(cause, compensation);
            }
        }

        warn!(%cause, accounts = ?scope.held(), "balance changes reverted");
        cause
    }
}

fn ensure_currency(account: &Account, currency: Currency) -> Result<(), LedgerError> {
    if account.currency != currency {
        return Err(LedgerError::currency_mismatch(
            account.id,
            account.currency,
            currency,
        ));
    }
    Ok(())
}

/// First and last representable instant of a calendar month
fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };

    let from = start.and_hms_opt(0, 0, 0)?.and_utc();
    let to = next.and_hms_opt(0, 0, 0)?.and_utc() - chrono::Duration::nanoseconds(1);
    Some((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::core::memory::{InMemoryAccountRepository, InMemoryTransactionRepository};
    use crate::core::validation::StaticCurrencyRegistry;
    use crate::types::{AccountKind, AccountStatus, ErrorKind, Outcome, RepositoryError};
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use rstest::rstest;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::thread;

    /// Account repository that can be told to refuse writes
    #[derive(Default)]
    struct FlakyAccounts {
        inner: InMemoryAccountRepository,
        failing: Mutex<HashSet<AccountId>>,
        write_budget: Mutex<Option<usize>>,
    }

    impl AccountRepository for FlakyAccounts {
        fn get(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
            self.inner.get(id)
        }

        fn set_balance(&self, id: AccountId, balance: Decimal) -> Result<(), RepositoryError> {
            if self.failing.lock().contains(&id) {
                return Err(RepositoryError::WriteRejected(format!("account {id}")));
            }
            if let Some(remaining) = self.write_budget.lock().as_mut() {
                if *remaining == 0 {
                    return Err(RepositoryError::Unavailable("write budget spent".to_string()));
                }
                *remaining -= 1;
            }
            self.inner.set_balance(id, balance)
        }

        fn set_status(&self, id: AccountId, status: AccountStatus) -> Result<(), RepositoryError> {
            self.inner.set_status(id, status)
        }

        fn list(&self) -> Result<Vec<Account>, RepositoryError> {
            self.inner.list()
        }
    }

    /// Journal that can be told to refuse appends
    #[derive(Default)]
    struct FlakyJournal {
        inner: InMemoryTransactionRepository,
        offline: AtomicBool,
    }

    impl TransactionRepository for FlakyJournal {
        fn append_all(
            &self,
            records: Vec<NewTransaction>,
        ) -> Result<Vec<Transaction>, RepositoryError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(RepositoryError::Unavailable("journal offline".to_string()));
            }
            self.inner.append_all(records)
        }

        fn query(
            &self,
            account: AccountId,
            query: &HistoryQuery,
        ) -> Result<Vec<Transaction>, RepositoryError> {
            self.inner.query(account, query)
        }
    }

    struct Harness {
        engine: LedgerEngine,
        accounts: Arc<FlakyAccounts>,
        journal: Arc<FlakyJournal>,
    }

    impl Harness {
        fn new(accounts: Vec<Account>) -> Self {
            let repo = Arc::new(FlakyAccounts::default());
            for account in accounts {
                repo.inner.open(account).unwrap();
            }
            let journal = Arc::new(FlakyJournal::default());
            let engine = LedgerEngine::new(
                repo.clone(),
                journal.clone(),
                Arc::new(StaticCurrencyRegistry::default()),
            );
            Self {
                engine,
                accounts: repo,
                journal,
            }
        }

        fn balance(&self, id: AccountId) -> Decimal {
            self.engine.account(id).unwrap().balance
        }

        fn records(&self) -> usize {
            self.journal.inner.len()
        }
    }

    fn usd(id: AccountId) -> Account {
        Account::new(id, id + 100, Currency::USD, AccountKind::Checking)
    }

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    /// Two USD accounts and one EUR account, with 1 funded to 100.00
    fn funded_harness() -> Harness {
        let harness = Harness::new(vec![
            usd(1),
            usd(2),
            Account::new(3, 103, Currency::EUR, AccountKind::Checking),
        ]);
        harness.engine.deposit(1, money(10000), "USD").unwrap();
        harness
    }

    #[test]
    fn test_deposit_credits_and_records() {
        let harness = Harness::new(vec![usd(1)]);

        let receipt = harness.engine.deposit(1, money(10000), "usd").unwrap();

        assert_eq!(harness.balance(1), money(10000));
        let Receipt::Deposit(tx) = receipt else {
            panic!("expected deposit receipt");
        };
        assert_eq!(tx.kind, TransactionKind::Deposit);
        assert_eq!(tx.amount, money(10000));
        assert_eq!(tx.currency, Currency::USD);
        assert_eq!(tx.description, "Deposit");
        assert_eq!(tx.resulting_balance, money(10000));
        assert_eq!(tx.counterparty, None);
    }

    #[rstest]
    #[case::zero_amount(Operation::deposit(1, Decimal::ZERO, "USD"), ErrorKind::InvalidAmount)]
    #[case::negative_amount(Operation::deposit(1, money(-500), "USD"), ErrorKind::InvalidAmount)]
    #[case::sub_cent(Operation::deposit(1, Decimal::new(1001, 3), "USD"), ErrorKind::InvalidAmount)]
    #[case::unknown_currency(Operation::deposit(1, money(500), "XYZ"), ErrorKind::UnknownCurrency)]
    #[case::wrong_currency(Operation::deposit(1, money(500), "EUR"), ErrorKind::CurrencyMismatch)]
    #[case::missing_account(Operation::deposit(42, money(500), "USD"), ErrorKind::AccountNotFound)]
    #[case::overdraw(Operation::withdrawal(1, money(15000)), ErrorKind::InsufficientFunds)]
    #[case::withdraw_missing(Operation::withdrawal(42, money(100)), ErrorKind::AccountNotFound)]
    #[case::same_account(Operation::transfer(1, 1, money(100), "USD"), ErrorKind::SameAccount)]
    #[case::transfer_overdraw(Operation::transfer(1, 2, money(10001), "USD"), ErrorKind::InsufficientFunds)]
    #[case::transfer_cross_currency(Operation::transfer(1, 3, money(100), "USD"), ErrorKind::CurrencyMismatch)]
    #[case::transfer_missing_destination(Operation::transfer(1, 42, money(100), "USD"), ErrorKind::AccountNotFound)]
    #[case::transfer_bad_amount(Operation::transfer(1, 2, Decimal::ZERO, "USD"), ErrorKind::InvalidAmount)]
    fn test_rejected_operations_change_nothing(
        #[case] operation: Operation,
        #[case] expected: ErrorKind,
    ) {
        let harness = funded_harness();

        let error = harness.engine.execute(&operation, None).unwrap_err();

        assert_eq!(error.kind(), expected);
        assert_eq!(error.status(), OperationStatus::Rejected);
        assert_eq!(harness.balance(1), money(10000));
        assert_eq!(harness.balance(2), Decimal::ZERO);
        assert_eq!(harness.balance(3), Decimal::ZERO);
        assert_eq!(harness.records(), 1);
    }

    #[test]
    fn test_withdrawal_uses_account_currency() {
        let harness = Harness::new(vec![Account::new(7, 1, Currency::GBP, AccountKind::Savings)]);
        harness.engine.deposit(7, money(5000), "GBP").unwrap();

        let receipt = harness.engine.withdraw(7, money(1250)).unwrap();

        assert_eq!(harness.balance(7), money(3750));
        assert_eq!(receipt.primary().currency, Currency::GBP);
        assert_eq!(receipt.primary().kind, TransactionKind::Withdrawal);
        assert_eq!(receipt.primary().description, "Withdrawal");
    }

    #[test]
    fn test_withdrawal_of_exact_balance_leaves_zero() {
        let harness = funded_harness();
        harness.engine.withdraw(1, money(10000)).unwrap();
        assert_eq!(harness.balance(1), Decimal::ZERO);
    }

    #[test]
    fn test_credit_account_may_go_negative_within_limit() {
        let credit =
            Account::new(5, 1, Currency::USD, AccountKind::Credit).with_credit_limit(money(50000));
        let harness = Harness::new(vec![credit]);

        harness.engine.withdraw(5, money(30000)).unwrap();
        assert_eq!(harness.balance(5), money(-30000));

        let error = harness.engine.withdraw(5, money(20001)).unwrap_err();
        assert_eq!(
            error,
            LedgerError::insufficient_funds(5, money(20000), money(20001))
        );
        assert_eq!(harness.balance(5), money(-30000));
    }

    #[test]
    fn test_transfer_moves_funds_and_links_records() {
        let harness = funded_harness();

        let receipt = harness.engine.transfer(1, 2, money(4000), "USD").unwrap();

        assert_eq!(harness.balance(1), money(6000));
        assert_eq!(harness.balance(2), money(4000));

        let Receipt::Transfer { outgoing, incoming } = receipt else {
            panic!("expected transfer receipt");
        };
        assert_eq!(outgoing.kind, TransactionKind::TransferOut);
        assert_eq!(outgoing.counterparty, Some(2));
        assert_eq!(outgoing.description, "Transfer to 2");
        assert_eq!(outgoing.resulting_balance, money(6000));
        assert_eq!(incoming.kind, TransactionKind::TransferIn);
        assert_eq!(incoming.counterparty, Some(1));
        assert_eq!(incoming.description, "Transfer from 1");
        assert_eq!(incoming.resulting_balance, money(4000));
        assert_eq!(incoming.id, outgoing.id + 1);
        assert_eq!(outgoing.timestamp, incoming.timestamp);
    }

    #[test]
    fn test_transfer_custom_description() {
        let harness = funded_harness();
        let op = Operation::transfer(1, 2, money(100), "USD").with_description("Rent");

        let receipt = harness.engine.execute(&op, None).unwrap();

        let texts: Vec<_> = receipt
            .transactions()
            .iter()
            .map(|tx| tx.description.clone())
            .collect();
        assert_eq!(texts, vec!["Rent to 2", "Rent from 1"]);
    }

    #[test]
    fn test_transfer_to_closed_account_is_rejected() {
        let harness = funded_harness();
        harness.engine.close_account(2).unwrap();

        let error = harness.engine.transfer(1, 2, money(100), "USD").unwrap_err();

        assert_eq!(error, LedgerError::account_closed(2));
        assert_eq!(harness.balance(1), money(10000));
    }

    #[test]
    fn test_audit_failure_rolls_back_deposit() {
        let harness = Harness::new(vec![usd(1)]);
        harness.journal.offline.store(true, Ordering::SeqCst);

        let error = harness.engine.deposit(1, money(2500), "USD").unwrap_err();

        assert_eq!(error.kind(), ErrorKind::PersistenceFailure);
        assert_eq!(error.status(), OperationStatus::RolledBack);
        assert_eq!(harness.balance(1), Decimal::ZERO);
        assert_eq!(harness.records(), 0);
    }

    #[test]
    fn test_audit_failure_rolls_back_both_transfer_sides() {
        let harness = funded_harness();
        harness.journal.offline.store(true, Ordering::SeqCst);

        let error = harness.engine.transfer(1, 2, money(3000), "USD").unwrap_err();

        assert_eq!(error.status(), OperationStatus::RolledBack);
        assert_eq!(harness.balance(1), money(10000));
        assert_eq!(harness.balance(2), Decimal::ZERO);
        assert_eq!(harness.records(), 1);
    }

    #[test]
    fn test_credit_failure_restores_debited_source() {
        let harness = funded_harness();
        harness.accounts.failing.lock().insert(2);

        let error = harness.engine.transfer(1, 2, money(3000), "USD").unwrap_err();

        assert!(matches!(
            error,
            LedgerError::PersistenceFailure { ref operation, .. } if operation == "adjust_balance"
        ));
        assert_eq!(error.status(), OperationStatus::RolledBack);
        assert_eq!(harness.balance(1), money(10000));
        assert_eq!(harness.balance(2), Decimal::ZERO);
        assert_eq!(harness.records(), 1);
    }

    #[test]
    fn test_failed_restore_reports_compensation_failure() {
        let harness = Harness::new(vec![usd(1)]);
        harness.journal.offline.store(true, Ordering::SeqCst);
        *harness.accounts.write_budget.lock() = Some(1);

        let error = harness.engine.deposit(1, money(2500), "USD").unwrap_err();

        assert!(matches!(error, LedgerError::CompensationFailed { .. }));
        assert_eq!(error.kind(), ErrorKind::PersistenceFailure);
        assert_eq!(error.status(), OperationStatus::RolledBack);

        let outcome = Outcome::from(Err::<Receipt, _>(error));
        assert_eq!(outcome.error_kind, Some(ErrorKind::PersistenceFailure));

        // The stuck balance is visible to reconciliation.
        let report = harness.engine.reconcile(1).unwrap();
        assert!(!report.is_consistent());
        assert_eq!(report.discrepancy(), money(2500));
    }

    #[test]
    fn test_lock_timeout_leaves_state_untouched() {
        let harness = Arc::new(funded_harness());
        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let harness = Arc::clone(&harness);
            thread::spawn(move || {
                harness
                    .engine
                    .locks
                    .with_account_lock(2, None, |_| {
                        held_tx.send(()).unwrap();
                        release_rx.recv().unwrap();
                        Ok(())
                    })
                    .unwrap();
            })
        };
        held_rx.recv().unwrap();

        let deadline = Instant::now() + Duration::from_millis(25);
        let error = harness
            .engine
            .execute(&Operation::transfer(1, 2, money(100), "USD"), Some(deadline))
            .unwrap_err();

        assert_eq!(error, LedgerError::lock_timeout(2));
        assert_eq!(harness.balance(1), money(10000));
        assert!(!harness.engine.locks.is_locked(1));

        release_tx.send(()).unwrap();
        holder.join().unwrap();
    }

    #[test]
    fn test_history_and_monthly_statement() {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
        ));
        let harness = Harness::new(vec![usd(1)]);
        let engine = harness.engine.with_clock(clock.clone());

        engine.deposit(1, money(10000), "USD").unwrap();
        clock.set(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        engine.withdraw(1, money(1000)).unwrap();
        clock.set(Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap());
        engine.deposit(1, money(500), "USD").unwrap();
        clock.set(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        engine.withdraw(1, money(200)).unwrap();

        let february = engine.monthly_statement(1, 2024, 2).unwrap();
        let ids: Vec<_> = february.iter().map(|tx| tx.id).collect();
        assert_eq!(ids, vec![3, 2]);

        let december = engine.monthly_statement(1, 2023, 12).unwrap();
        assert!(december.is_empty());

        let withdrawals = engine
            .history(1, &HistoryQuery::default().of_kind(TransactionKind::Withdrawal))
            .unwrap();
        assert_eq!(withdrawals.len(), 2);
        assert_eq!(withdrawals[0].id, 4);

        assert_eq!(
            engine.monthly_statement(1, 2024, 13),
            Err(LedgerError::InvalidPeriod {
                year: 2024,
                month: 13
            })
        );
        assert_eq!(
            engine.history(9, &HistoryQuery::default()),
            Err(LedgerError::account_not_found(9))
        );
    }

    #[test]
    fn test_close_account_blocks_further_operations() {
        let harness = funded_harness();

        assert_eq!(
            harness.engine.close_account(1),
            Err(LedgerError::account_not_empty(1, money(10000)))
        );

        harness.engine.withdraw(1, money(10000)).unwrap();
        let closed = harness.engine.close_account(1).unwrap();
        assert_eq!(closed.status, AccountStatus::Closed);

        assert_eq!(
            harness.engine.deposit(1, money(100), "USD"),
            Err(LedgerError::account_closed(1))
        );
    }

    #[test]
    fn test_reconcile_matches_after_operations() {
        let harness = funded_harness();
        harness.engine.transfer(1, 2, money(2500), "USD").unwrap();
        harness.engine.withdraw(2, money(500)).unwrap();

        for id in [1, 2, 3] {
            let report = harness.engine.reconcile(id).unwrap();
            assert!(report.is_consistent(), "account {id}: {report:?}");
        }
        assert_eq!(harness.engine.reconcile(2).unwrap().balance, money(2000));
    }

    #[test]
    fn test_month_bounds_cover_whole_month() {
        let (from, to) = month_bounds(2023, 12).unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap());
        assert!(to < Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(to > Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap());
        assert!(month_bounds(2024, 0).is_none());
    }
}
