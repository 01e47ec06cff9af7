//! Transaction-related types for the bank ledger
//!
//! This module defines the immutable audit records the ledger writes for every
//! completed balance change, and the filter used to read them back.

use super::account::AccountId;
use super::currency::Currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transaction identifier
///
/// Assigned by the transaction repository, unique and increasing in append order.
pub type TransactionId = u64;

/// Default page size for history queries
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Kind of balance change a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// External funds credited to the account
    Deposit,

    /// Funds debited out of the ledger
    Withdrawal,

    /// Source half of a transfer
    TransferOut,

    /// Destination half of a transfer
    TransferIn,
}

impl TransactionKind {
    /// Whether this kind increases the balance
    pub fn is_credit(self) -> bool {
        matches!(self, TransactionKind::Deposit | TransactionKind::TransferIn)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::TransferOut => "transfer_out",
            TransactionKind::TransferIn => "transfer_in",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdrawal" => Ok(TransactionKind::Withdrawal),
            "transfer_out" => Ok(TransactionKind::TransferOut),
            "transfer_in" => Ok(TransactionKind::TransferIn),
            other => Err(format!("Invalid transaction kind: '{}'", other)),
        }
    }
}

/// A record waiting to be appended
///
/// Identical to [`Transaction`] except that no id has been assigned yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account: AccountId,
    pub counterparty: Option<AccountId>,
    pub kind: TransactionKind,

    /// Always positive; direction comes from `kind`
    pub amount: Decimal,
    pub currency: Currency,
    pub timestamp: DateTime<Utc>,
    pub description: String,

    /// Account balance right after this change was applied
    pub resulting_balance: Decimal,
}

impl NewTransaction {
    /// Attach the repository-assigned id
    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            account: self.account,
            counterparty: self.counterparty,
            kind: self.kind,
            amount: self.amount,
            currency: self.currency,
            timestamp: self.timestamp,
            description: self.description,
            resulting_balance: self.resulting_balance,
        }
    }
}

/// Immutable audit record of one balance change on one account
///
/// A transfer produces two of these, one per side, each naming the other side as
/// its counterparty.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub account: AccountId,
    pub counterparty: Option<AccountId>,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub currency: Currency,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub resulting_balance: Decimal,
}

impl Transaction {
    /// Amount with the sign of its effect on the balance
    pub fn signed_amount(&self) -> Decimal {
        if self.kind.is_credit() {
            self.amount
        } else {
            -self.amount
        }
    }
}

/// Filter and page for reading an account's history
///
/// Bounds are inclusive. `limit: None` returns every matching record.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub kind: Option<TransactionKind>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        HistoryQuery {
            from: None,
            to: None,
            kind: None,
            limit: Some(DEFAULT_HISTORY_LIMIT),
            offset: 0,
        }
    }
}

impl HistoryQuery {
    /// Every record, unpaged
    pub fn all() -> Self {
        HistoryQuery {
            limit: None,
            ..HistoryQuery::default()
        }
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn of_kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn page(mut self, limit: Option<usize>, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Whether a record passes the date and kind filters (paging is not applied)
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.from.is_none_or(|from| transaction.timestamp >= from)
            && self.to.is_none_or(|to| transaction.timestamp <= to)
            && self.kind.is_none_or(|kind| transaction.kind == kind)
    }
}
