//! Operation results as reported to callers

use super::error::{ErrorKind, LedgerError};
use super::transaction::Transaction;
use std::fmt;

/// Final state of a submitted operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationStatus {
    /// Balances changed and audit records were written
    Completed,

    /// Nothing changed
    Rejected,

    /// Something failed after a balance changed; the change was reverted
    RolledBack,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Completed => "completed",
            OperationStatus::Rejected => "rejected",
            OperationStatus::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit records written by a completed operation
#[derive(Debug, Clone, PartialEq)]
pub enum Receipt {
    Deposit(Transaction),
    Withdrawal(Transaction),
    Transfer {
        outgoing: Transaction,
        incoming: Transaction,
    },
}

impl Receipt {
    /// The record for the account the caller acted on (the source side of a transfer)
    pub fn primary(&self) -> &Transaction {
        match self {
            Receipt::Deposit(tx) | Receipt::Withdrawal(tx) => tx,
            Receipt::Transfer { outgoing, .. } => outgoing,
        }
    }

    pub fn transactions(&self) -> Vec<&Transaction> {
        match self {
            Receipt::Deposit(tx) | Receipt::Withdrawal(tx) => vec![tx],
            Receipt::Transfer { outgoing, incoming } => vec![outgoing, incoming],
        }
    }

    fn success_message(&self) -> &'static str {
        match self {
            Receipt::Deposit(_) => "Deposit successful",
            Receipt::Withdrawal(_) => "Withdrawal successful",
            Receipt::Transfer { .. } => "Transfer successful",
        }
    }
}

/// What a caller receives for a dispatched operation
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub status: OperationStatus,
    pub message: String,

    /// Present only when `status` is `Completed`
    pub receipt: Option<Receipt>,

    /// Present only when `status` is not `Completed`
    pub error_kind: Option<ErrorKind>,
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        self.status == OperationStatus::Completed
    }
}

impl From<Result<Receipt, LedgerError>> for Outcome {
    fn from(result: Result<Receipt, LedgerError>) -> Self {
        match result {
            Ok(receipt) => Outcome {
                status: OperationStatus::Completed,
                message: receipt.success_message().to_string(),
                receipt: Some(receipt),
                error_kind: None,
            },
            Err(error) => Outcome {
                status: error.status(),
                message: error.to_string(),
                receipt: None,
                error_kind: Some(error.kind()),
            },
        }
    }
}
