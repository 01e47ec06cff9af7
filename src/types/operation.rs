//! Ledger operations as submitted by callers
//!
//! An [`Operation`] is unvalidated input: amounts may be non-positive and
//! currency codes may be unknown. The engine validates before touching state.

use super::account::{AccountId, OwnerId};
use rust_decimal::Decimal;

/// One balance-changing request
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Credit external funds to an account
    Deposit {
        account: AccountId,
        amount: Decimal,
        currency: String,
        description: Option<String>,
    },

    /// Debit funds from an account, in the account's own currency
    Withdrawal {
        account: AccountId,
        amount: Decimal,
        description: Option<String>,
    },

    /// Move funds between two accounts of the same currency
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        currency: String,
        description: Option<String>,
    },
}

impl Operation {
    pub fn deposit(account: AccountId, amount: Decimal, currency: impl Into<String>) -> Self {
        Operation::Deposit {
            account,
            amount,
            currency: currency.into(),
            description: None,
        }
    }

    pub fn withdrawal(account: AccountId, amount: Decimal) -> Self {
        Operation::Withdrawal {
            account,
            amount,
            description: None,
        }
    }

    pub fn transfer(
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Operation::Transfer {
            from,
            to,
            amount,
            currency: currency.into(),
            description: None,
        }
    }

    /// Replace the default description recorded in the audit log
    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        let text = Some(text.into());
        match &mut self {
            Operation::Deposit { description, .. }
            | Operation::Withdrawal { description, .. }
            | Operation::Transfer { description, .. } => *description = text,
        }
        self
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Deposit { .. } => "deposit",
            Operation::Withdrawal { .. } => "withdrawal",
            Operation::Transfer { .. } => "transfer",
        }
    }

    /// The account whose owner must authorize this operation
    ///
    /// For a transfer this is the source account.
    pub fn source_account(&self) -> AccountId {
        match self {
            Operation::Deposit { account, .. } | Operation::Withdrawal { account, .. } => *account,
            Operation::Transfer { from, .. } => *from,
        }
    }

    /// Every account this operation touches
    pub fn accounts(&self) -> Vec<AccountId> {
        match self {
            Operation::Deposit { account, .. } | Operation::Withdrawal { account, .. } => {
                vec![*account]
            }
            Operation::Transfer { from, to, .. } => vec![*from, *to],
        }
    }

    pub fn amount(&self) -> Decimal {
        match self {
            Operation::Deposit { amount, .. }
            | Operation::Withdrawal { amount, .. }
            | Operation::Transfer { amount, .. } => *amount,
        }
    }
}

/// An operation plus who asked for it
///
/// When `requester` is set, the requester must own the operation's source account.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRequest {
    pub operation: Operation,
    pub requester: Option<OwnerId>,
}

impl LedgerRequest {
    /// A request with no ownership check
    pub fn unauthenticated(operation: Operation) -> Self {
        LedgerRequest {
            operation,
            requester: None,
        }
    }

    pub fn on_behalf_of(operation: Operation, requester: OwnerId) -> Self {
        LedgerRequest {
            operation,
            requester: Some(requester),
        }
    }
}
