//! Account-related types for the ledger
//!
//! This module defines the Account structure and the rules that decide whether a
//! balance change can be applied to it.

use super::currency::Currency;
use super::error::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account identifier
pub type AccountId = u32;

/// Identifier of the user that owns an account
pub type OwnerId = u32;

/// Account product type
///
/// Only credit accounts may carry a negative balance, bounded by their credit limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    #[default]
    Checking,
    Savings,
    Credit,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Checking => "checking",
            AccountKind::Savings => "savings",
            AccountKind::Credit => "credit",
        }
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "checking" => Ok(AccountKind::Checking),
            "savings" => Ok(AccountKind::Savings),
            "credit" => Ok(AccountKind::Credit),
            other => Err(format!("Invalid account kind: '{}'", other)),
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of an account
///
/// Accounts are never deleted. A closed account is immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account state
///
/// `balance` is only ever changed by ledger operations, which hold the account's
/// lock while they do so.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,

    /// The user this account belongs to
    pub owner: OwnerId,

    /// Currency every operation on this account must use
    pub currency: Currency,

    pub kind: AccountKind,

    /// Current balance, fixed-point
    pub balance: Decimal,

    /// How far below zero a credit account may go (always zero for other kinds)
    pub credit_limit: Decimal,

    pub status: AccountStatus,
}

impl Account {
    /// Create an active account with a zero balance
    pub fn new(id: AccountId, owner: OwnerId, currency: Currency, kind: AccountKind) -> Self {
        Account {
            id,
            owner,
            currency,
            kind,
            balance: Decimal::ZERO,
            credit_limit: Decimal::ZERO,
            status: AccountStatus::Active,
        }
    }

    /// Set the credit limit
    ///
    /// The limit is stored as a magnitude and ignored for non-credit accounts.
    pub fn with_credit_limit(mut self, limit: Decimal) -> Self {
        if self.kind == AccountKind::Credit {
            self.credit_limit = limit.abs();
        }
        self
    }

    /// Lowest balance this account may reach
    pub fn floor(&self) -> Decimal {
        match self.kind {
            AccountKind::Credit => -self.credit_limit,
            AccountKind::Checking | AccountKind::Savings => Decimal::ZERO,
        }
    }

    /// Funds that can still be debited before hitting the floor
    pub fn available(&self) -> Decimal {
        self.balance.saturating_sub(self.floor())
    }

    pub fn is_closed(&self) -> bool {
        self.status == AccountStatus::Closed
    }

    /// Compute the balance that applying `delta` would produce
    ///
    /// Nothing is mutated. Fails if the account is closed, if the result would
    /// overflow, or if it would fall below the account's floor.
    pub fn projected_balance(&self, delta: Decimal) -> Result<Decimal, LedgerError> {
        if self.is_closed() {
            return Err(LedgerError::account_closed(self.id));
        }

        let new_balance = self
            .balance
            .checked_add(delta)
            .ok_or_else(|| LedgerError::arithmetic_overflow("adjust_balance", self.id))?;

        if new_balance < self.floor() {
            return Err(LedgerError::insufficient_funds(
                self.id,
                self.available(),
                delta.abs(),
            ));
        }

        Ok(new_balance)
    }
}
