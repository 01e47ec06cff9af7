//! CSV format handling for ledger input and output
//!
//! This module centralizes all CSV format concerns, providing:
//! - Record structures for the accounts and operations input files
//! - Conversion from CSV records to domain types
//! - Account and journal output serialization
//!
//! All functions are pure (no file I/O) for easy testing.
//!
//! # Formats
//!
//! Accounts input: `account,owner,currency,kind,credit_limit`
//!
//! Operations input: `type,account,counterparty,amount,currency,requester,description`
//!
//! Accounts output: `account,owner,currency,kind,balance,status`
//!
//! Journal output: `id,account,counterparty,kind,amount,currency,resulting_balance,timestamp,description`

use crate::types::{
    Account, AccountId, AccountKind, Currency, LedgerRequest, Operation, OwnerId, Transaction,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Row of the operations file
///
/// Every column but `type` and `account` is optional; which ones are required
/// depends on the operation type.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OperationCsvRecord {
    #[serde(rename = "type")]
    pub op_type: String,
    pub account: AccountId,
    #[serde(default)]
    pub counterparty: Option<AccountId>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub requester: Option<OwnerId>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Row of the accounts file
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AccountCsvRecord {
    pub account: AccountId,
    pub owner: OwnerId,
    pub currency: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub credit_limit: Option<String>,
}

/// Convert an operations row into a request
///
/// Only the shape of the row is checked here. Amount sign, scale and currency
/// membership are left to the engine so they surface as ledger rejections.
///
/// # Returns
///
/// * `Ok(LedgerRequest)` - Well-formed row
/// * `Err(String)` - Unknown type, missing column, or unparseable amount
pub fn convert_operation_record(record: OperationCsvRecord) -> Result<LedgerRequest, String> {
    let op_type = record.op_type.trim().to_lowercase();
    let amount = parse_amount(&op_type, &record)?;
    let description = non_empty(record.description);

    let operation = match op_type.as_str() {
        "deposit" => Operation::Deposit {
            account: record.account,
            amount,
            currency: required(record.currency, "currency", &op_type, record.account)?,
            description,
        },
        "withdrawal" | "withdraw" => Operation::Withdrawal {
            account: record.account,
            amount,
            description,
        },
        "transfer" => Operation::Transfer {
            from: record.account,
            to: record.counterparty.ok_or_else(|| {
                format!(
                    "transfer from account {} requires a counterparty",
                    record.account
                )
            })?,
            amount,
            currency: required(record.currency, "currency", &op_type, record.account)?,
            description,
        },
        _ => {
            return Err(format!(
                "Invalid operation type: '{}' for account {}",
                record.op_type, record.account
            ))
        }
    };

    Ok(LedgerRequest {
        operation,
        requester: record.requester,
    })
}

fn parse_amount(op_type: &str, record: &OperationCsvRecord) -> Result<Decimal, String> {
    match record.amount.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Decimal::from_str(text).map_err(|_| {
            format!(
                "Invalid amount '{}' for {} on account {}",
                text, op_type, record.account
            )
        }),
        _ => Err(format!(
            "{} for account {} requires an amount",
            op_type, record.account
        )),
    }
}

fn required(
    value: Option<String>,
    column: &str,
    op_type: &str,
    account: AccountId,
) -> Result<String, String> {
    non_empty(value).ok_or_else(|| format!("{} for account {} requires a {}", op_type, account, column))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Convert an accounts row into a new, empty account
///
/// `kind` defaults to checking. `credit_limit` is only accepted on credit accounts.
pub fn convert_account_record(record: AccountCsvRecord) -> Result<Account, String> {
    let currency = Currency::from_str(&record.currency)
        .map_err(|e| format!("account {}: {}", record.account, e))?;

    let kind = match non_empty(record.kind) {
        Some(text) => AccountKind::from_str(&text)
            .map_err(|e| format!("account {}: {}", record.account, e))?,
        None => AccountKind::default(),
    };

    let account = Account::new(record.account, record.owner, currency, kind);

    match non_empty(record.credit_limit) {
        None => Ok(account),
        Some(text) => {
            if kind != AccountKind::Credit {
                return Err(format!(
                    "account {}: credit_limit only applies to credit accounts",
                    record.account
                ));
            }
            let limit = Decimal::from_str(&text).map_err(|_| {
                format!("account {}: invalid credit_limit '{}'", record.account, text)
            })?;
            if limit.is_sign_negative() {
                return Err(format!(
                    "account {}: credit_limit must not be negative",
                    record.account
                ));
            }
            Ok(account.with_credit_limit(limit))
        }
    }
}

/// Two-decimal rendering that never prints a negative zero
fn money(value: Decimal) -> String {
    if value.is_zero() {
        format!("{:.2}", Decimal::ZERO)
    } else {
        format!("{:.2}", value)
    }
}

/// Write account states to CSV format
///
/// Accounts are sorted by id for deterministic output.
///
/// # Arguments
///
/// * `accounts` - Slice of account states to write
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "owner", "currency", "kind", "balance", "status"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by_key(|account| account.id);

    for account in sorted_accounts {
        writer
            .write_record(&[
                account.id.to_string(),
                account.owner.to_string(),
                account.currency.to_string(),
                account.kind.to_string(),
                money(account.balance),
                account.status.to_string(),
            ])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write audit records to CSV format, in the order given
pub fn write_transactions_csv(
    transactions: &[Transaction],
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "id",
            "account",
            "counterparty",
            "kind",
            "amount",
            "currency",
            "resulting_balance",
            "timestamp",
            "description",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for tx in transactions {
        writer
            .write_record(&[
                tx.id.to_string(),
                tx.account.to_string(),
                tx.counterparty.map(|c| c.to_string()).unwrap_or_default(),
                tx.kind.to_string(),
                money(tx.amount),
                tx.currency.to_string(),
                money(tx.resulting_balance),
                tx.timestamp.to_rfc3339(),
                tx.description.clone(),
            ])
            .map_err(|e| format!("Failed to write transaction record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
