//! Stateless checks applied before any account is locked
//!
//! Nothing in here reads or writes ledger state except through the arguments it
//! is handed.

use super::traits::CurrencyRegistry;
use crate::types::{Account, AccountId, Currency, LedgerError, OwnerId};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Maximum number of decimal places a monetary amount may carry
pub const MONEY_SCALE: u32 = 2;

/// Require a strictly positive amount with at most two decimal places
///
/// Trailing zeros do not count toward the scale, so `10.500` is accepted.
pub fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid_amount(
            amount,
            "amount must be greater than zero",
        ));
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(LedgerError::invalid_amount(
            amount,
            "amount has more than 2 decimal places",
        ));
    }
    Ok(())
}

/// Parse a currency code and require the registry to recognize it
pub fn validate_currency(
    registry: &dyn CurrencyRegistry,
    code: &str,
) -> Result<Currency, LedgerError> {
    let currency: Currency = code.parse()?;
    if !registry.is_recognized(&currency) {
        return Err(LedgerError::unknown_currency(code));
    }
    Ok(currency)
}

pub fn validate_distinct_accounts(from: AccountId, to: AccountId) -> Result<(), LedgerError> {
    if from == to {
        return Err(LedgerError::same_account(from));
    }
    Ok(())
}

pub fn validate_ownership(account: &Account, requester: OwnerId) -> Result<(), LedgerError> {
    if account.owner != requester {
        return Err(LedgerError::permission_denied(account.id, requester));
    }
    Ok(())
}

/// Fixed set of accepted currencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCurrencyRegistry {
    codes: BTreeSet<Currency>,
}

impl StaticCurrencyRegistry {
    pub fn new(codes: impl IntoIterator<Item = Currency>) -> Self {
        Self {
            codes: codes.into_iter().collect(),
        }
    }

    /// Build a registry from textual codes, failing on the first malformed one
    pub fn from_codes<S: AsRef<str>>(
        codes: impl IntoIterator<Item = S>,
    ) -> Result<Self, LedgerError> {
        let codes = codes
            .into_iter()
            .map(|code| code.as_ref().parse::<Currency>())
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { codes })
    }

    /// Accepted codes in alphabetical order
    pub fn codes(&self) -> Vec<Currency> {
        self.codes.iter().copied().collect()
    }
}

impl Default for StaticCurrencyRegistry {
    /// USD, EUR, GBP, JPY and CHF
    fn default() -> Self {
        Self::new([
            Currency::USD,
            Currency::EUR,
            Currency::GBP,
            Currency::JPY,
            Currency::CHF,
        ])
    }
}

impl CurrencyRegistry for StaticCurrencyRegistry {
    fn is_recognized(&self, currency: &Currency) -> bool {
        self.codes.contains(currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountKind;
    use rstest::rstest;

    #[rstest]
    #[case::whole(Decimal::new(100, 0))]
    #[case::cents(Decimal::new(1050, 2))]
    #[case::smallest(Decimal::new(1, 2))]
    #[case::trailing_zeros(Decimal::new(10500, 3))]
    fn test_validate_amount_accepts(#[case] amount: Decimal) {
        assert!(validate_amount(amount).is_ok());
    }

    #[rstest]
    #[case::zero(Decimal::ZERO)]
    #[case::negative(Decimal::new(-100, 2))]
    #[case::sub_cent(Decimal::new(1001, 3))]
    fn test_validate_amount_rejects(#[case] amount: Decimal) {
        assert!(matches!(
            validate_amount(amount),
            Err(LedgerError::InvalidAmount { .. })
        ));
    }

    #[rstest]
    #[case("usd", Currency::USD)]
    #[case("CHF", Currency::CHF)]
    fn test_validate_currency_known(#[case] code: &str, #[case] expected: Currency) {
        let registry = StaticCurrencyRegistry::default();
        assert_eq!(validate_currency(&registry, code).unwrap(), expected);
    }

    #[rstest]
    #[case::not_registered("XYZ")]
    #[case::malformed("dollars")]
    fn test_validate_currency_unknown(#[case] code: &str) {
        let registry = StaticCurrencyRegistry::default();
        assert_eq!(
            validate_currency(&registry, code),
            Err(LedgerError::unknown_currency(code))
        );
    }

    #[test]
    fn test_validate_distinct_accounts() {
        assert!(validate_distinct_accounts(1, 2).is_ok());
        assert_eq!(
            validate_distinct_accounts(3, 3),
            Err(LedgerError::same_account(3))
        );
    }

    #[test]
    fn test_validate_ownership() {
        let account = Account::new(4, 11, Currency::USD, AccountKind::Checking);
        assert!(validate_ownership(&account, 11).is_ok());
        assert_eq!(
            validate_ownership(&account, 12),
            Err(LedgerError::permission_denied(4, 12))
        );
    }

    #[test]
    fn test_registry_from_codes() {
        let registry = StaticCurrencyRegistry::from_codes(["sek", "NOK"]).unwrap();
        assert_eq!(registry.codes().len(), 2);
        assert!(registry.is_recognized(&"SEK".parse().unwrap()));
        assert!(!registry.is_recognized(&Currency::USD));

        assert!(StaticCurrencyRegistry::from_codes(["SEK", "kronor"]).is_err());
    }
}
