//! Currency codes
//!
//! A [`Currency`] is a well-formed three-letter code. Whether the code is one the
//! ledger actually accepts is decided by a `CurrencyRegistry`, not by this type.

use super::error::LedgerError;
use std::fmt;
use std::str::FromStr;

/// Three ASCII letters, stored upper-cased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Currency([u8; 3]);

impl Currency {
    pub const USD: Currency = Currency(*b"USD");
    pub const EUR: Currency = Currency(*b"EUR");
    pub const GBP: Currency = Currency(*b"GBP");
    pub const JPY: Currency = Currency(*b"JPY");
    pub const CHF: Currency = Currency(*b"CHF");

    /// The code as a string slice (always three upper-case letters)
    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl FromStr for Currency {
    type Err = LedgerError;

    /// Parse a currency code, case-insensitively
    ///
    /// Fails with `UnknownCurrency` unless the trimmed input is exactly three ASCII letters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(LedgerError::unknown_currency(s));
        }

        let mut code = [0u8; 3];
        for (slot, byte) in code.iter_mut().zip(bytes) {
            *slot = byte.to_ascii_uppercase();
        }
        Ok(Currency(code))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
