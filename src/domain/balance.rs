use crate::error::GateError;
use serde::Serialize;
use std::fmt;

/// Key of the account tracked before balances were addressed per account.
pub const DEFAULT_ACCOUNT: &str = "account1/balance";

/// Store key naming one account's balance entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AccountKey(String);

impl AccountKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AccountKey {
    fn default() -> Self {
        Self::new(DEFAULT_ACCOUNT)
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Credit remaining for an account.
///
/// Signed on purpose: concurrent unconditional charges can drive the stored
/// value below zero and the gate must still be able to report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct Balance(i64);

impl Balance {
    pub const ZERO: Self = Self(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Reads a stored balance from its leading integer, defaulting to 0.
    ///
    /// The store keeps balances as text. Leading whitespace and an optional
    /// sign are accepted, then digits are read up to the first non-digit, so
    /// "12abc" reads as 12 and "7.9" as 7. A missing key, an empty value or
    /// text without leading digits all mean "no credit" rather than an error.
    /// Magnitudes beyond `i64` saturate.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        let Some(text) = raw else {
            return Self::ZERO;
        };
        let text = text.trim_start();
        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };

        let digit_count = unsigned.bytes().take_while(u8::is_ascii_digit).count();
        if digit_count == 0 {
            return Self::ZERO;
        }

        let magnitude = unsigned[..digit_count].bytes().fold(0i64, |acc, digit| {
            acc.saturating_mul(10)
                .saturating_add(i64::from(digit - b'0'))
        });
        Self(if negative { -magnitude } else { magnitude })
    }

    /// Returns true when this balance is enough to pay `charge`.
    pub fn covers(&self, charge: Charge) -> bool {
        self.0 >= charge.value()
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed amount deducted per authorized request. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Charge(i64);

impl Charge {
    pub fn new(value: i64) -> Result<Self, GateError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(GateError::Config(format!(
                "charge must be positive, got {value}"
            )))
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Outcome of a single charge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeResult {
    /// Balance after the call; unchanged when the request was rejected.
    pub remaining_balance: Balance,
    pub is_authorized: bool,
    /// Amount actually deducted, 0 when not authorized.
    pub charges: i64,
}

impl ChargeResult {
    pub fn authorized(remaining_balance: Balance, charge: Charge) -> Self {
        Self {
            remaining_balance,
            is_authorized: true,
            charges: charge.value(),
        }
    }

    pub fn rejected(remaining_balance: Balance) -> Self {
        Self {
            remaining_balance,
            is_authorized: false,
            charges: 0,
        }
    }
}
