//! Decimal-safe money handling.
//!
//! Amounts cross the bridge as decimal strings (`"500.00"`) and are held as
//! integer minor units, never as floats.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::error::ValidationError;

/// Decimal places of a money amount.
pub const MONEY_SCALE: u32 = 2;
/// Decimal places of an exchange rate.
pub const RATE_SCALE: u32 = 4;

/// Why a decimal string was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecimalError {
    #[error("empty value")]
    Empty,
    #[error("not a plain decimal number")]
    Syntax,
    #[error("too many decimal places")]
    Precision,
    #[error("value out of range")]
    Overflow,
}

/// Parse a plain decimal string into an integer scaled by `10^scale`.
pub fn parse_scaled(input: &str, scale: u32) -> Result<i64, DecimalError> {
    if input.is_empty() {
        return Err(DecimalError::Empty);
    }
    let (negative, body) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    let (whole, fraction) = match body.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (body, None),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecimalError::Syntax);
    }
    let fraction = fraction.unwrap_or("");
    if body.contains('.') && fraction.is_empty() {
        return Err(DecimalError::Syntax);
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecimalError::Syntax);
    }
    if fraction.len() > scale as usize {
        return Err(DecimalError::Precision);
    }

    let factor = 10i64.pow(scale);
    let whole: i64 = whole.parse().map_err(|_| DecimalError::Overflow)?;
    let padded = format!("{:0<width$}", fraction, width = scale as usize);
    let fraction: i64 = if padded.is_empty() {
        0
    } else {
        padded.parse().map_err(|_| DecimalError::Syntax)?
    };
    let magnitude = whole
        .checked_mul(factor)
        .and_then(|v| v.checked_add(fraction))
        .ok_or(DecimalError::Overflow)?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn format_scaled(value: i64, scale: u32, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let factor = 10u64.pow(scale);
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = value.unsigned_abs();
    write!(
        f,
        "{}{}.{:0width$}",
        sign,
        magnitude / factor,
        magnitude % factor,
        width = scale as usize
    )
}

/// A money amount in minor units (kuruş, cents).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub fn minor(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Apply a commission or discount rate given in basis points.
    pub fn percent_bp(&self, basis_points: i64) -> Money {
        Money(self.0 * basis_points / 10_000)
    }
}

impl FromStr for Money {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scaled(s, MONEY_SCALE).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_scaled(self.0, MONEY_SCALE, f)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An exchange rate with four decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rate(i64);

impl Rate {
    pub const ONE: Rate = Rate(10_000);

    /// Build from an integer already scaled by `10^RATE_SCALE`.
    pub fn from_scaled(scaled: i64) -> Self {
        Self(scaled)
    }

    pub fn scaled(&self) -> i64 {
        self.0
    }

    /// Convert a foreign amount into the base currency, rounding half up.
    pub fn convert(&self, amount: Money) -> Money {
        let product = amount.minor() as i128 * self.0 as i128;
        let rounded = (product + 5_000 * product.signum()) / 10_000;
        Money(rounded as i64)
    }
}

impl FromStr for Rate {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scaled(s, RATE_SCALE).map(Rate)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_scaled(self.0, RATE_SCALE, f)
    }
}

/// Validate a strictly positive money amount entered by a user.
pub fn validate_amount(field: &str, value: &str) -> Result<Money, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidAmount {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };
    let amount: Money = value.parse().map_err(|e: DecimalError| invalid(&e.to_string()))?;
    if !amount.is_positive() {
        return Err(invalid("must be greater than zero"));
    }
    Ok(amount)
}

/// Validate a strictly positive exchange rate.
pub fn validate_rate(field: &str, value: &str) -> Result<Rate, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidAmount {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };
    let rate: Rate = value.parse().map_err(|e: DecimalError| invalid(&e.to_string()))?;
    if rate.0 <= 0 {
        return Err(invalid("must be greater than zero"));
    }
    Ok(rate)
}

/// Validate an ISO-4217 style currency code.
pub fn validate_currency(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.len() == 3 && value.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' is not a three-letter currency code", value),
        })
    }
}
