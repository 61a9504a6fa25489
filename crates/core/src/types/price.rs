//! Type-safe price representation using decimal arithmetic.
//!
//! The backend stores prices as floating-point columns and sends them as JSON
//! numbers. They are held here as [`Decimal`] so that totals and display
//! formatting never suffer binary rounding, and converted back to a JSON
//! number when sent.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors that can occur when parsing a [`Price`] from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    /// The input is empty or whitespace.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
    /// The input is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// Shown in place of an amount the backend did not send.
pub const MISSING_AMOUNT: &str = "-";

/// Display an amount that may be absent.
#[must_use]
pub fn display_amount(price: Option<Price>) -> String {
    price.map_or_else(|| MISSING_AMOUNT.to_owned(), |price| price.to_string())
}

/// A price in euros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Create a new price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Parse a price typed by a user.
    ///
    /// Surrounding whitespace is ignored. Negative amounts are rejected.
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if the input is blank, not a decimal number, or
    /// negative.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }

        let amount =
            Decimal::from_str(trimmed).map_err(|_| PriceError::Invalid(trimmed.to_owned()))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }

        Ok(Self(amount))
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Render the amount the way it is typed into a form: no trailing zeros,
    /// no currency symbol (`19.9`, `20`).
    #[must_use]
    pub fn to_plain_string(&self) -> String {
        self.0.normalize().to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} €", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self
            .0
            .to_f64()
            .ok_or_else(|| serde::ser::Error::custom(format!("price out of range: {}", self.0)))?;
        serializer.serialize_f64(value)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
        Ok(Price(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
        Ok(Price(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
        // f64's Display is the shortest round-trip form, so 19.99 stays 19.99
        Decimal::from_str(&v.to_string())
            .map(Price)
            .map_err(|_| E::invalid_value(de::Unexpected::Float(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
        Decimal::from_str(v.trim())
            .map(Price)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_float_keeps_decimal_digits() {
        let price: Price = serde_json::from_str("19.99").unwrap();
        assert_eq!(price.amount(), Decimal::new(1999, 2));
    }

    #[test]
    fn test_deserialize_integer_and_string() {
        let price: Price = serde_json::from_str("20").unwrap();
        assert_eq!(price.amount(), Decimal::from(20));

        let price: Price = serde_json::from_str("\"4.50\"").unwrap();
        assert_eq!(price.amount(), Decimal::new(450, 2));
    }

    #[test]
    fn test_serialize_as_number() {
        let price = Price::from_cents(1250);
        assert_eq!(serde_json::to_string(&price).unwrap(), "12.5");
    }

    #[test]
    fn test_display_uses_two_decimals() {
        assert_eq!(Price::from_cents(500).to_string(), "5.00 €");
        assert_eq!(Price::new(Decimal::new(1999, 2)).to_string(), "19.99 €");
    }

    #[test]
    fn test_missing_amount_display() {
        assert_eq!(display_amount(None), MISSING_AMOUNT);
        assert_eq!(display_amount(Some(Price::from_cents(995))), "9.95 €");
    }

    #[test]
    fn test_plain_string_drops_trailing_zeros() {
        assert_eq!(Price::from_cents(1990).to_plain_string(), "19.9");
        assert_eq!(Price::from_cents(2000).to_plain_string(), "20");
    }

    #[test]
    fn test_parse_user_input() {
        assert_eq!(Price::parse(" 12.30 ").unwrap(), Price::from_cents(1230));
        assert_eq!(Price::parse(""), Err(PriceError::Empty));
        assert_eq!(Price::parse("   "), Err(PriceError::Empty));
        assert!(matches!(Price::parse("abc"), Err(PriceError::Invalid(_))));
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
    }
}
