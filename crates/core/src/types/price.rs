//! Type-safe money amounts using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in the shop's currency (package prices, cash rewards).
///
/// Serialized as the bare decimal so it matches the backend's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from minor units (e.g. satang, cents).
    #[must_use]
    pub fn from_minor(minor: i64) -> Self {
        Self(Decimal::new(minor, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_display_two_places() {
        assert_eq!(Price::from_minor(19_900).to_string(), "199.00");
        assert_eq!(Price::new(Decimal::new(5, 1)).to_string(), "0.50");
    }

    #[test]
    fn test_price_accepts_numbers_and_strings() {
        let from_number: Price = serde_json::from_str("1500").unwrap();
        let from_string: Price = serde_json::from_str("\"1500\"").unwrap();
        assert_eq!(from_number, from_string);
        assert!(!from_number.is_negative());
        assert!(Price::from_minor(-1).is_negative());
        assert!(!Price::ZERO.is_negative());
    }
}
