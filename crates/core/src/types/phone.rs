//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains something other than digits and separators.
    #[error("phone number may only contain digits, spaces, dashes and a leading +")]
    InvalidCharacter,
    /// Too few or too many digits.
    #[error("phone number must have between {min} and {max} digits")]
    Length {
        /// Minimum digit count.
        min: usize,
        /// Maximum digit count.
        max: usize,
    },
}

/// A phone number, normalized to digits with an optional leading `+`.
///
/// Customers are identified and verified (OTP) by phone, so the console
/// normalizes input before it reaches the backend.
///
/// ## Examples
///
/// ```
/// use shopcrm_core::Phone;
///
/// assert_eq!(Phone::parse("081-234-5678").unwrap().as_str(), "0812345678");
/// assert_eq!(Phone::parse("+66 81 234 5678").unwrap().as_str(), "+66812345678");
/// assert!(Phone::parse("").is_err());
/// assert!(Phone::parse("call me").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Minimum number of digits.
    pub const MIN_DIGITS: usize = 9;
    /// Maximum number of digits (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains letters or symbols
    /// other than separators, or has a digit count outside 9..=15.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let (plus, rest) = trimmed
            .strip_prefix('+')
            .map_or((false, trimmed), |rest| (true, rest));

        let mut digits = String::with_capacity(rest.len() + 1);
        if plus {
            digits.push('+');
        }
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '(' | ')' => {}
                _ => return Err(PhoneError::InvalidCharacter),
            }
        }

        let count = digits.len() - usize::from(plus);
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&count) {
            return Err(PhoneError::Length {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(digits))
    }

    /// Returns the normalized number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The number with all but the last four digits masked, for logs.
    #[must_use]
    pub fn masked(&self) -> String {
        let visible = self.0.len().saturating_sub(4);
        self.0
            .char_indices()
            .map(|(i, c)| if i < visible && c != '+' { '*' } else { c })
            .collect()
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_separators() {
        let phone = Phone::parse(" (02) 123-4567 ").unwrap();
        assert_eq!(phone.as_str(), "021234567");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Phone::parse("   "), Err(PhoneError::Empty));
        assert_eq!(Phone::parse("08x1234567"), Err(PhoneError::InvalidCharacter));
        assert!(matches!(Phone::parse("12345"), Err(PhoneError::Length { .. })));
        assert!(matches!(
            Phone::parse("+1234567890123456"),
            Err(PhoneError::Length { .. })
        ));
    }

    #[test]
    fn test_masked_keeps_last_four() {
        let phone = Phone::parse("0812345678").unwrap();
        assert_eq!(phone.masked(), "******5678");
    }

    #[test]
    fn test_deserialize_validates() {
        let phone: Phone = serde_json::from_str("\"081 234 5678\"").unwrap();
        assert_eq!(phone.as_str(), "0812345678");
        assert!(serde_json::from_str::<Phone>("\"nope\"").is_err());
    }
}
